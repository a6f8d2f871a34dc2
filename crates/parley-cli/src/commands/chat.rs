//! `parley chat`, the default command

use crate::tui::{self, App, AppSettings};
use anyhow::Result;
use parley_config::AppConfig;
use parley_core::{create_stream_channel, Conversation, HistoryStore};
use parley_llm::{create_backend, discover_models};
use tracing::info;

pub async fn execute(config: AppConfig) -> Result<()> {
    let selected = create_backend(&config.chat).await;
    let models = discover_models(selected.backend.as_ref(), &config.chat).await;
    let settings = AppSettings::from_config(&config);

    let store = HistoryStore::new(config.history.history_path());
    let (conversation, restore) = Conversation::restore(
        store,
        &settings.default_model,
        config.ui.theme.as_str(),
        |model| settings.prompts.system_prompt_for(model),
    );
    info!(
        model = %conversation.model(),
        backend = ?selected.kind,
        history = %conversation.store().path().display(),
        "Starting chat"
    );

    let (events_tx, mut events_rx) = create_stream_channel();
    let mut app = App::new(conversation, selected.backend, events_tx, models, settings);
    app.startup(restore, selected.notice);

    tui::run(&mut app, &mut events_rx).await
}
