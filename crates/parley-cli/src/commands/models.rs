//! `parley models`

use anyhow::Result;
use parley_config::AppConfig;
use parley_llm::{create_backend, discover_models, ModelList};

pub async fn execute(config: AppConfig) -> Result<()> {
    let selected = create_backend(&config.chat).await;
    if let Some(notice) = &selected.notice {
        eprintln!("{}", notice);
    }

    let list = discover_models(selected.backend.as_ref(), &config.chat).await;
    print!("{}", format_model_list(&list, &config.chat.chat_model()));
    Ok(())
}

/// One model per line, the configured default marked with `*`
pub fn format_model_list(list: &ModelList, default_model: &str) -> String {
    let mut out = String::new();
    if list.from_fallback {
        out.push_str("(model server unavailable, showing fallback models)\n");
    }
    for name in &list.names {
        let marker = if name == default_model { '*' } else { ' ' };
        out.push_str(&format!("{} {}\n", marker, name));
    }
    out
}
