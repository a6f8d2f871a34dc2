//! `parley history`

use anyhow::{Context, Result};
use parley_config::AppConfig;
use parley_core::{HistoryStore, HistorySummary};

pub async fn execute(config: AppConfig) -> Result<()> {
    let store = HistoryStore::new(config.history.history_path());
    let document = store
        .load()
        .with_context(|| format!("Could not load chat history: {}", store.path().display()))?;

    match document {
        Some(document) => print!("{}", format_summary(&HistorySummary::from_document(&document))),
        None => println!("No chat history at {}", store.path().display()),
    }
    Ok(())
}

/// Text of the history summary, shared with the chat overlay
pub fn format_summary(summary: &HistorySummary) -> String {
    let mut out = format!("--- Current Active Model: {} ---\n\n", summary.model);
    if summary.total_turns == 0 {
        out.push_str("No user messages found in the current history.\n");
        return out;
    }

    match &summary.first_request {
        Some(request) => {
            out.push_str("Last Conversation Summary:\n");
            out.push_str(&format!("Model: {}\n", summary.model));
            out.push_str(&format!("First Request: \"{}\"\n", request));
            out.push_str(&format!("Total Turns: {}\n", summary.total_turns));
        }
        None => out.push_str("History only contains the system prompt.\n"),
    }
    out
}
