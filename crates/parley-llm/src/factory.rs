//! Backend selection

use crate::{MockBackend, OllamaBackend};
use parley_config::{BackendKind, ChatConfig};
use parley_core::ChatBackend;
use std::sync::Arc;
use tracing::{info, warn};

/// Backend chosen at startup
pub struct SelectedBackend {
    pub backend: Arc<dyn ChatBackend>,
    /// Resolved kind; never `Auto`
    pub kind: BackendKind,
    /// Message for the status bar when the choice was a fallback
    pub notice: Option<String>,
}

/// Build the configured backend.
///
/// `Auto` checks the Ollama endpoint and uses the mock when nothing answers.
pub async fn create_backend(config: &ChatConfig) -> SelectedBackend {
    match config.backend {
        BackendKind::Ollama => ollama(config),
        BackendKind::Mock => mock(None),
        BackendKind::Auto => {
            let candidate = OllamaBackend::from_config(config);
            if candidate.health_check().await {
                info!(endpoint = %candidate.base_url(), "Ollama server detected");
                SelectedBackend {
                    backend: Arc::new(candidate),
                    kind: BackendKind::Ollama,
                    notice: None,
                }
            } else {
                warn!(endpoint = %config.llm_endpoint(), "Ollama server unreachable, using mock backend");
                mock(Some(format!(
                    "Could not connect to the Ollama server at {}. Using the offline mock backend.",
                    config.llm_endpoint()
                )))
            }
        }
    }
}

fn ollama(config: &ChatConfig) -> SelectedBackend {
    SelectedBackend {
        backend: Arc::new(OllamaBackend::from_config(config)),
        kind: BackendKind::Ollama,
        notice: None,
    }
}

fn mock(notice: Option<String>) -> SelectedBackend {
    SelectedBackend {
        backend: Arc::new(MockBackend::new()),
        kind: BackendKind::Mock,
        notice,
    }
}
