//! Model picker list

use parley_config::ChatConfig;
use parley_core::{BackendResult, ChatBackend};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Models offered to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelList {
    /// Sorted, de-duplicated names
    pub names: Vec<String>,
    /// The server could not be queried and only fallbacks are listed
    pub from_fallback: bool,
}

impl ModelList {
    pub fn contains(&self, model: &str) -> bool {
        self.names.iter().any(|name| name == model)
    }
}

/// Combine discovered models with the fallbacks.
///
/// Excluded names are dropped and an Ollama `:latest` tag is folded into the
/// bare name. When discovery failed only the fallbacks are offered.
pub fn merge_model_list(
    discovered: BackendResult<Vec<String>>,
    fallback: &[String],
    excluded: &[String],
) -> ModelList {
    match discovered {
        Ok(names) => {
            let names: BTreeSet<String> = names
                .into_iter()
                .map(|name| name.strip_suffix(":latest").map(str::to_string).unwrap_or(name))
                .filter(|name| !name.is_empty() && !excluded.contains(name))
                .chain(fallback.iter().cloned())
                .collect();
            ModelList {
                names: names.into_iter().collect(),
                from_fallback: false,
            }
        }
        Err(e) => {
            warn!(error = %e, "Model list unavailable, using fallbacks");
            let names: BTreeSet<String> = fallback.iter().cloned().collect();
            ModelList {
                names: names.into_iter().collect(),
                from_fallback: true,
            }
        }
    }
}

/// Query the backend and merge with the configured fallbacks
pub async fn discover_models(backend: &dyn ChatBackend, config: &ChatConfig) -> ModelList {
    let discovered = backend.list_models().await;
    let list = merge_model_list(
        discovered,
        &config.fallback_models(),
        &config.excluded_models(),
    );
    debug!(
        backend = backend.name(),
        count = list.names.len(),
        from_fallback = list.from_fallback,
        "Model list ready"
    );
    list
}
