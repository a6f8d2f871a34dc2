//! Per-model system prompts

use crate::defaults;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const MODEL_NAME_PLACEHOLDER: &str = "{model_name}";

/// Persona selection for the system message at position 0.
///
/// A model listed in `personas` uses that prompt verbatim; any other model
/// gets `default_template` with `{model_name}` substituted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PromptConfig {
    pub default_template: Option<String>,
    #[serde(default)]
    pub personas: HashMap<String, String>,
}

impl PromptConfig {
    pub fn system_prompt_for(&self, model: &str) -> String {
        if let Some(prompt) = self.personas.get(model) {
            return prompt.clone();
        }
        if self.default_template.is_none() && model == defaults::DEFAULT_MODEL {
            return defaults::LLAMA3_SYSTEM_PROMPT.to_string();
        }

        self.default_template
            .as_deref()
            .unwrap_or(defaults::GENERAL_SYSTEM_TEMPLATE)
            .replace(MODEL_NAME_PLACEHOLDER, model)
    }
}
