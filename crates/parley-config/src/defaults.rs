//! Built-in defaults

pub const DEFAULT_MODEL: &str = "llama3";

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Per-request timeout for a streamed chat response
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Models offered when the server cannot be queried
pub const FALLBACK_MODELS: &[&str] = &["llama3", "mistral", "dolphin-mixtral"];

/// Installed models hidden from the picker
pub const EXCLUDED_MODELS: &[&str] = &["codellama"];

/// How long a status message stays before reverting to "Ready"
pub const STATUS_TIMEOUT_MS: u64 = 5_000;

pub const HISTORY_FILE_NAME: &str = "chat_history.json";

pub const APP_DIR_NAME: &str = "parley";

/// Persona used for the `llama3` model
pub const LLAMA3_SYSTEM_PROMPT: &str = "You are llama3, a concise, culturally current expert on internet, and also business. \
Your tone is clear, engaging, and informative. You use modern phrasing and appropriate emojis some times. \
Focus on providing accurate context and explanations of internet culture.";

/// Persona for every other model; `{model_name}` is substituted
pub const GENERAL_SYSTEM_TEMPLATE: &str = "You are {model_name}, a highly capable, built for coding ALMOST ALL THE TIME, and formal AI assistant. \
Provide clear, detailed, and polite responses suitable for general knowledge or technical requests. \
Do not use slang, memes, or informal language.";
