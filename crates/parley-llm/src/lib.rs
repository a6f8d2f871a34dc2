//! Chat backends for parley
//!
//! - [`OllamaBackend`] talks to a local Ollama server over HTTP.
//! - [`MockBackend`] answers offline with canned persona responses.
//!
//! [`create_backend`] picks one according to the configured
//! [`BackendKind`](parley_config::BackendKind).

pub mod factory;
pub mod mock;
pub mod models;
pub mod ollama;

pub use factory::{create_backend, SelectedBackend};
pub use mock::MockBackend;
pub use models::{discover_models, merge_model_list, ModelList};
pub use ollama::OllamaBackend;
