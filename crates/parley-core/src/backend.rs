//! Model server abstraction
//!
//! Implementations live in `parley-llm`; the core only needs a lazily produced
//! token stream per turn and a list of model names.

use crate::error::BackendResult;
use crate::message::Message;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// One item of a backend token stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenEvent {
    /// Next piece of response text
    Content(String),
    /// The response is complete
    End,
}

pub type TokenStream = BoxStream<'static, BackendResult<TokenEvent>>;

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Short name for logs and the status bar
    fn name(&self) -> &str;

    /// Open a new response stream for the given context.
    ///
    /// The stream may fail at any point, including before the first token.
    /// Ending without [`TokenEvent::End`] counts as a normal end.
    fn stream_chat(&self, model: &str, messages: &[Message]) -> TokenStream;

    /// Names of models the server can run
    async fn list_models(&self) -> BackendResult<Vec<String>>;
}
