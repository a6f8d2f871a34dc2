//! Shared helpers for backend integration tests

#![allow(dead_code)]

pub mod mock_server;

use futures::StreamExt;
use parley_core::{BackendError, TokenEvent, TokenStream};

/// Collect all content until End, failing on the first error
pub async fn collect_stream_content(mut stream: TokenStream) -> Result<String, BackendError> {
    let mut content = String::new();
    while let Some(event) = stream.next().await {
        match event? {
            TokenEvent::Content(text) => content.push_str(&text),
            TokenEvent::End => break,
        }
    }
    Ok(content)
}

/// Collect content and the first error, if any
pub async fn collect_stream_with_error(mut stream: TokenStream) -> (String, Option<BackendError>) {
    let mut content = String::new();
    while let Some(event) = stream.next().await {
        match event {
            Ok(TokenEvent::Content(text)) => content.push_str(&text),
            Ok(TokenEvent::End) => break,
            Err(e) => return (content, Some(e)),
        }
    }
    (content, None)
}

/// Collect every item of the stream
pub async fn collect_events(mut stream: TokenStream) -> Vec<Result<TokenEvent, BackendError>> {
    let mut events = Vec::new();
    while let Some(event) = stream.next().await {
        events.push(event);
    }
    events
}
