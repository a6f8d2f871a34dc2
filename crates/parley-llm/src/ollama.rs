//! Ollama chat backend
//!
//! Streams `POST /api/chat` as NDJSON, one JSON object per line, and lists
//! installed models through `GET /api/tags`.

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use parley_config::ChatConfig;
use parley_core::{BackendError, BackendResult, ChatBackend, Message, TokenEvent, TokenStream};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Timeout for the reachability check
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Ollama HTTP backend
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl OllamaBackend {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.llm_endpoint(), config.timeout_secs())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the server answers `/api/tags` within a short timeout
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(url = %url, error = %e, "Ollama health check failed");
                false
            }
        }
    }
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    fn name(&self) -> &str {
        "Ollama"
    }

    fn stream_chat(&self, model: &str, messages: &[Message]) -> TokenStream {
        let url = format!("{}/api/chat", self.base_url);
        let request = serde_json::json!({
            "model": model,
            "messages": messages,
            "stream": true,
        });

        let client = self.client.clone();
        let timeout = self.timeout;

        Box::pin(stream! {
            let response = client
                .post(&url)
                .json(&request)
                .timeout(timeout)
                .send()
                .await;

            let response = match response {
                Ok(res) if res.status().is_success() => res,
                Ok(res) => {
                    let status = res.status();
                    let error_text = res.text().await.unwrap_or_default();
                    yield Err(BackendError::Unavailable(format!(
                        "Ollama API error ({}): {}",
                        status,
                        error_text.trim()
                    )));
                    return;
                }
                Err(e) => {
                    yield Err(BackendError::Unavailable(e.to_string()));
                    return;
                }
            };

            let mut bytes = response.bytes_stream();
            // Raw bytes so multi-byte characters split across chunks survive
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(chunk) => buffer.extend_from_slice(&chunk),
                    Err(e) => {
                        yield Err(BackendError::Unavailable(e.to_string()));
                        return;
                    }
                }

                while let Some(line_end) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=line_end).collect();
                    match parse_line(&line) {
                        Ok(None) => continue,
                        Ok(Some(LineEvent::Content(content))) => {
                            yield Ok(TokenEvent::Content(content));
                        }
                        Ok(Some(LineEvent::Done(content))) => {
                            if !content.is_empty() {
                                yield Ok(TokenEvent::Content(content));
                            }
                            yield Ok(TokenEvent::End);
                            return;
                        }
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            // A final line without its newline
            match parse_line(&buffer) {
                Ok(Some(LineEvent::Content(content))) | Ok(Some(LineEvent::Done(content))) => {
                    if !content.is_empty() {
                        yield Ok(TokenEvent::Content(content));
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
            yield Ok(TokenEvent::End);
        })
    }

    async fn list_models(&self) -> BackendResult<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::Unavailable(format!(
                "Ollama API error ({})",
                response.status()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse model list: {}", e)))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[derive(Debug)]
enum LineEvent {
    Content(String),
    /// Closing object, which may still carry text
    Done(String),
}

fn parse_line(line: &[u8]) -> BackendResult<Option<LineEvent>> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let response: OllamaStreamResponse = serde_json::from_str(line).map_err(|e| {
        warn!(error = %e, "Unparseable stream line");
        BackendError::InvalidResponse(format!("Failed to parse stream: {}", e))
    })?;

    if let Some(error) = response.error {
        return Err(BackendError::Unavailable(error));
    }

    let content = response.message.map(|m| m.content).unwrap_or_default();
    if response.done {
        debug!(done_reason = ?response.done_reason, "Ollama stream done");
        return Ok(Some(LineEvent::Done(content)));
    }

    Ok(Some(LineEvent::Content(content)))
}

// Ollama streaming response types
#[derive(Debug, Deserialize)]
struct OllamaStreamResponse {
    #[serde(default)]
    message: Option<OllamaStreamMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaStreamMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}
