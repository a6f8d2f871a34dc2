//! wiremock fixtures imitating Ollama's HTTP API

use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// NDJSON body with one line per chunk and a final done line
pub fn ollama_response_chunks(chunks: &[&str]) -> String {
    let mut body = String::new();
    for chunk in chunks {
        let line = serde_json::json!({
            "model": "llama3",
            "message": {"role": "assistant", "content": chunk},
            "done": false,
        });
        body.push_str(&line.to_string());
        body.push('\n');
    }
    let done = serde_json::json!({
        "model": "llama3",
        "message": {"role": "assistant", "content": ""},
        "done": true,
        "done_reason": "stop",
    });
    body.push_str(&done.to_string());
    body.push('\n');
    body
}

/// Server answering `/api/chat` with the given body
pub async fn ollama_mock_server(body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/x-ndjson")
                .set_body_string(body.to_string()),
        )
        .mount(&server)
        .await;
    server
}

/// Server answering `/api/chat` after a delay
pub async fn ollama_mock_server_delayed(body: &str, delay: Duration) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body.to_string())
                .set_delay(delay),
        )
        .mount(&server)
        .await;
    server
}

/// Server failing `/api/chat` with a status code
pub async fn ollama_mock_server_error(status: u16, body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body.to_string()))
        .mount(&server)
        .await;
    server
}

/// Server listing the given models on `/api/tags`
pub async fn ollama_tags_server(models: &[&str]) -> MockServer {
    let server = MockServer::start().await;
    let models: Vec<_> = models
        .iter()
        .map(|name| serde_json::json!({"name": name, "size": 1}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "models": models })))
        .mount(&server)
        .await;
    server
}
