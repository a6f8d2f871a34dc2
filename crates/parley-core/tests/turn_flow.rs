//! End-to-end turn flow: Conversation + TurnWorker + scripted backend
//!
//! Drives real worker tasks over the event channel the way the UI loop does
//! and checks what reaches the transcript and the history file.

use async_trait::async_trait;
use futures::stream;
use parley_core::{
    create_stream_channel, BackendError, BackendResult, ChatBackend, ChatError, Conversation,
    HistoryStore, Message, Role, Segment, StreamEvent, StreamEventReceiver, TokenEvent,
    TokenStream, TranscriptSink, TurnId, TurnOutcome, TurnWorker,
};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

/// Backend replaying a fixed script for every turn
struct ScriptedBackend {
    script: Vec<BackendResult<TokenEvent>>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedBackend {
    fn new(script: Vec<BackendResult<TokenEvent>>) -> Arc<Self> {
        Arc::new(Self {
            script,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn tokens(tokens: &[&str]) -> Arc<Self> {
        let mut script: Vec<_> = tokens
            .iter()
            .map(|t| Ok(TokenEvent::Content(t.to_string())))
            .collect();
        script.push(Ok(TokenEvent::End));
        Self::new(script)
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn stream_chat(&self, _model: &str, messages: &[Message]) -> TokenStream {
        self.seen.lock().unwrap().push(messages.to_vec());
        Box::pin(stream::iter(self.script.clone()))
    }

    async fn list_models(&self) -> BackendResult<Vec<String>> {
        Ok(vec!["llama3".to_string()])
    }
}

#[derive(Default)]
struct Transcript {
    live: Option<(TurnId, String)>,
    rendered: Vec<Vec<Segment>>,
    notices: Vec<String>,
}

impl TranscriptSink for Transcript {
    fn on_live_delta(&mut self, turn: TurnId, delta: &str) {
        let live = self.live.get_or_insert_with(|| (turn, String::new()));
        assert_eq!(live.0, turn, "only one live region at a time");
        live.1.push_str(delta);
    }

    fn on_finalize(&mut self, turn: TurnId, segments: &[Segment]) {
        if let Some((live_turn, _)) = self.live.take() {
            assert_eq!(live_turn, turn);
        }
        self.rendered.push(segments.to_vec());
    }

    fn on_abandon(&mut self, _turn: TurnId, notice: &str) {
        self.live = None;
        self.notices.push(notice.to_string());
    }
}

fn fresh(dir: &TempDir) -> Conversation {
    Conversation::new(
        HistoryStore::new(dir.path().join("chat_history.json")),
        "llama3",
        "dark",
        "You are llama3",
    )
}

async fn pump(
    conversation: &mut Conversation,
    rx: &mut StreamEventReceiver,
    sink: &mut Transcript,
) -> TurnOutcome {
    while let Some(event) = rx.recv().await {
        if let Some(outcome) = conversation.apply(event, sink).unwrap() {
            return outcome;
        }
    }
    panic!("channel closed before the turn ended");
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_hello_turn_end_to_end() {
    let dir = TempDir::new().unwrap();
    let backend = ScriptedBackend::tokens(&["Hi ", "there", "!"]);
    let mut conversation = fresh(&dir);
    let mut sink = Transcript::default();
    let (tx, mut rx) = create_stream_channel();

    // Phase 1: submit and stream
    let request = conversation.submit("hello").unwrap();
    TurnWorker::spawn(backend.clone(), request, tx);
    let outcome = pump(&mut conversation, &mut rx, &mut sink).await;

    // Phase 2: committed state
    assert!(matches!(outcome, TurnOutcome::Completed { cancelled: false, saved: true, .. }));
    assert_eq!(conversation.log().len(), 3);
    assert_eq!(conversation.log().messages()[2], Message::assistant("Hi there!"));
    assert_eq!(sink.rendered, vec![vec![Segment::prose("Hi there!")]]);
    assert!(sink.live.is_none());

    // Phase 3: the backend saw the full context, and the file matches
    let seen = backend.seen.lock().unwrap();
    assert_eq!(seen[0].len(), 2);
    assert_eq!(seen[0][0].role, Role::System);

    let saved = conversation.store().load().unwrap().unwrap();
    assert_eq!(saved.messages.len(), 3);
    assert_eq!(saved.model, "llama3");
}

#[tokio::test]
async fn test_history_resent_every_turn() {
    let dir = TempDir::new().unwrap();
    let backend = ScriptedBackend::tokens(&["ok"]);
    let mut conversation = fresh(&dir);
    let mut sink = Transcript::default();
    let (tx, mut rx) = create_stream_channel();

    for prompt in ["one", "two", "three"] {
        let request = conversation.submit(prompt).unwrap();
        TurnWorker::spawn(backend.clone(), request, tx.clone());
        pump(&mut conversation, &mut rx, &mut sink).await;
    }

    let seen = backend.seen.lock().unwrap();
    let sizes: Vec<usize> = seen.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![2, 4, 6]);
    assert_eq!(conversation.log().len(), 7);
}

#[tokio::test]
async fn test_second_send_rejected_until_finalized() {
    let dir = TempDir::new().unwrap();
    let backend = ScriptedBackend::tokens(&["a", "b"]);
    let mut conversation = fresh(&dir);
    let mut sink = Transcript::default();
    let (tx, mut rx) = create_stream_channel();

    let request = conversation.submit("first").unwrap();
    assert!(matches!(
        conversation.submit("second"),
        Err(ChatError::StaleSession { .. })
    ));

    TurnWorker::spawn(backend, request, tx);
    pump(&mut conversation, &mut rx, &mut sink).await;

    let assistants = conversation
        .log()
        .messages()
        .iter()
        .filter(|m| m.role == Role::Assistant)
        .count();
    assert_eq!(assistants, 1);
    assert!(conversation.submit("second").is_ok());
}

#[tokio::test]
async fn test_backend_error_before_first_token() {
    let dir = TempDir::new().unwrap();
    let backend = ScriptedBackend::new(vec![Err(BackendError::Unavailable(
        "connection refused".to_string(),
    ))]);
    let mut conversation = fresh(&dir);
    let mut sink = Transcript::default();
    let (tx, mut rx) = create_stream_channel();

    let request = conversation.submit("hello").unwrap();
    TurnWorker::spawn(backend, request, tx);
    let outcome = pump(&mut conversation, &mut rx, &mut sink).await;

    assert!(matches!(outcome, TurnOutcome::Abandoned { .. }));
    assert!(!conversation.is_streaming());
    assert!(sink.rendered.is_empty());
    assert!(sink.notices[0].starts_with("API Error"));
    assert!(conversation
        .log()
        .messages()
        .iter()
        .all(|m| m.role != Role::Assistant));
    assert!(
        conversation.store().load().unwrap().is_none(),
        "abandoned turn must not be persisted"
    );
}

#[tokio::test]
async fn test_interrupted_stream_leaves_previous_boundary_on_disk() {
    let dir = TempDir::new().unwrap();
    let mut conversation = fresh(&dir);
    let mut sink = Transcript::default();
    let (tx, mut rx) = create_stream_channel();

    // Phase 1: one complete turn
    let request = conversation.submit("hello").unwrap();
    TurnWorker::spawn(ScriptedBackend::tokens(&["Hi"]), request, tx.clone());
    pump(&mut conversation, &mut rx, &mut sink).await;

    // Phase 2: a second turn that stops mid-stream (no End, no drain)
    let request = conversation.submit("tell me more").unwrap();
    conversation
        .apply(
            StreamEvent::Delta {
                turn: request.turn,
                text: "Well".to_string(),
                seq: 0,
            },
            &mut sink,
        )
        .unwrap();
    drop(conversation);

    // Phase 3: reload sees exactly the first turn
    let (restored, _) = Conversation::restore(
        HistoryStore::new(dir.path().join("chat_history.json")),
        "llama3",
        "dark",
        |_| "unused".to_string(),
    );
    assert_eq!(restored.log().len(), 3);
    assert_eq!(restored.log().messages()[2], Message::assistant("Hi"));
}
