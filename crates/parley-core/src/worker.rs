//! Background task that drives a backend stream for one turn
//!
//! ```text
//! ChatBackend::stream_chat() -> TokenStream
//!            |
//!            v (ownership transfer)
//!     TurnWorker::spawn()
//!            |
//!            v (StreamEvent, FIFO)
//!     StreamEventReceiver (drained by the UI loop)
//! ```
//!
//! The worker never touches UI state. A pending read is raced against the
//! cancel flag, so a stop takes effect without waiting for the server.

use crate::backend::{ChatBackend, TokenEvent, TokenStream};
use crate::conversation::TurnRequest;
use crate::stream::TurnId;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Events sent from the worker to the UI loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Non-empty text delta
    Delta { turn: TurnId, text: String, seq: u64 },
    /// Stream ended or cancellation was observed
    Finished { turn: TurnId, cancelled: bool },
    /// Backend failed; the turn is abandoned
    Failed { turn: TurnId, message: String },
}

impl StreamEvent {
    pub fn turn(&self) -> TurnId {
        match self {
            StreamEvent::Delta { turn, .. }
            | StreamEvent::Finished { turn, .. }
            | StreamEvent::Failed { turn, .. } => *turn,
        }
    }
}

pub type StreamEventSender = UnboundedSender<StreamEvent>;
pub type StreamEventReceiver = UnboundedReceiver<StreamEvent>;

/// Create a channel pair for worker events
pub fn create_stream_channel() -> (StreamEventSender, StreamEventReceiver) {
    unbounded_channel()
}

/// Namespace for spawning turn workers
pub struct TurnWorker;

impl TurnWorker {
    /// Open the backend stream and consume it on a new task
    pub fn spawn(
        backend: Arc<dyn ChatBackend>,
        request: TurnRequest,
        tx: StreamEventSender,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            debug!(turn = %request.turn, backend = backend.name(), "Turn worker started");
            let stream = backend.stream_chat(&request.model, &request.messages);
            Self::run(request, stream, tx).await;
        })
    }

    /// Consume a token stream and report events until it ends
    pub async fn run(request: TurnRequest, mut stream: TokenStream, tx: StreamEventSender) {
        let turn = request.turn;
        let mut seq = 0u64;

        loop {
            if request.cancel.is_cancelled() {
                break;
            }

            // Wakes on cancel even if the server never sends another line
            let next = tokio::select! {
                biased;
                () = request.cancel.cancelled() => {
                    debug!(%turn, "Cancelled while waiting for the next token");
                    break;
                }
                next = stream.next() => next,
            };

            if request.cancel.is_cancelled() {
                debug!(%turn, "Cancellation observed, dropping pending read");
                break;
            }

            match next {
                Some(Ok(TokenEvent::Content(text))) => {
                    if text.is_empty() {
                        continue;
                    }
                    if tx.send(StreamEvent::Delta { turn, text, seq }).is_err() {
                        debug!(%turn, "Receiver dropped, stopping worker");
                        return;
                    }
                    seq += 1;
                }
                Some(Ok(TokenEvent::End)) | None => {
                    debug!(%turn, deltas = seq, "Stream done");
                    let _ = tx.send(StreamEvent::Finished {
                        turn,
                        cancelled: false,
                    });
                    return;
                }
                Some(Err(e)) => {
                    warn!(%turn, deltas = seq, error = %e, "Stream error");
                    let _ = tx.send(StreamEvent::Failed {
                        turn,
                        message: e.to_string(),
                    });
                    return;
                }
            }
        }

        debug!(%turn, deltas = seq, "Stream cancelled");
        let _ = tx.send(StreamEvent::Finished {
            turn,
            cancelled: true,
        });
    }
}
