//! State machine for one streaming assistant turn

use crate::blocks::{self, Segment};
use crate::error::{ChatError, ChatResult};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::debug;

/// Text finalized in place of an empty or whitespace-only response
pub const EMPTY_RESPONSE_PLACEHOLDER: &str =
    "I'm sorry, I received no content. The response may have been stopped or empty.";

/// Monotonic identifier of an assistant turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TurnId(u64);

impl TurnId {
    pub fn first() -> Self {
        TurnId(1)
    }

    pub fn next(self) -> Self {
        TurnId(self.0 + 1)
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a session: `Streaming -> Finalizing -> Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Streaming,
    Finalizing,
    Done,
}

impl fmt::Display for StreamPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StreamPhase::Streaming => "streaming",
            StreamPhase::Finalizing => "finalizing",
            StreamPhase::Done => "done",
        })
    }
}

/// Cooperative cancellation shared between the UI and the worker.
///
/// Once set it stays set. Tasks parked in [`CancelFlag::cancelled`] wake as
/// soon as it is set.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<CancelState>);

#[derive(Debug, Default)]
struct CancelState {
    set: AtomicBool,
    notify: Notify,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set.store(true, Ordering::SeqCst);
        self.0.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.set.load(Ordering::SeqCst)
    }

    /// Resolve once the flag is set
    pub async fn cancelled(&self) {
        let notified = self.0.notify.notified();
        tokio::pin!(notified);
        // Register before checking so a concurrent cancel cannot be missed
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// Final text of a turn, ready to be appended and rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedText {
    pub content: String,
    pub segments: Vec<Segment>,
    /// The placeholder replaced an empty response
    pub placeholder: bool,
    pub cancelled: bool,
}

/// Accumulates the tokens of one assistant turn
#[derive(Debug)]
pub struct StreamSession {
    turn: TurnId,
    model: String,
    text: String,
    cancel: CancelFlag,
    phase: StreamPhase,
    delta_count: u64,
}

impl StreamSession {
    /// Begin a session in the `Streaming` phase
    pub fn start(turn: TurnId, model: impl Into<String>) -> Self {
        let model = model.into();
        debug!(%turn, model = %model, "Stream session started");
        Self {
            turn,
            model,
            text: String::new(),
            cancel: CancelFlag::new(),
            phase: StreamPhase::Streaming,
            delta_count: 0,
        }
    }

    pub fn turn(&self) -> TurnId {
        self.turn
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    /// Text received so far
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn delta_count(&self) -> u64 {
        self.delta_count
    }

    /// Handle for the worker to observe cancellation
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Append a streamed delta
    ///
    /// Returns `false` when the delta was dropped because the turn is
    /// cancelled; the text is frozen from that point on.
    pub fn on_token(&mut self, delta: &str) -> ChatResult<bool> {
        self.require(StreamPhase::Streaming, "append a token")?;
        if self.is_cancelled() {
            debug!(turn = %self.turn, "Dropping token received after cancel");
            return Ok(false);
        }
        self.text.push_str(delta);
        self.delta_count += 1;
        Ok(true)
    }

    /// Request cancellation; accumulated text is kept
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Move to `Finalizing` and produce the text to commit
    pub fn finalize(&mut self) -> ChatResult<FinalizedText> {
        self.require(StreamPhase::Streaming, "finalize")?;
        self.phase = StreamPhase::Finalizing;

        let placeholder = self.text.trim().is_empty();
        let content = if placeholder {
            EMPTY_RESPONSE_PLACEHOLDER.to_string()
        } else {
            std::mem::take(&mut self.text)
        };
        let segments = blocks::parse(&content);

        debug!(
            turn = %self.turn,
            deltas = self.delta_count,
            len = content.len(),
            segments = segments.len(),
            placeholder,
            "Stream session finalizing"
        );

        Ok(FinalizedText {
            content,
            segments,
            placeholder,
            cancelled: self.is_cancelled(),
        })
    }

    /// Mark the session complete after the message has been committed
    pub fn complete(&mut self) -> ChatResult<()> {
        self.require(StreamPhase::Finalizing, "complete")?;
        self.phase = StreamPhase::Done;
        Ok(())
    }

    fn require(&self, phase: StreamPhase, operation: &'static str) -> ChatResult<()> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(ChatError::InvalidTransition {
                operation,
                phase: self.phase,
            })
        }
    }
}
