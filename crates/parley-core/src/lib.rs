//! Core of the parley chat client.
//!
//! Everything here is independent of the terminal and of any particular
//! model server:
//!
//! - [`TurnLog`] keeps the role-tagged conversation context.
//! - [`blocks`] splits raw assistant text into prose and fenced code segments.
//! - [`StreamSession`] tracks one streaming assistant turn from first token to
//!   finalized message.
//! - [`Conversation`] sequences user input, worker events, persistence and the
//!   [`TranscriptSink`] that renders the turn.
//! - [`ChatBackend`] is the seam the model server plugs into; [`TurnWorker`]
//!   drives it on a background task and reports back over a channel.

pub mod backend;
pub mod blocks;
pub mod conversation;
pub mod document;
pub mod error;
pub mod message;
pub mod stream;
pub mod turn_log;
pub mod worker;

pub use backend::{ChatBackend, TokenEvent, TokenStream};
pub use blocks::{Segment, UNSPECIFIED_LANGUAGE};
pub use conversation::{
    Conversation, RestoreOutcome, TranscriptSink, TurnOutcome, TurnRequest,
};
pub use document::{HistoryStore, HistorySummary, PersistedDocument};
pub use error::{BackendError, BackendResult, ChatError, ChatResult};
pub use message::{Message, Role};
pub use stream::{
    CancelFlag, FinalizedText, StreamPhase, StreamSession, TurnId, EMPTY_RESPONSE_PLACEHOLDER,
};
pub use turn_log::TurnLog;
pub use worker::{create_stream_channel, StreamEvent, StreamEventReceiver, StreamEventSender, TurnWorker};
