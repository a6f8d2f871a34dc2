//! UI-side orchestration of turns
//!
//! [`Conversation`] owns the [`TurnLog`], the [`HistoryStore`] and at most one
//! active [`StreamSession`]. The UI loop feeds it user input and worker
//! events; it answers with [`TurnRequest`]s for the worker and drives a
//! [`TranscriptSink`] for rendering.
//!
//! Persistence happens only at turn boundaries: after a finalize, a reset or
//! an explicit save. A pending user message whose response is still streaming
//! is never written.

use crate::blocks::Segment;
use crate::document::{HistoryStore, PersistedDocument};
use crate::error::{ChatError, ChatResult};
use crate::message::{Message, Role};
use crate::stream::{CancelFlag, StreamPhase, StreamSession, TurnId};
use crate::turn_log::TurnLog;
use crate::worker::StreamEvent;
use tracing::{debug, info, warn};

/// Rendering contract for a transcript.
///
/// All live deltas of a turn arrive before that turn's single
/// `on_finalize` or `on_abandon`.
pub trait TranscriptSink {
    /// Append streamed text to the live region of `turn`
    fn on_live_delta(&mut self, turn: TurnId, delta: &str);

    /// Replace the live region of `turn` with its parsed segments
    fn on_finalize(&mut self, turn: TurnId, segments: &[Segment]);

    /// Remove the live region of `turn` and show a notice instead
    fn on_abandon(&mut self, turn: TurnId, notice: &str);
}

/// Everything the worker needs to run one turn
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub turn: TurnId,
    pub model: String,
    pub messages: Vec<Message>,
    pub cancel: CancelFlag,
}

/// Result of applying a terminal worker event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Assistant message appended and rendered
    Completed {
        turn: TurnId,
        cancelled: bool,
        placeholder: bool,
        /// Whether the document reached disk
        saved: bool,
    },
    /// Backend failed; no assistant message was appended
    Abandoned { turn: TurnId, notice: String },
}

/// How [`Conversation::restore`] found the persisted document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored,
    Missing,
    /// Unreadable or invalid; a fresh history replaced it
    Corrupt(String),
}

pub struct Conversation {
    log: TurnLog,
    store: HistoryStore,
    model: String,
    theme: String,
    active: Option<StreamSession>,
    next_turn: TurnId,
}

impl Conversation {
    /// Start a fresh conversation; nothing is written until the first save
    pub fn new(
        store: HistoryStore,
        model: impl Into<String>,
        theme: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            log: TurnLog::new(system_prompt),
            store,
            model: model.into(),
            theme: theme.into(),
            active: None,
            next_turn: TurnId::first(),
        }
    }

    /// Load the persisted document, falling back to a fresh history.
    ///
    /// `system_prompt` maps a model name to its persona prompt and is used
    /// only when starting fresh.
    pub fn restore(
        store: HistoryStore,
        default_model: &str,
        default_theme: &str,
        system_prompt: impl Fn(&str) -> String,
    ) -> (Self, RestoreOutcome) {
        let loaded = store
            .load()
            .and_then(|doc| doc.map(|d| TurnLog::load(&d).map(|log| (d, log))).transpose());

        match loaded {
            Ok(Some((doc, log))) => {
                info!(
                    path = %store.path().display(),
                    model = %doc.model,
                    messages = log.len(),
                    "History restored"
                );
                let conversation = Self {
                    log,
                    store,
                    model: doc.model,
                    theme: doc.theme,
                    active: None,
                    next_turn: TurnId::first(),
                };
                (conversation, RestoreOutcome::Restored)
            }
            Ok(None) => {
                let conversation = Self::new(
                    store,
                    default_model,
                    default_theme,
                    system_prompt(default_model),
                );
                (conversation, RestoreOutcome::Missing)
            }
            Err(e) => {
                warn!(error = %e, "Discarding unreadable history");
                let conversation = Self::new(
                    store,
                    default_model,
                    default_theme,
                    system_prompt(default_model),
                );
                // Leave the file alone when it could not be read at all.
                if matches!(e, ChatError::CorruptHistory(_)) {
                    if let Err(save_err) = conversation.save() {
                        warn!(error = %save_err, "Failed to replace unreadable history");
                    }
                }
                (conversation, RestoreOutcome::Corrupt(e.to_string()))
            }
        }
    }

    pub fn log(&self) -> &TurnLog {
        &self.log
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn is_streaming(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_turn(&self) -> Option<TurnId> {
        self.active.as_ref().map(StreamSession::turn)
    }

    /// Text streamed so far in the active turn
    pub fn live_text(&self) -> Option<&str> {
        self.active.as_ref().map(StreamSession::text)
    }

    /// Append the user prompt and open a session for the response.
    ///
    /// Rejected with [`ChatError::StaleSession`] while a turn is streaming.
    pub fn submit(&mut self, prompt: impl Into<String>) -> ChatResult<TurnRequest> {
        self.ensure_idle()?;

        self.log.append(Message::user(prompt))?;

        let turn = self.next_turn;
        self.next_turn = turn.next();
        let session = StreamSession::start(turn, self.model.clone());
        let request = TurnRequest {
            turn,
            model: self.model.clone(),
            messages: self.log.snapshot_for_backend(),
            cancel: session.cancel_flag(),
        };
        self.active = Some(session);

        debug!(%turn, context = request.messages.len(), "Turn submitted");
        Ok(request)
    }

    /// Signal the active worker to stop; returns false when nothing streams
    pub fn cancel(&self) -> bool {
        match &self.active {
            Some(session) => {
                session.cancel();
                info!(turn = %session.turn(), "Cancellation requested");
                true
            }
            None => false,
        }
    }

    /// Apply one worker event.
    ///
    /// Events from a turn other than the active one are ignored. Returns the
    /// outcome when the event ended the turn.
    pub fn apply(
        &mut self,
        event: StreamEvent,
        sink: &mut dyn TranscriptSink,
    ) -> ChatResult<Option<TurnOutcome>> {
        if self.active_turn() != Some(event.turn()) {
            debug!(turn = %event.turn(), "Ignoring event for inactive turn");
            return Ok(None);
        }

        match event {
            StreamEvent::Delta { turn, text, .. } => {
                let accepted = match self.active.as_mut() {
                    Some(session) => session.on_token(&text)?,
                    None => false,
                };
                if accepted {
                    sink.on_live_delta(turn, &text);
                }
                Ok(None)
            }
            StreamEvent::Finished { .. } => self.finalize(sink).map(Some),
            StreamEvent::Failed { turn, message } => {
                self.active = None;
                let notice = format!(
                    "API Error: Could not get response from the model server. Check server status. ({})",
                    message
                );
                warn!(%turn, error = %message, "Turn abandoned");
                sink.on_abandon(turn, &notice);
                Ok(Some(TurnOutcome::Abandoned { turn, notice }))
            }
        }
    }

    fn finalize(&mut self, sink: &mut dyn TranscriptSink) -> ChatResult<TurnOutcome> {
        let Some(mut session) = self.active.take() else {
            return Err(ChatError::InvalidTransition {
                operation: "finalize",
                phase: StreamPhase::Done,
            });
        };
        let turn = session.turn();
        let finalized = session.finalize()?;

        self.log.append(Message::assistant(finalized.content))?;
        let saved = match self.save() {
            Ok(()) => true,
            Err(e) => {
                warn!(%turn, error = %e, "Failed to persist finalized turn");
                false
            }
        };
        session.complete()?;

        sink.on_finalize(turn, &finalized.segments);

        info!(
            %turn,
            cancelled = finalized.cancelled,
            placeholder = finalized.placeholder,
            messages = self.log.len(),
            "Turn finalized"
        );
        Ok(TurnOutcome::Completed {
            turn,
            cancelled: finalized.cancelled,
            placeholder: finalized.placeholder,
            saved,
        })
    }

    /// Start a new context with the given system prompt and persist it
    pub fn reset(&mut self, system_prompt: impl Into<String>) -> ChatResult<()> {
        self.ensure_idle()?;
        self.log.reset(system_prompt);
        info!(model = %self.model, "Conversation reset");
        self.save()
    }

    /// Switch models; the context restarts with the new persona
    pub fn switch_model(
        &mut self,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> ChatResult<()> {
        self.ensure_idle()?;
        self.model = model.into();
        self.reset(system_prompt)
    }

    /// Change the active model name without touching the context
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    /// Record a theme change and persist it
    pub fn set_theme(&mut self, theme: impl Into<String>) -> ChatResult<()> {
        self.theme = theme.into();
        self.save()
    }

    /// Document reflecting the last complete turn boundary
    pub fn document(&self) -> PersistedDocument {
        let mut document = self.log.save(&self.model, &self.theme);
        if self.active.is_some()
            && document.messages.last().map(|m| m.role) == Some(Role::User)
        {
            document.messages.pop();
        }
        document
    }

    /// Write [`Conversation::document`] to the store
    pub fn save(&self) -> ChatResult<()> {
        self.store.save(&self.document())
    }

    fn ensure_idle(&self) -> ChatResult<()> {
        match self.active_turn() {
            Some(active) => Err(ChatError::StaleSession { active }),
            None => Ok(()),
        }
    }
}
