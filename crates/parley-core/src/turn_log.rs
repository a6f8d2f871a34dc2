//! Ordered conversation context sent to the backend each turn

use crate::document::PersistedDocument;
use crate::error::{ChatError, ChatResult};
use crate::message::{Message, Role};

/// Role-tagged message history.
///
/// Position 0 always holds the system prompt and no other message may carry
/// the system role. Messages are only ever appended; [`TurnLog::reset`] is
/// the one way to drop them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnLog {
    messages: Vec<Message>,
}

impl TurnLog {
    /// Create a log containing only the given system prompt
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Replace the whole history with a single system message
    pub fn reset(&mut self, system_prompt: impl Into<String>) {
        self.messages.clear();
        self.messages.push(Message::system(system_prompt));
    }

    /// Append a user or assistant message
    pub fn append(&mut self, message: Message) -> ChatResult<()> {
        if message.role == Role::System {
            return Err(ChatError::InvalidRole(Role::System));
        }
        self.messages.push(message);
        Ok(())
    }

    /// Full ordered context including the system prompt.
    ///
    /// Nothing is trimmed: every turn resends the entire history.
    pub fn snapshot_for_backend(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Rebuild a log from a persisted document, validating its invariants
    pub fn load(document: &PersistedDocument) -> ChatResult<Self> {
        validate(&document.messages)?;
        Ok(Self {
            messages: document.messages.clone(),
        })
    }

    /// Produce a document for persistence
    pub fn save(&self, model: &str, theme: &str) -> PersistedDocument {
        PersistedDocument {
            model: model.to_string(),
            messages: self.messages.clone(),
            theme: theme.to_string(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false; the system prompt is always present
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn system_prompt(&self) -> &str {
        self.messages
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    /// Number of messages after the system prompt
    pub fn context_len(&self) -> usize {
        self.messages.len().saturating_sub(1)
    }

    /// Messages after the system prompt, in order
    pub fn turns(&self) -> &[Message] {
        self.messages.get(1..).unwrap_or_default()
    }

    pub fn first_user_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.role == Role::User)
    }
}

/// Check the system-first invariant of a message list
pub fn validate(messages: &[Message]) -> ChatResult<()> {
    match messages.first() {
        None => Err(ChatError::CorruptHistory("history has no messages".to_string())),
        Some(first) if first.role != Role::System => Err(ChatError::CorruptHistory(format!(
            "first message has role {}, expected system",
            first.role
        ))),
        Some(_) => {
            if let Some(pos) = messages
                .iter()
                .skip(1)
                .position(|m| m.role == Role::System)
            {
                return Err(ChatError::CorruptHistory(format!(
                    "system message at position {}",
                    pos + 1
                )));
            }
            Ok(())
        }
    }
}
