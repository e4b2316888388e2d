//! One conversation: append-only messages plus unlocked panels.
//!
//! A submit is split in two so the caller can wait out the display delay
//! between the user's message and the reply without holding any lock:
//! [`ConversationSession::begin`] records the user message and resolves the
//! intent, [`ConversationSession::complete`] appends the reply and applies
//! the signal.

use super::matcher::match_intent;
use super::responses::ResponseTable;
use super::{Message, Panel, UiState};

/// A resolved reply waiting to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    pub reply: String,
    pub signal: Option<Panel>,
}

#[derive(Debug, Clone)]
pub struct ConversationSession {
    messages: Vec<Message>,
    ui: UiState,
}

impl ConversationSession {
    /// Open a session whose first message is the assistant's greeting.
    #[must_use]
    pub fn new(greeting: &str) -> Self {
        Self { messages: vec![Message::assistant(greeting)], ui: UiState::default() }
    }

    /// Append the user's message and resolve the reply. Blank input is
    /// ignored and returns `None`.
    pub fn begin(&mut self, table: &ResponseTable, text: &str) -> Option<PendingReply> {
        if text.trim().is_empty() {
            return None;
        }
        self.messages.push(Message::user(text));
        let intent = match_intent(table, text);
        Some(PendingReply { reply: intent.reply.to_owned(), signal: intent.signal })
    }

    /// Append the assistant reply and unlock the signalled panels. Returns
    /// the appended reply.
    pub fn complete(&mut self, pending: PendingReply) -> Message {
        if let Some(signal) = pending.signal {
            self.ui.unlock(signal);
        }
        let reply = Message::assistant(pending.reply);
        self.messages.push(reply.clone());
        reply
    }

    /// `begin` and `complete` with no delay in between.
    pub fn submit(&mut self, table: &ResponseTable, text: &str) -> Option<Message> {
        let pending = self.begin(table, text)?;
        Some(self.complete(pending))
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn ui_state(&self) -> UiState {
        self.ui
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
