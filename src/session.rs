//! Conversation state for one REPL run.
//!
//! The session owns the message history sent with every request and the
//! one-shot flag marking that the pending turn came from the microphone.
//! A failed turn leaves the history exactly as it was before the user
//! message would have been answered.

use crate::chat::ChatMessage;

const PRIMING_PROMPT: &str = "Always answer very short, but act like a professional. Start over.";
const PRIMING_REPLY: &str = "Alright";

pub struct Session {
    history: Vec<ChatMessage>,
    voice_pending: bool,
}

impl Session {
    /// Fresh session seeded with the contextual priming exchange.
    pub fn new() -> Self {
        Self {
            history: vec![
                ChatMessage::user(PRIMING_PROMPT),
                ChatMessage::assistant(PRIMING_REPLY),
            ],
            voice_pending: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn push_user(&mut self, content: &str) {
        self.history.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: &str) {
        self.history.push(ChatMessage::assistant(content));
    }

    /// Drop the last user message after a turn that produced no reply.
    pub fn retract_user(&mut self) {
        if self
            .history
            .last()
            .map(|message| message.role == "user")
            .unwrap_or(false)
        {
            self.history.pop();
        }
    }

    /// Mark the next reply as voice-initiated.
    pub fn mark_voice(&mut self) {
        self.voice_pending = true;
    }

    /// Consume the voice flag; true at most once per `mark_voice`.
    pub fn take_voice(&mut self) -> bool {
        std::mem::take(&mut self.voice_pending)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
