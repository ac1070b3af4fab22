//! Per-turn error taxonomy.
//!
//! Every variant is fatal for the current turn only: the error is reported
//! once, whatever was accumulated for the turn is discarded, and the session
//! stays usable for the next user action. There are no retries.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TurnError {
    /// Audio hardware unavailable or the capture stream failed.
    #[error("audio device unavailable: {0}")]
    Device(String),

    /// The recognition model could not be located or loaded.
    #[error("failed to load speech model from '{path}'")]
    ModelLoad { path: String },

    /// The recognizer rejected or failed to decode fed waveform data.
    #[error("speech recognizer failed: {0}")]
    Recognizer(String),

    /// An unparseable line arrived on the chat completion stream.
    #[error("malformed stream line: {0}")]
    MalformedStream(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TurnError {
    /// Stable label used in debug logs.
    pub fn label(&self) -> &'static str {
        match self {
            TurnError::Device(_) => "device",
            TurnError::ModelLoad { .. } => "model_load",
            TurnError::Recognizer(_) => "recognizer",
            TurnError::MalformedStream(_) => "malformed_stream",
            TurnError::Other(_) => "other",
        }
    }
}
