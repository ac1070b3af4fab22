//! Microphone capture with silence endpointing.
//!
//! Audio is recorded in fixed-duration chunks via CPAL and accumulated until
//! the mean amplitude stays below the configured threshold for the configured
//! silence duration. The finished capture is quantized to 16-bit PCM for the
//! recognizer.

mod capture;
mod recorder;

pub use capture::{
    mean_amplitude, quantize, AudioClip, CaptureConfig, CaptureState, Recording, SilenceTracker,
};
pub use recorder::{ChunkSource, CpalChunkSource};
