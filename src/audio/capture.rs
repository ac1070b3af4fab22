//! Capture state machine with silence endpointing.
//!
//! Tracks the recording session: a fixed lead-in chunk first, then one chunk
//! at a time until the silence tracker trips. The chunk that trips silence is
//! kept; capture has no internal time cap, so a source that never goes quiet
//! records until the source itself stops.

use super::recorder::ChunkSource;
use crate::error::TurnError;
use anyhow::anyhow;
use std::time::Duration;

/// Settings for one capture session.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Mean-amplitude floor; a chunk at or above it counts as sound.
    pub threshold: f32,
    /// Sustained silence that ends the capture.
    pub silence_duration: Duration,
    pub sample_rate: u32,
    pub chunk_duration: Duration,
    pub pre_buffer_duration: Duration,
}

impl CaptureConfig {
    pub(super) fn chunk_samples(&self) -> usize {
        samples_for(self.sample_rate, self.chunk_duration)
    }

    pub(super) fn pre_buffer_samples(&self) -> usize {
        samples_for(self.sample_rate, self.pre_buffer_duration)
    }
}

fn samples_for(sample_rate: u32, duration: Duration) -> usize {
    ((f64::from(sample_rate) * duration.as_secs_f64()).round() as usize).max(1)
}

/// Linear session lifecycle. `Done` is terminal; a new [`Recording`] is
/// required for another capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Preparing,
    Recording,
    SilenceDetected,
    Done,
}

/// Accumulates sustained silence, resetting whenever sound is present.
#[derive(Debug)]
pub struct SilenceTracker {
    accumulated: Duration,
    limit: Duration,
}

impl SilenceTracker {
    pub fn new(limit: Duration) -> Self {
        Self {
            accumulated: Duration::ZERO,
            limit,
        }
    }

    /// Feed one chunk's mean amplitude. Returns true once the silence limit
    /// is reached. Amplitude exactly at the threshold counts as sound.
    pub fn observe(&mut self, mean_amplitude: f32, threshold: f32, chunk: Duration) -> bool {
        if mean_amplitude >= threshold {
            self.accumulated = Duration::ZERO;
            return false;
        }
        self.accumulated += chunk;
        self.accumulated >= self.limit
    }

    pub fn accumulated(&self) -> Duration {
        self.accumulated
    }
}

/// Finished capture: 16-bit PCM in temporal order, lead-in first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl AudioClip {
    /// Little-endian byte view fed to the recognizer.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.samples.len() * 2);
        for sample in &self.samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }
}

/// Mean absolute amplitude of one chunk. Empty chunks read as silent.
pub fn mean_amplitude(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.abs()).sum::<f32>() / samples.len() as f32
}

/// Quantize normalized floats to 16-bit PCM: round, then clip to the i16
/// range. Deterministic for identical input.
pub fn quantize(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|s| (s * 32_767.0).round().clamp(-32_768.0, 32_767.0) as i16)
        .collect()
}

/// One capture session driving a [`ChunkSource`] until silence is reached.
pub struct Recording {
    cfg: CaptureConfig,
    state: CaptureState,
    silence: SilenceTracker,
    chunks: Vec<Vec<f32>>,
}

impl Recording {
    pub fn new(cfg: CaptureConfig) -> Self {
        let silence = SilenceTracker::new(cfg.silence_duration);
        Self {
            cfg,
            state: CaptureState::Idle,
            silence,
            chunks: Vec::new(),
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Block until the source has been silent for the configured duration,
    /// then return the quantized clip. The lead-in chunk is captured first
    /// and never evaluated for silence; the chunk that trips the tracker
    /// stays in the buffer.
    pub fn run(&mut self, source: &mut dyn ChunkSource) -> Result<AudioClip, TurnError> {
        if self.state != CaptureState::Idle {
            return Err(TurnError::Other(anyhow!(
                "capture session already used; construct a new one"
            )));
        }

        self.state = CaptureState::Preparing;
        let pre_buffer = source.record_chunk(self.cfg.pre_buffer_samples())?;
        self.chunks.push(pre_buffer);

        self.state = CaptureState::Recording;
        loop {
            let chunk = source.record_chunk(self.cfg.chunk_samples())?;
            let level = mean_amplitude(&chunk);
            self.chunks.push(chunk);
            if self
                .silence
                .observe(level, self.cfg.threshold, self.cfg.chunk_duration)
            {
                self.state = CaptureState::SilenceDetected;
                break;
            }
        }

        let total = self.chunks.iter().map(Vec::len).sum();
        let mut joined = Vec::with_capacity(total);
        for chunk in self.chunks.drain(..) {
            joined.extend(chunk);
        }
        self.state = CaptureState::Done;
        Ok(AudioClip {
            samples: quantize(&joined),
            sample_rate: self.cfg.sample_rate,
        })
    }
}
