//! System microphone access via CPAL.
//!
//! Provides blocking fixed-length chunk recording in normalized f32 mono,
//! converting whatever format and channel count the device delivers.

use crate::error::TurnError;
use crate::logging::log_debug;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Blocking source of fixed-length mono sample chunks.
///
/// The capture state machine only depends on this trait, so tests can script
/// chunk sequences without hardware.
pub trait ChunkSource {
    /// Record exactly `samples` mono samples and return them in order.
    fn record_chunk(&mut self, samples: usize) -> Result<Vec<f32>, TurnError>;
}

/// Microphone-backed [`ChunkSource`] at a fixed sample rate.
pub struct CpalChunkSource {
    device: cpal::Device,
    sample_rate: u32,
}

impl CpalChunkSource {
    /// List microphone names so the CLI can expose a selector.
    pub fn list_devices() -> Result<Vec<String>, TurnError> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|err| TurnError::Device(format!("no input devices available: {err}")))?;
        let mut names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Open the default input device, or a named one when the machine has
    /// several microphones.
    pub fn new(preferred_device: Option<&str>, sample_rate: u32) -> Result<Self, TurnError> {
        let host = cpal::default_host();
        let device = match preferred_device {
            Some(name) => {
                let mut devices = host.input_devices().map_err(|err| {
                    TurnError::Device(format!("no input devices available: {err}"))
                })?;
                devices
                    .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| TurnError::Device(format!("input device '{name}' not found")))?
            }
            None => host
                .default_input_device()
                .ok_or_else(|| TurnError::Device("no default input device available".into()))?,
        };
        Ok(Self {
            device,
            sample_rate,
        })
    }

    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string())
    }
}

impl ChunkSource for CpalChunkSource {
    fn record_chunk(&mut self, samples: usize) -> Result<Vec<f32>, TurnError> {
        let default_config = self
            .device
            .default_input_config()
            .map_err(|err| TurnError::Device(format!("no input config available: {err}")))?;
        let format = default_config.sample_format();
        let channels = usize::from(default_config.channels().max(1));
        let stream_config = StreamConfig {
            channels: default_config.channels().max(1),
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let duration =
            Duration::from_secs_f64(samples as f64 / f64::from(self.sample_rate));

        // cpal delivers samples on a callback thread; collect them in a
        // shared buffer so ownership stays on the caller side.
        let buffer = Arc::new(Mutex::new(Vec::<f32>::with_capacity(samples)));
        let buffer_clone = buffer.clone();
        let err_fn = |err| log_debug(&format!("audio_stream_error: {err}"));

        let stream = match format {
            SampleFormat::F32 => self.device.build_input_stream(
                &stream_config,
                move |data: &[f32], _| {
                    if let Ok(mut buf) = buffer_clone.lock() {
                        append_downmixed_samples(&mut buf, data, channels, |sample| sample);
                    }
                },
                err_fn,
                None,
            ),
            SampleFormat::I16 => self.device.build_input_stream(
                &stream_config,
                move |data: &[i16], _| {
                    if let Ok(mut buf) = buffer_clone.lock() {
                        append_downmixed_samples(&mut buf, data, channels, |sample| {
                            sample as f32 / 32_768.0_f32
                        });
                    }
                },
                err_fn,
                None,
            ),
            SampleFormat::U16 => self.device.build_input_stream(
                &stream_config,
                move |data: &[u16], _| {
                    if let Ok(mut buf) = buffer_clone.lock() {
                        append_downmixed_samples(&mut buf, data, channels, |sample| {
                            (sample as f32 - 32_768.0_f32) / 32_768.0_f32
                        });
                    }
                },
                err_fn,
                None,
            ),
            other => {
                return Err(TurnError::Device(format!(
                    "unsupported sample format: {other:?}"
                )))
            }
        }
        .map_err(|err| TurnError::Device(format!("failed to open input stream: {err}")))?;

        stream
            .play()
            .map_err(|err| TurnError::Device(format!("failed to start input stream: {err}")))?;
        std::thread::sleep(duration);
        if let Err(err) = stream.pause() {
            log_debug(&format!("failed to pause audio stream: {err}"));
        }
        drop(stream);

        let collected = buffer
            .lock()
            .map_err(|_| TurnError::Device("audio buffer lock poisoned".into()))?
            .clone();
        if collected.is_empty() {
            return Err(TurnError::Device(format!(
                "no samples captured from '{}'; check microphone permissions. {}",
                self.device_name(),
                mic_permission_hint()
            )));
        }
        Ok(adjust_chunk_length(collected, samples))
    }
}

/// Average interleaved frames down to mono, converting samples on the way.
pub(super) fn append_downmixed_samples<T: Copy>(
    buffer: &mut Vec<f32>,
    data: &[T],
    channels: usize,
    convert: impl Fn(T) -> f32,
) {
    if channels <= 1 {
        buffer.extend(data.iter().map(|sample| convert(*sample)));
        return;
    }
    for frame in data.chunks(channels) {
        let sum: f32 = frame.iter().map(|sample| convert(*sample)).sum();
        buffer.push(sum / frame.len() as f32);
    }
}

/// Fix up callback jitter so every chunk has the requested length.
pub(super) fn adjust_chunk_length(mut chunk: Vec<f32>, samples: usize) -> Vec<f32> {
    if chunk.len() > samples {
        chunk.truncate(samples);
    } else if chunk.len() < samples {
        let last = chunk.last().copied().unwrap_or(0.0);
        chunk.resize(samples, last);
    }
    chunk
}

fn mic_permission_hint() -> &'static str {
    #[cfg(target_os = "macos")]
    {
        "macOS: System Settings > Privacy & Security > Microphone (enable your terminal)."
    }
    #[cfg(target_os = "linux")]
    {
        "Linux: check PipeWire/PulseAudio permissions and ensure the device is not muted."
    }
    #[cfg(target_os = "windows")]
    {
        "Windows: Settings > Privacy & Security > Microphone (allow access for your terminal)."
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        "Check OS microphone permissions."
    }
}
