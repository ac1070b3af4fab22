//! Command-line parsing and validation helpers.

mod validation;

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_THRESHOLD: f32 = 0.1;
pub const DEFAULT_SILENCE_MS: u64 = 1_500;
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
pub const DEFAULT_CHUNK_MS: u64 = 300;
pub const DEFAULT_PRE_BUFFER_MS: u64 = 500;
pub const DEFAULT_TYPING_DELAY_MS: u64 = 10;

/// CLI options for the voxchat REPL. Validated values keep the capture and
/// chat pipeline within sane bounds before any hardware is touched.
#[derive(Debug, Parser, Clone)]
#[command(about = "voxchat - voice-driven Ollama chat", author, version)]
pub struct AppConfig {
    /// Ollama chat completion endpoint
    #[arg(
        long = "ollama-address",
        env = "VOXCHAT_OLLAMA_ADDRESS",
        default_value = "http://localhost:11434/api/chat"
    )]
    pub ollama_address: String,

    /// Path to the `ollama` CLI used for the startup model check
    #[arg(long = "ollama-cmd", default_value = "ollama")]
    pub ollama_cmd: String,

    /// Model name requested from Ollama
    #[arg(long, env = "VOXCHAT_MODEL", default_value = "llama3.2")]
    pub model: String,

    /// Sampling temperature passed to the model
    #[arg(long, default_value_t = 0.7)]
    pub temperature: f32,

    /// Sampling seed passed to the model
    #[arg(long, default_value_t = 42)]
    pub seed: i64,

    /// Delay between printed characters (milliseconds)
    #[arg(long = "typing-delay-ms", default_value_t = DEFAULT_TYPING_DELAY_MS)]
    pub typing_delay_ms: u64,

    /// Mean-amplitude floor below which a chunk counts as silence
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f32,

    /// Sustained silence that ends a capture (milliseconds)
    #[arg(long = "silence-ms", default_value_t = DEFAULT_SILENCE_MS)]
    pub silence_ms: u64,

    /// Capture sample rate (Hz)
    #[arg(long = "sample-rate", default_value_t = DEFAULT_SAMPLE_RATE)]
    pub sample_rate: u32,

    /// Duration of each capture chunk (milliseconds)
    #[arg(long = "chunk-ms", default_value_t = DEFAULT_CHUNK_MS)]
    pub chunk_ms: u64,

    /// Lead-in captured before silence detection starts (milliseconds)
    #[arg(long = "pre-buffer-ms", default_value_t = DEFAULT_PRE_BUFFER_MS)]
    pub pre_buffer_ms: u64,

    /// Vosk model directory
    #[arg(
        long = "vosk-model",
        env = "VOXCHAT_VOSK_MODEL",
        default_value = "models/vosk-model-small-en-us-0.15"
    )]
    pub vosk_model: PathBuf,

    /// Preferred audio input device name
    #[arg(long)]
    pub input_device: Option<String>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// Speech rate for text-to-speech (words per minute)
    #[arg(long = "voice-rate", default_value_t = 150)]
    pub voice_rate: u32,

    /// Speech volume for text-to-speech (0.0 to 1.0)
    #[arg(long = "voice-volume", default_value_t = 1.0)]
    pub voice_volume: f32,

    /// Voice identifier passed to the speech command
    #[arg(long = "voice-id")]
    pub voice_id: Option<String>,

    /// Override the text-to-speech command line (parsed shell-style)
    #[arg(long = "tts-cmd", env = "VOXCHAT_TTS_CMD")]
    pub tts_cmd: Option<String>,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "VOXCHAT_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs)
    #[arg(long = "no-logs", default_value_t = false)]
    pub no_logs: bool,
}

impl AppConfig {
    pub fn chunk_duration(&self) -> Duration {
        Duration::from_millis(self.chunk_ms)
    }

    pub fn pre_buffer_duration(&self) -> Duration {
        Duration::from_millis(self.pre_buffer_ms)
    }

    pub fn silence_duration(&self) -> Duration {
        Duration::from_millis(self.silence_ms)
    }

    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_delay_ms)
    }

    /// Capture settings handed to the audio engine.
    pub fn capture_config(&self) -> crate::audio::CaptureConfig {
        crate::audio::CaptureConfig {
            threshold: self.threshold,
            silence_duration: self.silence_duration(),
            sample_rate: self.sample_rate,
            chunk_duration: self.chunk_duration(),
            pre_buffer_duration: self.pre_buffer_duration(),
        }
    }
}
