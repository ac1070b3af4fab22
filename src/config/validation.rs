use super::AppConfig;
use anyhow::{bail, Result};
use clap::Parser;

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values before any device or network work starts.
    pub fn validate(&mut self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 || self.threshold > 1.0 {
            bail!(
                "--threshold must be between 0.0 and 1.0, got {}",
                self.threshold
            );
        }
        if !(8_000..=96_000).contains(&self.sample_rate) {
            bail!(
                "--sample-rate must be between 8000 and 96000 Hz, got {}",
                self.sample_rate
            );
        }
        if !(50..=2_000).contains(&self.chunk_ms) {
            bail!("--chunk-ms must be between 50 and 2000, got {}", self.chunk_ms);
        }
        if self.pre_buffer_ms > 5_000 {
            bail!(
                "--pre-buffer-ms must be at most 5000, got {}",
                self.pre_buffer_ms
            );
        }
        if self.silence_ms < self.chunk_ms || self.silence_ms > 60_000 {
            bail!(
                "--silence-ms must be between --chunk-ms ({}) and 60000, got {}",
                self.chunk_ms,
                self.silence_ms
            );
        }
        if self.typing_delay_ms > 1_000 {
            bail!(
                "--typing-delay-ms must be at most 1000, got {}",
                self.typing_delay_ms
            );
        }
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            bail!(
                "--temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            );
        }
        if !self.voice_volume.is_finite() || !(0.0..=1.0).contains(&self.voice_volume) {
            bail!(
                "--voice-volume must be between 0.0 and 1.0, got {}",
                self.voice_volume
            );
        }
        if self.model.trim().is_empty() {
            bail!("--model must not be empty");
        }
        if !self.ollama_address.starts_with("http://") && !self.ollama_address.starts_with("https://")
        {
            bail!(
                "--ollama-address must be an http(s) URL, got '{}'",
                self.ollama_address
            );
        }
        if let Some(cmd) = &self.tts_cmd {
            if shell_words::split(cmd)
                .map(|parts| parts.is_empty())
                .unwrap_or(true)
            {
                bail!("--tts-cmd is not a valid command line: '{cmd}'");
            }
        }
        Ok(())
    }
}
