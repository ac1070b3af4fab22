//! Text-to-speech via the platform speech command.
//!
//! Spoken output shells out to `say` on macOS and `espeak` elsewhere, with
//! `--tts-cmd` overriding the whole command line. The call blocks until the
//! utterance finishes, matching the pacing of the reply that follows it.

use crate::config::AppConfig;
use crate::error::TurnError;
use crate::logging::log_debug;
use anyhow::anyhow;
use std::process::Command;

/// Anything that can read a reply aloud.
pub trait Speaker {
    fn speak(&mut self, text: &str) -> Result<(), TurnError>;
}

pub struct TextToSpeech {
    command: Vec<String>,
    rate: u32,
    volume: f32,
    voice: Option<String>,
}

impl TextToSpeech {
    pub fn new(config: &AppConfig) -> Result<Self, TurnError> {
        let command = match &config.tts_cmd {
            Some(raw) => shell_words::split(raw)
                .map_err(|err| TurnError::Other(anyhow!("invalid --tts-cmd: {err}")))?,
            None => vec![default_program().to_string()],
        };
        Ok(Self {
            command,
            rate: config.voice_rate,
            volume: config.voice_volume,
            voice: config.voice_id.clone(),
        })
    }

    pub fn voice(&self) -> Option<&str> {
        self.voice.as_deref()
    }

    pub fn set_voice(&mut self, voice: &str) {
        self.voice = Some(voice.to_string());
    }

    /// Full argv for one utterance. Engine-specific flags are only added for
    /// the commands whose flags we know; a custom command gets the text as
    /// its sole extra argument.
    fn command_line(&self, text: &str) -> Vec<String> {
        let mut argv = self.command.clone();
        match self.command.first().map(String::as_str) {
            Some("say") => {
                argv.push("-r".into());
                argv.push(self.rate.to_string());
                if let Some(voice) = &self.voice {
                    argv.push("-v".into());
                    argv.push(voice.clone());
                }
            }
            Some("espeak") | Some("espeak-ng") => {
                argv.push("-s".into());
                argv.push(self.rate.to_string());
                argv.push("-a".into());
                argv.push(((self.volume * 200.0).round() as u32).to_string());
                if let Some(voice) = &self.voice {
                    argv.push("-v".into());
                    argv.push(voice.clone());
                }
            }
            _ => {}
        }
        argv.push(text.to_string());
        argv
    }

    /// List the voices the underlying engine reports, one per line.
    pub fn list_voices(&self) -> Result<Vec<String>, TurnError> {
        let argv = match self.command.first().map(String::as_str) {
            Some("say") => vec!["say".to_string(), "-v".to_string(), "?".to_string()],
            Some("espeak") | Some("espeak-ng") => vec![
                self.command[0].clone(),
                "--voices".to_string(),
            ],
            Some(other) => {
                return Err(TurnError::Other(anyhow!(
                    "voice listing is not supported for '{other}'"
                )))
            }
            None => return Err(TurnError::Other(anyhow!("empty speech command"))),
        };
        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .output()
            .map_err(|err| TurnError::Other(anyhow!("failed to run '{}': {err}", argv[0])))?;
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .filter(|line| !line.trim().is_empty())
            .collect())
    }
}

impl Speaker for TextToSpeech {
    fn speak(&mut self, text: &str) -> Result<(), TurnError> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let argv = self.command_line(text);
        log_debug(&format!("speak: {}", argv[0]));
        let status = Command::new(&argv[0])
            .args(&argv[1..])
            .status()
            .map_err(|err| TurnError::Other(anyhow!("failed to run '{}': {err}", argv[0])))?;
        if !status.success() {
            return Err(TurnError::Other(anyhow!(
                "'{}' exited with {status}",
                argv[0]
            )));
        }
        Ok(())
    }
}

fn default_program() -> &'static str {
    if cfg!(target_os = "macos") {
        "say"
    } else {
        "espeak"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use clap::Parser;

    fn tts_with(args: &[&str]) -> TextToSpeech {
        let mut argv = vec!["voxchat"];
        argv.extend_from_slice(args);
        let config = AppConfig::parse_from(argv);
        TextToSpeech::new(&config).expect("tts")
    }

    #[test]
    fn default_command_matches_platform() {
        let tts = tts_with(&[]);
        assert_eq!(tts.command, vec![default_program().to_string()]);
    }

    #[test]
    fn override_is_split_like_a_shell() {
        let tts = tts_with(&["--tts-cmd", "festival --tts 'extra arg'"]);
        assert_eq!(tts.command, vec!["festival", "--tts", "extra arg"]);
    }

    #[test]
    fn say_argv_carries_rate_and_voice() {
        let mut tts = tts_with(&["--tts-cmd", "say", "--voice-rate", "180"]);
        tts.set_voice("Samantha");
        let argv = tts.command_line("hello");
        assert_eq!(
            argv,
            vec!["say", "-r", "180", "-v", "Samantha", "hello"]
        );
    }

    #[test]
    fn espeak_argv_scales_volume_to_amplitude() {
        let tts = tts_with(&["--tts-cmd", "espeak", "--voice-volume", "0.5"]);
        let argv = tts.command_line("hi");
        assert_eq!(argv, vec!["espeak", "-s", "150", "-a", "100", "hi"]);
    }

    #[test]
    fn custom_command_gets_text_only() {
        let tts = tts_with(&["--tts-cmd", "festival --tts"]);
        assert_eq!(tts.command_line("x"), vec!["festival", "--tts", "x"]);
    }

    #[test]
    fn blank_text_is_not_spoken() {
        let mut tts = tts_with(&["--tts-cmd", "/definitely/not/a/binary"]);
        // Would fail to spawn if it tried.
        assert!(tts.speak("   ").is_ok());
    }

    #[test]
    fn voice_listing_rejects_unknown_engine() {
        let tts = tts_with(&["--tts-cmd", "festival"]);
        assert!(tts.list_voices().is_err());
    }
}
