//! voxchat entrypoint: a voice-capable chat REPL against a local Ollama.
//!
//! Every turn is typed or spoken. A spoken turn runs capture, silence
//! endpointing, and transcription before it joins the conversation exactly
//! like a typed one; the reply then streams back with a typing effect and,
//! for spoken turns, is read aloud once. Errors are fatal for their turn
//! only; the conversation history survives them.

use anyhow::{anyhow, Context, Result};
use crossterm::{cursor, execute, terminal};
use std::io::{self, BufRead, Write};
use std::process::Command;

use voxchat::audio::{CpalChunkSource, Recording};
use voxchat::chat::ChatClient;
use voxchat::config::AppConfig;
use voxchat::error::TurnError;
use voxchat::indicator::Indicator;
use voxchat::render::render_stream;
use voxchat::session::Session;
use voxchat::stt::Transcriber;
use voxchat::tts::{Speaker, TextToSpeech};
use voxchat::{init_logging, log_debug};

const APP_NAME: &str = "voxchat";
const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "
Available commands:
- /voice: Start voice assistant
- /voice list: List all available voices
- /voice set <id>: Sets the voice by ID
- /help: Show this help message
- /clear: Clear the console
- /exit: End the conversation
";

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;
    init_logging(&config);

    if config.list_input_devices {
        for name in CpalChunkSource::list_devices().map_err(|err| anyhow!("{err}"))? {
            println!("{name}");
        }
        return Ok(());
    }

    clear_console();

    let models = installed_models(&config.ollama_cmd)?;
    if !models.iter().any(|name| name == &config.model) {
        println!(
            "{APP_NAME}\nWarning: The specified model '{}' is not available.",
            config.model
        );
        return Ok(());
    }

    let mut tts = TextToSpeech::new(&config).map_err(|err| anyhow!("{err}"))?;
    println!(
        "{APP_NAME} {VERSION} [Ollama:{}] [Vosk:{}] [TTS:{}]",
        config.model,
        config
            .vosk_model
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| config.vosk_model.display().to_string()),
        tts.voice().unwrap_or("default"),
    );
    println!("Type '/help' for a list of commands");
    println!("{HELP_TEXT}");

    let client = ChatClient::new(&config);
    let mut session = Session::new();
    // The speech model is a large directory load; defer it until the first
    // spoken turn so text-only use never pays for it.
    let mut transcriber: Option<Transcriber> = None;

    let stdin = io::stdin();
    loop {
        print!("[you]:: ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let mut input = line.trim().to_string();
        let lowered = input.to_lowercase();

        if lowered == "/voice" {
            match voice_turn(&config, &mut transcriber) {
                Ok(transcript) if !transcript.is_empty() => {
                    session.mark_voice();
                    input = transcript;
                }
                Ok(_) => {
                    println!("[voice]:: (nothing recognized)");
                    continue;
                }
                Err(err) => {
                    report(&err);
                    continue;
                }
            }
        } else if lowered == "/voice list" {
            match tts.list_voices() {
                Ok(voices) => {
                    println!("Available voices:");
                    for voice in voices {
                        println!("{voice}");
                    }
                }
                Err(err) => report(&err),
            }
            continue;
        } else if lowered.starts_with("/voice set ") {
            tts.set_voice(input["/voice set ".len()..].trim());
            continue;
        } else if lowered == "/help" {
            println!("{HELP_TEXT}");
            continue;
        } else if lowered == "/clear" {
            clear_console();
            continue;
        } else if lowered == "/exit" {
            break;
        } else if input.is_empty() {
            continue;
        }

        chat_turn(&config, &client, &mut session, &mut tts, &input);
    }

    println!("Ending the chat.");
    Ok(())
}

/// Capture one utterance from the microphone and return its transcript.
fn voice_turn(
    config: &AppConfig,
    transcriber: &mut Option<Transcriber>,
) -> Result<String, TurnError> {
    let loaded = match transcriber {
        Some(loaded) => loaded,
        None => transcriber.insert(Transcriber::new(&config.vosk_model)?),
    };

    let mut indicator = Indicator::start("Recording ...");
    let result = (|| {
        let mut source = CpalChunkSource::new(config.input_device.as_deref(), config.sample_rate)?;
        log_debug(&format!("recording from '{}'", source.device_name()));
        let clip = Recording::new(config.capture_config()).run(&mut source)?;
        loaded.transcribe(&clip)
    })();
    indicator.stop();

    let transcript = result?;
    println!("[voice]:: {transcript}");
    Ok(transcript)
}

/// Run one request/reply exchange. Failures are reported and the user
/// message is retracted so the history never carries an unanswered turn.
fn chat_turn(
    config: &AppConfig,
    client: &ChatClient,
    session: &mut Session,
    tts: &mut TextToSpeech,
    input: &str,
) {
    session.push_user(input);
    let mut indicator = Indicator::start("Generating ...");
    let stream = client.stream_chat(session.messages());
    indicator.stop();

    let fragments = match stream {
        Ok(fragments) => fragments,
        Err(err) => {
            session.retract_user();
            report(&err);
            return;
        }
    };

    let speaker: Option<&mut dyn Speaker> = if session.take_voice() {
        Some(tts)
    } else {
        None
    };
    let mut stdout = io::stdout();
    match render_stream(fragments, &mut stdout, speaker, config.typing_delay()) {
        Ok(reply) if !reply.is_empty() => session.push_assistant(&reply),
        Ok(_) => {
            session.retract_user();
            println!("Couldn't process it.");
        }
        Err(err) => {
            session.retract_user();
            println!();
            report(&err);
        }
    }
}

/// First column of every `ollama list` output line, header included.
fn installed_models(ollama_cmd: &str) -> Result<Vec<String>> {
    let output = Command::new(ollama_cmd)
        .arg("list")
        .output()
        .with_context(|| format!("failed to run '{ollama_cmd} list'"))?;
    if !output.status.success() {
        anyhow::bail!("'{ollama_cmd} list' exited with {}", output.status);
    }
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|line| line.split_whitespace().next().map(str::to_string))
        .collect())
}

fn report(err: &TurnError) {
    log_debug(&format!("turn failed ({}): {err}", err.label()));
    println!("{err}");
}

fn clear_console() {
    let _ = execute!(
        io::stdout(),
        terminal::Clear(terminal::ClearType::All),
        cursor::MoveTo(0, 0)
    );
}
