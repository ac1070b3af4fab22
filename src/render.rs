//! Streamed reply rendering.
//!
//! Fragments are typed out character by character behind an `[ollama]:: `
//! prefix, with fenced code colored as it scrolls past. On a voice turn the
//! first non-empty fragment is read aloud before its text appears; speech
//! happens at most once per reply. A stream error aborts rendering where it
//! stands; whatever was already printed stays on screen and the partial
//! reply is discarded by the caller.

use crate::chat::StreamFragment;
use crate::error::TurnError;
use crate::highlight::Highlighter;
use crate::logging::log_debug;
use crate::tts::Speaker;
use anyhow::anyhow;
use std::io::Write;
use std::thread;
use std::time::Duration;

pub const REPLY_PREFIX: &str = "[ollama]:: ";

/// Drain the fragment stream to `out`, returning the complete reply text.
pub fn render_stream(
    fragments: impl Iterator<Item = Result<StreamFragment, TurnError>>,
    out: &mut impl Write,
    mut speaker: Option<&mut dyn Speaker>,
    typing_delay: Duration,
) -> Result<String, TurnError> {
    write(out, REPLY_PREFIX)?;
    let mut reply = String::new();
    let mut highlighter = Highlighter::new();
    for fragment in fragments {
        let fragment = fragment?;
        if fragment.content.is_empty() {
            continue;
        }
        if let Some(active) = speaker.take() {
            // One-shot; a speech failure loses audio, not the reply.
            if let Err(err) = active.speak(&fragment.content) {
                log_debug(&format!("tts failed: {err}"));
            }
        }
        for ch in fragment.content.chars() {
            write(out, &highlighter.style_char(ch))?;
            let _ = out.flush();
            if !typing_delay.is_zero() {
                thread::sleep(typing_delay);
            }
        }
        reply.push_str(&fragment.content);
    }
    write(out, "\n")?;
    Ok(reply)
}

fn write(out: &mut impl Write, text: &str) -> Result<(), TurnError> {
    out.write_all(text.as_bytes())
        .map_err(|err| TurnError::Other(anyhow!("failed to write reply: {err}")))
}
