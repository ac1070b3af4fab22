//! Vosk speech-to-text integration.
//!
//! The model directory is loaded once and reused across captures. Each
//! capture is replayed through a streaming recognizer in fixed-size byte
//! chunks; finalized segments are accumulated into one transcript.

use crate::audio::AudioClip;
use crate::error::TurnError;
use crate::logging::log_debug;
use std::path::Path;
use vosk::{DecodingState, Model, Recognizer};

/// Byte size of each waveform chunk fed to the recognizer. Boundaries need
/// not align with samples or phonemes; the recognizer buffers internally.
const CHUNK_BYTES: usize = 4_000;

/// Streaming recognizer boundary.
///
/// `accept_waveform` consumes one chunk of little-endian 16-bit PCM bytes and
/// returns the finalized utterance text when the engine decided an utterance
/// ended inside that chunk. `finalize` flushes whatever is still buffered.
/// Any engine failure is fatal for the turn; no partial transcript survives.
pub trait SpeechEngine {
    fn accept_waveform(&mut self, chunk: &[u8]) -> Result<Option<String>, TurnError>;
    fn finalize(&mut self) -> Result<String, TurnError>;
}

/// Feed the whole byte buffer through the engine sequentially, completely,
/// and without overlap, collecting finalized segments in feed order.
pub fn feed_chunks(engine: &mut dyn SpeechEngine, bytes: &[u8]) -> Result<String, TurnError> {
    let mut transcript = String::new();
    for chunk in bytes.chunks(CHUNK_BYTES) {
        if let Some(segment) = engine.accept_waveform(chunk)? {
            transcript.push_str(&segment);
            transcript.push(' ');
        }
    }
    transcript.push_str(&engine.finalize()?);
    Ok(transcript.trim().to_string())
}

/// Loaded Vosk model. Create once at startup and reuse for every capture.
pub struct Transcriber {
    model: Model,
}

impl Transcriber {
    /// Load the model directory, quieting Vosk's default console output.
    pub fn new(model_path: &Path) -> Result<Self, TurnError> {
        vosk::set_log_level(vosk::LogLevel::Error);
        let model = Model::new(model_path.to_string_lossy()).ok_or_else(|| {
            TurnError::ModelLoad {
                path: model_path.display().to_string(),
            }
        })?;
        Ok(Self { model })
    }

    /// Convert a finished capture to text. Blocking and CPU-bound.
    pub fn transcribe(&self, clip: &AudioClip) -> Result<String, TurnError> {
        let mut engine = VoskEngine::new(&self.model, clip.sample_rate)?;
        let bytes = clip.to_le_bytes();
        log_debug(&format!(
            "transcribe: {} bytes at {} Hz",
            bytes.len(),
            clip.sample_rate
        ));
        feed_chunks(&mut engine, &bytes)
    }
}

struct VoskEngine {
    recognizer: Recognizer,
}

impl VoskEngine {
    fn new(model: &Model, sample_rate: u32) -> Result<Self, TurnError> {
        let recognizer = Recognizer::new(model, sample_rate as f32).ok_or_else(|| {
            TurnError::Recognizer("failed to construct recognizer".into())
        })?;
        Ok(Self { recognizer })
    }

    fn pcm(chunk: &[u8]) -> Vec<i16> {
        chunk
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    }
}

impl SpeechEngine for VoskEngine {
    fn accept_waveform(&mut self, chunk: &[u8]) -> Result<Option<String>, TurnError> {
        let pcm = Self::pcm(chunk);
        match self.recognizer.accept_waveform(&pcm) {
            Ok(DecodingState::Finalized) => {
                let text = self
                    .recognizer
                    .result()
                    .single()
                    .map(|utterance| utterance.text.to_string())
                    .ok_or_else(|| {
                        TurnError::Recognizer("recognizer produced no finalized result".into())
                    })?;
                Ok(Some(text))
            }
            Ok(DecodingState::Failed) => Err(TurnError::Recognizer(
                "recognizer failed to decode waveform".into(),
            )),
            Ok(_) => Ok(None),
            Err(err) => Err(TurnError::Recognizer(format!(
                "recognizer rejected waveform: {err}"
            ))),
        }
    }

    fn finalize(&mut self) -> Result<String, TurnError> {
        self.recognizer
            .final_result()
            .single()
            .map(|utterance| utterance.text.to_string())
            .ok_or_else(|| TurnError::Recognizer("recognizer produced no final result".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Engine that records every fed chunk and finalizes scripted segments
    /// at scripted chunk indices.
    struct MockEngine {
        fed: Vec<Vec<u8>>,
        segments: Vec<(usize, String)>,
        final_text: String,
        fail_at: Option<usize>,
    }

    impl MockEngine {
        fn new(segments: &[(usize, &str)], final_text: &str) -> Self {
            Self {
                fed: Vec::new(),
                segments: segments
                    .iter()
                    .map(|(i, text)| (*i, text.to_string()))
                    .collect(),
                final_text: final_text.to_string(),
                fail_at: None,
            }
        }
    }

    impl SpeechEngine for MockEngine {
        fn accept_waveform(&mut self, chunk: &[u8]) -> Result<Option<String>, TurnError> {
            let index = self.fed.len();
            if self.fail_at == Some(index) {
                return Err(TurnError::Recognizer("mock decode failure".into()));
            }
            self.fed.push(chunk.to_vec());
            Ok(self
                .segments
                .iter()
                .find(|(at, _)| *at == index)
                .map(|(_, text)| text.clone()))
        }

        fn finalize(&mut self) -> Result<String, TurnError> {
            Ok(self.final_text.clone())
        }
    }

    #[test]
    fn feed_is_order_preserving_and_complete() {
        let bytes: Vec<u8> = (0..10_240u32).map(|i| (i % 251) as u8).collect();
        let mut engine = MockEngine::new(&[], "");
        feed_chunks(&mut engine, &bytes).expect("feed");

        // Every chunk except the last is exactly CHUNK_BYTES; concatenating
        // them in order reproduces the buffer with no byte fed twice.
        assert_eq!(engine.fed.len(), 3);
        assert!(engine.fed[..2].iter().all(|c| c.len() == 4_000));
        let rejoined: Vec<u8> = engine.fed.concat();
        assert_eq!(rejoined, bytes);
    }

    #[test]
    fn segments_join_in_feed_order_with_final_result() {
        let bytes = vec![0u8; 12_000];
        let mut engine = MockEngine::new(&[(0, "hello"), (2, "world")], "again");
        let transcript = feed_chunks(&mut engine, &bytes).expect("feed");
        assert_eq!(transcript, "hello world again");
    }

    #[test]
    fn transcript_is_trimmed() {
        let bytes = vec![0u8; 4_000];
        let mut engine = MockEngine::new(&[(0, "  hi")], "");
        assert_eq!(feed_chunks(&mut engine, &bytes).unwrap(), "hi");
    }

    #[test]
    fn empty_buffer_yields_only_final_text() {
        let mut engine = MockEngine::new(&[], "just the tail");
        assert_eq!(feed_chunks(&mut engine, &[]).unwrap(), "just the tail");
    }

    #[test]
    fn engine_failure_drops_transcript_and_stops_feeding() {
        let bytes = vec![0u8; 16_000];
        let mut engine = MockEngine::new(&[(0, "kept nowhere")], "tail");
        engine.fail_at = Some(2);
        let err = feed_chunks(&mut engine, &bytes).expect_err("should fail");
        assert!(matches!(err, TurnError::Recognizer(_)));
        // Nothing past the failing chunk was delivered.
        assert_eq!(engine.fed.len(), 2);
    }

    #[test]
    fn transcriber_rejects_missing_model() {
        let result = Transcriber::new(Path::new("/no/such/model"));
        assert!(matches!(result, Err(TurnError::ModelLoad { .. })));
    }
}
