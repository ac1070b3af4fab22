//! Ollama chat completion client.
//!
//! Posts the conversation with `stream: true` and iterates the
//! newline-delimited JSON reply. Both response shapes the API emits
//! (`message` and `response` keyed) are normalized into one
//! [`StreamFragment`] before anything downstream sees them. A line that does
//! not parse is fatal for the turn; nothing after it is consumed.

use crate::config::AppConfig;
use crate::error::TurnError;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatOptions {
    seed: i64,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

/// One normalized increment of the streamed reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamFragment {
    pub content: String,
    pub done: bool,
}

#[derive(Deserialize, Default)]
struct RawFragment {
    #[serde(default)]
    content: String,
    #[serde(default)]
    done: bool,
}

#[derive(Deserialize)]
struct RawLine {
    message: Option<RawFragment>,
    response: Option<RawFragment>,
}

/// Decode one stream line into the normalized fragment shape.
pub fn decode_line(line: &str) -> Result<StreamFragment, TurnError> {
    let raw: RawLine = serde_json::from_str(line)
        .map_err(|err| TurnError::MalformedStream(format!("{err} in line '{line}'")))?;
    let fragment = raw.message.or(raw.response).unwrap_or_default();
    Ok(StreamFragment {
        content: fragment.content,
        done: fragment.done,
    })
}

/// Blocking HTTP client for the chat endpoint.
pub struct ChatClient {
    agent: ureq::Agent,
    address: String,
    model: String,
    seed: i64,
    temperature: f32,
}

impl ChatClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            address: config.ollama_address.clone(),
            model: config.model.clone(),
            seed: config.seed,
            temperature: config.temperature,
        }
    }

    /// Send the conversation and return the fragment stream. The request
    /// itself failing (connection refused, HTTP error status) aborts the
    /// turn before any rendering starts.
    pub fn stream_chat(
        &self,
        messages: &[ChatMessage],
    ) -> Result<ChatStream<impl BufRead>, TurnError> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            stream: true,
            options: ChatOptions {
                seed: self.seed,
                temperature: self.temperature,
            },
        };
        let response = self
            .agent
            .post(&self.address)
            .send_json(&body)
            .map_err(|err| TurnError::Other(anyhow!("chat request failed: {err}")))?;
        Ok(ChatStream::new(BufReader::new(
            response.into_body().into_reader(),
        )))
    }
}

/// Iterator over normalized fragments of one streamed reply.
///
/// Ends after the first fragment with `done`, on body exhaustion, or on the
/// first malformed line, whichever comes first.
pub struct ChatStream<R: BufRead> {
    reader: R,
    finished: bool,
}

impl<R: BufRead> ChatStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            finished: false,
        }
    }
}

impl<R: BufRead> Iterator for ChatStream<R> {
    type Item = Result<StreamFragment, TurnError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    self.finished = true;
                    return None;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return match decode_line(trimmed) {
                        Ok(fragment) => {
                            if fragment.done {
                                self.finished = true;
                            }
                            Some(Ok(fragment))
                        }
                        Err(err) => {
                            self.finished = true;
                            Some(Err(err))
                        }
                    };
                }
                Err(err) => {
                    self.finished = true;
                    return Some(Err(TurnError::Other(anyhow!(
                        "chat stream read failed: {err}"
                    ))));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn decodes_message_shape() {
        let fragment = decode_line(r#"{"message":{"content":"Hi","done":false}}"#).unwrap();
        assert_eq!(fragment, StreamFragment { content: "Hi".into(), done: false });
    }

    #[test]
    fn decodes_response_shape() {
        let fragment = decode_line(r#"{"response":{"content":" there","done":true}}"#).unwrap();
        assert_eq!(fragment.content, " there");
        assert!(fragment.done);
    }

    #[test]
    fn message_shape_wins_when_both_present() {
        let fragment = decode_line(
            r#"{"message":{"content":"a"},"response":{"content":"b","done":true}}"#,
        )
        .unwrap();
        assert_eq!(fragment.content, "a");
        assert!(!fragment.done);
    }

    #[test]
    fn missing_fields_default_to_empty_and_not_done() {
        let fragment = decode_line(r#"{"message":{}}"#).unwrap();
        assert_eq!(fragment, StreamFragment::default());
        let fragment = decode_line(r#"{"model":"llama3.2"}"#).unwrap();
        assert_eq!(fragment, StreamFragment::default());
    }

    #[test]
    fn malformed_line_is_malformed_stream_error() {
        let err = decode_line(r#"{"message":"#).unwrap_err();
        assert!(matches!(err, TurnError::MalformedStream(_)));
    }

    #[test]
    fn stream_yields_fragments_until_done() {
        let body = concat!(
            r#"{"message":{"content":"Hi","done":false}}"#,
            "\n",
            r#"{"message":{"content":" there","done":true}}"#,
            "\n",
            r#"{"message":{"content":"IGNORED","done":false}}"#,
            "\n",
        );
        let mut stream = ChatStream::new(Cursor::new(body));
        assert_eq!(stream.next().unwrap().unwrap().content, "Hi");
        let last = stream.next().unwrap().unwrap();
        assert_eq!(last.content, " there");
        assert!(last.done);
        // Terminates after the done fragment; later lines are not consumed.
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
    }

    #[test]
    fn stream_ends_on_body_exhaustion() {
        let body = r#"{"message":{"content":"only","done":false}}"#;
        let mut stream = ChatStream::new(Cursor::new(body));
        assert_eq!(stream.next().unwrap().unwrap().content, "only");
        assert!(stream.next().is_none());
    }

    #[test]
    fn malformed_line_mid_stream_is_fatal() {
        let body = concat!(
            r#"{"message":{"content":"ok","done":false}}"#,
            "\n",
            r#"{"message":"#,
            "\n",
            r#"{"message":{"content":"never seen","done":true}}"#,
            "\n",
        );
        let mut stream = ChatStream::new(Cursor::new(body));
        assert!(stream.next().unwrap().is_ok());
        let err = stream.next().unwrap().unwrap_err();
        assert!(matches!(err, TurnError::MalformedStream(_)));
        assert!(stream.next().is_none());
    }

    #[test]
    fn blank_lines_are_skipped() {
        let body = "\n\n{\"message\":{\"content\":\"x\",\"done\":true}}\n";
        let mut stream = ChatStream::new(Cursor::new(body));
        assert_eq!(stream.next().unwrap().unwrap().content, "x");
    }

    #[test]
    fn request_body_serializes_expected_shape() {
        let messages = vec![ChatMessage::user("hello")];
        let body = ChatRequest {
            model: "llama3.2",
            messages: &messages,
            stream: true,
            options: ChatOptions {
                seed: 42,
                temperature: 0.7,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "llama3.2");
        assert_eq!(value["stream"], true);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["options"]["seed"], 42);
    }
}
