//! Streaming chat transport.
//!
//! [`ChatTransport`] is the boundary to the hosted model: given prior context and a new
//! message it yields a lazy, finite stream of text fragments in generation order.
//! [`OpenRouterTransport`] speaks the OpenAI-compatible `chat/completions` SSE protocol.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::{ChatConfig, ChatSettings};
use crate::error::{GridError, GridResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

/// Fragments of one reply. Not restartable.
pub type FragmentStream = Pin<Box<dyn Stream<Item = GridResult<String>> + Send>>;

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn open_stream(&self, context: &[ChatTurn], message: &str) -> GridResult<FragmentStream>;
}

/// Builds a transport on first use. Fails when configuration (the credential) is missing.
pub type TransportFactory = Box<dyn Fn() -> GridResult<Arc<dyn ChatTransport>> + Send + Sync>;

#[derive(Serialize)]
struct StreamRequest<'a> {
    model: &'a str,
    messages: Vec<&'a ChatTurn>,
    stream: bool,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<StreamFailure>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamFailure {
    #[serde(default)]
    message: String,
}

/// OpenRouter (or any OpenAI-compatible endpoint) streaming transport.
pub struct OpenRouterTransport {
    config: ChatConfig,
    client: reqwest::Client,
}

impl OpenRouterTransport {
    pub fn new(config: ChatConfig) -> GridResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { config, client })
    }

    /// Factory resolving [`ChatConfig`] from the environment each time it is invoked.
    pub fn factory(settings: ChatSettings) -> TransportFactory {
        Box::new(move || {
            let config = ChatConfig::from_env(&settings)?;
            tracing::info!(model = %config.model, api_url = %config.api_url, "chat transport configured");
            let transport: Arc<dyn ChatTransport> = Arc::new(OpenRouterTransport::new(config)?);
            Ok(transport)
        })
    }
}

#[async_trait]
impl ChatTransport for OpenRouterTransport {
    async fn open_stream(&self, context: &[ChatTurn], message: &str) -> GridResult<FragmentStream> {
        let user = ChatTurn::new(Role::User, message);
        let body = StreamRequest {
            model: &self.config.model,
            messages: context.iter().chain(std::iter::once(&user)).collect(),
            stream: true,
        };

        let url = format!("{}/chat/completions", self.config.api_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.title)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GridError::Api { status, body });
        }

        Ok(sse_fragments(response.bytes_stream()))
    }
}

/// Incremental Server-Sent Events decoder. Feed raw bytes, get complete `data` payloads.
///
/// Lines may be split anywhere across chunks, including inside a UTF-8 sequence.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);
            self.line(line, &mut events);
        }
        events
    }

    /// Flush whatever is left when the byte stream ends without a trailing blank line.
    pub fn finish(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let raw = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&raw).trim_end_matches('\r').to_string();
            self.line(&line, &mut events);
        }
        if !self.data.is_empty() {
            events.push(self.data.drain(..).collect::<Vec<_>>().join("\n"));
        }
        events
    }

    fn line(&mut self, line: &str, events: &mut Vec<String>) {
        if line.is_empty() {
            if !self.data.is_empty() {
                events.push(self.data.drain(..).collect::<Vec<_>>().join("\n"));
            }
        } else if let Some(value) = line.strip_prefix("data:") {
            self.data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        // Comments (": keep-alive") and other fields are ignored.
    }
}

/// What one SSE payload means for the reply.
#[derive(Debug, PartialEq, Eq)]
enum Payload {
    Fragment(String),
    Skip,
    Done,
    Failed(String),
}

fn parse_payload(payload: &str) -> Payload {
    if payload.trim() == "[DONE]" {
        return Payload::Done;
    }
    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => {
            if let Some(err) = chunk.error {
                return Payload::Failed(err.message);
            }
            match chunk.choices.into_iter().next().and_then(|c| c.delta.content) {
                Some(text) if !text.is_empty() => Payload::Fragment(text),
                _ => Payload::Skip,
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "skipping unparseable stream payload");
            Payload::Skip
        }
    }
}

struct SseState<S> {
    bytes: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<Payload>,
    finished: bool,
}

/// Turn a raw SSE byte stream into reply fragments. Ends at `[DONE]`, at end of input,
/// or after the first error.
pub fn sse_fragments<S, B, E>(bytes: S) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = SseState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    let stream = futures::stream::unfold(state, |mut st| async move {
        loop {
            match st.pending.pop_front() {
                Some(Payload::Fragment(text)) => return Some((Ok(text), st)),
                Some(Payload::Skip) => continue,
                Some(Payload::Done) => return None,
                Some(Payload::Failed(message)) => {
                    st.pending.clear();
                    st.finished = true;
                    return Some((Err(GridError::Stream(message)), st));
                }
                None if st.finished => return None,
                None => {}
            }

            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    let payloads = st.decoder.feed(chunk.as_ref());
                    st.pending.extend(payloads.iter().map(|p| parse_payload(p)));
                }
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(GridError::Stream(e.to_string())), st));
                }
                None => {
                    st.finished = true;
                    let payloads = st.decoder.finish();
                    st.pending.extend(payloads.iter().map(|p| parse_payload(p)));
                }
            }
        }
    });

    Box::pin(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoder_reassembles_split_lines() {
        let mut d = SseDecoder::default();
        assert!(d.feed(b"data: {\"a\":").is_empty());
        assert!(d.feed(b"1}\r\n").is_empty());
        assert_eq!(d.feed(b"\r\n: ping\n\ndata: [DONE]\n\n"), vec!["{\"a\":1}", "[DONE]"]);
    }

    #[test]
    fn decoder_survives_split_utf8() {
        let mut d = SseDecoder::default();
        let bytes = "data: ｱ\n\n".as_bytes();
        let (head, tail) = bytes.split_at(8);
        assert!(d.feed(head).is_empty());
        assert_eq!(d.feed(tail), vec!["ｱ"]);
    }

    #[test]
    fn payloads_map_to_fragments() {
        assert_eq!(
            parse_payload(r#"{"choices":[{"delta":{"content":"Hi"}}]}"#),
            Payload::Fragment("Hi".into())
        );
        assert_eq!(parse_payload(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#), Payload::Skip);
        assert_eq!(parse_payload("[DONE]"), Payload::Done);
        assert_eq!(
            parse_payload(r#"{"error":{"message":"rate limited","code":429}}"#),
            Payload::Failed("rate limited".into())
        );
    }
}
