//! Chat client: validates input, owns the session slot, drives one reply stream at a time and
//! re-renders the accumulated reply on every fragment.

use futures::StreamExt;

use super::session::SessionSlot;
use super::transcript::{MessageBody, Sender, TranscriptSink};
use super::transport::TransportFactory;
use crate::markdown::{CmarkRenderer, Markup, MarkdownRenderer};
use crate::prompts::GRID_SYSTEM_INSTRUCTION;

/// How a send ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Empty or whitespace-only input; nothing happened.
    Ignored,
    /// The session could not be created (missing credential).
    InitFailed,
    Completed { reply: String },
    /// The stream failed to open or broke mid-way; the error replaced the reply.
    Failed,
}

/// Accumulates fragments and renders the full buffer each time.
pub struct StreamingReply<'r, R: ?Sized> {
    renderer: &'r R,
    buffer: String,
}

impl<'r, R: MarkdownRenderer + ?Sized> StreamingReply<'r, R> {
    pub fn new(renderer: &'r R) -> Self {
        Self { renderer, buffer: String::new() }
    }

    /// Append a fragment and return the rendering of everything received so far.
    pub fn push(&mut self, fragment: &str) -> Markup {
        self.buffer.push_str(fragment);
        self.renderer.render(&self.buffer)
    }

    pub fn into_buffer(self) -> String {
        self.buffer
    }
}

/// Sends are `&mut self`: whoever owns the client gets them one after another.
pub struct ChatClient<R = CmarkRenderer> {
    slot: SessionSlot,
    renderer: R,
}

impl ChatClient<CmarkRenderer> {
    pub fn new(factory: TransportFactory) -> Self {
        Self::with_renderer(factory, CmarkRenderer)
    }
}

impl<R: MarkdownRenderer> ChatClient<R> {
    pub fn with_renderer(factory: TransportFactory, renderer: R) -> Self {
        Self {
            slot: SessionSlot::new(factory, GRID_SYSTEM_INSTRUCTION),
            renderer,
        }
    }

    pub fn has_session(&self) -> bool {
        self.slot.is_initialized()
    }

    pub fn slot(&self) -> &SessionSlot {
        &self.slot
    }

    pub async fn send<S>(&mut self, input: &str, sink: &mut S) -> SendOutcome
    where
        S: TranscriptSink + Send,
    {
        let message = input.trim();
        if message.is_empty() {
            return SendOutcome::Ignored;
        }

        let session = match self.slot.get_or_try_init() {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "chat session unavailable");
                sink.push(Sender::Assistant, MessageBody::Error(e.to_string()));
                return SendOutcome::InitFailed;
            }
        };

        sink.push(Sender::Operator, MessageBody::Plain(message.to_string()));
        let reply_id = sink.push(Sender::Assistant, MessageBody::Typing);

        let mut stream = match session.open_stream(message).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(error = %e, "chat stream failed to open");
                sink.replace(reply_id, MessageBody::Error(error_notice(&e)));
                return SendOutcome::Failed;
            }
        };

        let mut reply = StreamingReply::new(&self.renderer);
        sink.replace(reply_id, MessageBody::Markup(Markup::default()));
        while let Some(item) = stream.next().await {
            match item {
                Ok(fragment) => {
                    tracing::debug!(bytes = fragment.len(), "chat fragment");
                    let markup = reply.push(&fragment);
                    sink.replace(reply_id, MessageBody::Markup(markup));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "chat stream broke");
                    sink.replace(reply_id, MessageBody::Error(error_notice(&e)));
                    return SendOutcome::Failed;
                }
            }
        }

        let reply = reply.into_buffer();
        session.record_exchange(message, &reply);
        SendOutcome::Completed { reply }
    }
}

fn error_notice(err: &crate::error::GridError) -> String {
    format!("Sorry, an error occurred: {}", err)
}
