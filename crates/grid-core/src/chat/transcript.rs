//! Chat transcript: ordered, append-only messages; the latest assistant message is replaced
//! in place while its reply streams in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::markdown::Markup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Operator,
    Assistant,
}

impl Sender {
    pub fn label(self) -> &'static str {
        match self {
            Sender::Operator => "Operator",
            Sender::Assistant => "GRID AI",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Plain(String),
    /// Placeholder shown until the stream opens.
    Typing,
    Markup(Markup),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender: Sender,
    pub body: MessageBody,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(id: MessageId, sender: Sender, body: MessageBody) -> Self {
        Self { id, sender, body, sent_at: Utc::now() }
    }
}

/// One change to a transcript, as carried over the dashboard's event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptUpdate {
    Push(ChatMessage),
    Replace { id: MessageId, body: MessageBody },
}

/// Where the chat client writes. Ids are allocated by the sink.
pub trait TranscriptSink {
    fn push(&mut self, sender: Sender, body: MessageBody) -> MessageId;
    fn replace(&mut self, id: MessageId, body: MessageBody);
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl Transcript {
    pub fn apply(&mut self, update: TranscriptUpdate) {
        match update {
            TranscriptUpdate::Push(message) => {
                self.next_id = self.next_id.max(message.id.0 + 1);
                self.messages.push(message);
            }
            TranscriptUpdate::Replace { id, body } => {
                if let Some(m) = self.messages.iter_mut().rev().find(|m| m.id == id) {
                    m.body = body;
                }
            }
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

impl TranscriptSink for Transcript {
    fn push(&mut self, sender: Sender, body: MessageBody) -> MessageId {
        let id = MessageId(self.next_id);
        self.apply(TranscriptUpdate::Push(ChatMessage::new(id, sender, body)));
        id
    }

    fn replace(&mut self, id: MessageId, body: MessageBody) {
        self.apply(TranscriptUpdate::Replace { id, body });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_targets_only_the_given_message() {
        let mut t = Transcript::default();
        let op = t.push(Sender::Operator, MessageBody::Plain("hi".into()));
        let ai = t.push(Sender::Assistant, MessageBody::Typing);
        t.replace(ai, MessageBody::Error("boom".into()));
        assert_eq!(t.messages()[0].id, op);
        assert_eq!(t.messages()[0].body, MessageBody::Plain("hi".into()));
        assert_eq!(t.messages()[1].body, MessageBody::Error("boom".into()));
    }
}
