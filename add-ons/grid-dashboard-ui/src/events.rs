//! Event channel between background tasks and the UI loop.
//!
//! Boot, tool and chat tasks never touch UI state. They write through the sinks below, which
//! forward everything as [`AppEvent`]s to the loop in `main`.

use grid_core::{
    BootEvent, BootSink, ChatMessage, Fragment, MessageBody, MessageId, Sender, SurfaceId,
    TerminalWriter, Tool, TranscriptSink, TranscriptUpdate, WriteMode,
};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Boot(BootEvent),
    Output {
        surface: SurfaceId,
        fragments: Vec<Fragment>,
        mode: WriteMode,
    },
    Transcript(TranscriptUpdate),
    /// The chat worker finished one queued message. `unsent` carries the message back when
    /// no session could be created, so the operator's text is not lost.
    ChatSettled { unsent: Option<String> },
    /// A background tool run ended.
    ToolFinished(Tool),
}

pub type EventSender = UnboundedSender<AppEvent>;

pub(crate) fn forward(tx: &EventSender, event: AppEvent) {
    if tx.send(event).is_err() {
        tracing::debug!("ui loop gone, dropping event");
    }
}

/// [`TerminalWriter`] that forwards writes to the UI.
#[derive(Clone)]
pub struct ChannelWriter {
    tx: EventSender,
}

impl ChannelWriter {
    pub fn new(tx: EventSender) -> Self {
        Self { tx }
    }
}

impl TerminalWriter for ChannelWriter {
    fn write(&mut self, surface: SurfaceId, fragments: Vec<Fragment>, mode: WriteMode) {
        forward(&self.tx, AppEvent::Output { surface, fragments, mode });
    }
}

pub struct ChannelBootSink {
    tx: EventSender,
}

impl ChannelBootSink {
    pub fn new(tx: EventSender) -> Self {
        Self { tx }
    }
}

impl BootSink for ChannelBootSink {
    fn emit(&mut self, event: BootEvent) {
        forward(&self.tx, AppEvent::Boot(event));
    }
}

/// [`TranscriptSink`] owned by the chat worker. It allocates message ids itself; the UI
/// transcript only ever receives them.
pub struct ChannelTranscriptSink {
    tx: EventSender,
    next_id: u64,
}

impl ChannelTranscriptSink {
    pub fn new(tx: EventSender) -> Self {
        Self { tx, next_id: 0 }
    }
}

impl TranscriptSink for ChannelTranscriptSink {
    fn push(&mut self, sender: Sender, body: MessageBody) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        forward(&self.tx, AppEvent::Transcript(TranscriptUpdate::Push(ChatMessage::new(id, sender, body))));
        id
    }

    fn replace(&mut self, id: MessageId, body: MessageBody) {
        forward(&self.tx, AppEvent::Transcript(TranscriptUpdate::Replace { id, body }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn transcript_sink_allocates_increasing_ids() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sink = ChannelTranscriptSink::new(tx);
        let a = sink.push(Sender::Operator, MessageBody::Plain("hi".into()));
        let b = sink.push(Sender::Assistant, MessageBody::Typing);
        sink.replace(b, MessageBody::Error("x".into()));
        assert!(a < b);

        let mut seen = Vec::new();
        while let Ok(AppEvent::Transcript(update)) = rx.try_recv() {
            seen.push(update);
        }
        assert_eq!(seen.len(), 3);
        assert!(matches!(&seen[2], TranscriptUpdate::Replace { id, .. } if *id == b));
    }

    #[test]
    fn writer_survives_closed_channel() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut writer = ChannelWriter::new(tx);
        writer.append(SurfaceId::PortScan, "late");
    }

    #[test]
    fn forward_drops_events_once_the_ui_is_gone() {
        let (tx, rx) = mpsc::unbounded_channel();
        forward(&tx, AppEvent::ToolFinished(Tool::PortScanner));
        drop(rx);
        forward(&tx, AppEvent::ToolFinished(Tool::HashCracker));
    }
}
