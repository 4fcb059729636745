//! GRID AI assistant: lazily created session, streaming replies, transcript updates.

pub mod client;
pub mod session;
pub mod transcript;
pub mod transport;

pub use client::{ChatClient, SendOutcome, StreamingReply};
pub use session::{ChatSession, SessionSlot};
pub use transcript::{ChatMessage, MessageBody, MessageId, Sender, Transcript, TranscriptSink, TranscriptUpdate};
pub use transport::{
    sse_fragments, ChatTransport, ChatTurn, FragmentStream, OpenRouterTransport, Role, SseDecoder,
    TransportFactory,
};
