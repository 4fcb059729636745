//! grid-core: the GRID dashboard without a screen.
//!
//! Boot sequencer, glyph rain, panel switcher, simulated offsec tools and the streaming chat
//! client. Everything writes through small sink traits so the terminal front end and the
//! tests drive the same code.

mod config;
mod error;
pub mod boot;
pub mod chat;
pub mod markdown;
pub mod panels;
pub mod prompts;
pub mod rain;
pub mod terminal;
pub mod tools;

pub use config::{
    BootSettings, ChatConfig, ChatSettings, CrackSettings, DashboardConfig, PasswordSettings,
    RainSettings, ScanSettings, API_KEY_ENV, API_KEY_FALLBACK_ENV,
};
pub use error::{GridError, GridResult};

pub use boot::{BootEvent, BootSequencer, BootSink, SplashState, BOOT_LINES, READY_STATUS};
pub use chat::{
    ChatClient, ChatMessage, ChatSession, ChatTransport, ChatTurn, FragmentStream, MessageBody,
    MessageId, OpenRouterTransport, Role, SendOutcome, Sender, SessionSlot, StreamingReply,
    Transcript, TranscriptSink, TranscriptUpdate, TransportFactory,
};
pub use markdown::{CmarkRenderer, LineKind, Markup, MarkupLine, MarkupSpan, MarkdownRenderer, SpanStyle};
pub use panels::{Panel, PanelSwitcher, Selection, Tool};
pub use rain::{RainCell, RainField};
pub use terminal::{Fragment, OutputSurface, SurfaceId, Surfaces, TerminalWriter, Tone, WriteMode};
pub use tools::{
    generate_password, parse_ports, CharClass, CrackOutcome, HashCracker, PasswordPolicy,
    PortScanner, PortVerdict, ScanReport, Verdict, HASH_TYPES, KNOWN_DIGEST, KNOWN_PLAINTEXT,
};
