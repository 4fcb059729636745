//! grid-dashboard-ui: Ratatui front end for the GRID dashboard.
//! Boot splash, glyph rain, tool panels and the GRID AI chat; domain logic lives in grid_core.

pub mod app;
pub mod chat_worker;
pub mod events;
pub mod ui;

pub use app::{App, Field, Phase};
pub use chat_worker::ChatQueue;
pub use events::{AppEvent, ChannelBootSink, ChannelTranscriptSink, ChannelWriter, EventSender};
