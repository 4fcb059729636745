//! Boot sequencer: types a scripted list of lines, reports progress, then hands over to the
//! main view after a ready pause and a fade-out.
//!
//! The sequencer only emits [`BootEvent`]s. [`SplashState`] folds them into what the splash
//! screen shows.

use rand::Rng;
use std::time::Duration;

use crate::config::BootSettings;

pub const BOOT_LINES: [&str; 6] = [
    "> Booting up H4CK3R-OS v1.3.3.7...",
    "> Initializing kernel...",
    "> Loading modules... [OK]",
    "> Calibrating neural interface... [DONE]",
    "> Establishing secure connection to The Grid...",
    "> Welcome, Operator.",
];

pub const READY_STATUS: &str = "System ready. Launching dashboard...";

#[derive(Debug, Clone, PartialEq)]
pub enum BootEvent {
    LineStarted { index: usize },
    Char { index: usize, ch: char },
    /// `progress` is `(index + 1) / line_count`.
    LineFinished { index: usize, progress: f32 },
    Ready { status: String },
    FadeStarted { duration: Duration },
    Finished,
}

pub trait BootSink {
    fn emit(&mut self, event: BootEvent);
}

impl BootSink for Vec<BootEvent> {
    fn emit(&mut self, event: BootEvent) {
        self.push(event);
    }
}

pub struct BootSequencer<R> {
    lines: Vec<String>,
    settings: BootSettings,
    rng: R,
}

impl<R: Rng + Send> BootSequencer<R> {
    pub fn new(settings: BootSettings, rng: R) -> Self {
        Self::with_lines(BOOT_LINES.iter().map(|l| l.to_string()).collect(), settings, rng)
    }

    pub fn with_lines(lines: Vec<String>, settings: BootSettings, rng: R) -> Self {
        Self { lines, settings, rng }
    }

    /// Play the whole script. There is no way to stop it part-way.
    pub async fn run<S: BootSink + Send>(mut self, sink: &mut S) {
        let total = self.lines.len().max(1) as f32;
        let lines = std::mem::take(&mut self.lines);

        for (index, line) in lines.iter().enumerate() {
            sink.emit(BootEvent::LineStarted { index });
            for ch in line.chars() {
                tokio::time::sleep(self.settings.char_delay()).await;
                sink.emit(BootEvent::Char { index, ch });
            }
            tokio::time::sleep(self.next_pause()).await;
            sink.emit(BootEvent::LineFinished { index, progress: (index + 1) as f32 / total });
        }

        sink.emit(BootEvent::Ready { status: READY_STATUS.to_string() });
        tokio::time::sleep(Duration::from_millis(self.settings.ready_delay_ms)).await;

        let fade = Duration::from_millis(self.settings.fade_ms);
        sink.emit(BootEvent::FadeStarted { duration: fade });
        tokio::time::sleep(fade).await;
        sink.emit(BootEvent::Finished);
        tracing::info!(lines = lines.len(), "boot sequence finished");
    }

    fn next_pause(&mut self) -> Duration {
        let (min, max) = (self.settings.pause_min_ms, self.settings.pause_max_ms);
        let ms = if max > min { self.rng.gen_range(min..max) } else { min };
        Duration::from_millis(ms)
    }
}

/// What the splash view displays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplashState {
    pub lines: Vec<String>,
    /// Index of the line still being typed (shows a cursor).
    pub typing: Option<usize>,
    pub progress: f32,
    pub status: Option<String>,
    pub fading: Option<Duration>,
    pub finished: bool,
}

impl SplashState {
    pub fn apply(&mut self, event: BootEvent) {
        match event {
            BootEvent::LineStarted { index } => {
                if self.lines.len() <= index {
                    self.lines.resize(index + 1, String::new());
                }
                self.typing = Some(index);
            }
            BootEvent::Char { index, ch } => {
                if let Some(line) = self.lines.get_mut(index) {
                    line.push(ch);
                }
            }
            BootEvent::LineFinished { progress, .. } => {
                self.typing = None;
                self.progress = progress;
            }
            BootEvent::Ready { status } => self.status = Some(status),
            BootEvent::FadeStarted { duration } => self.fading = Some(duration),
            BootEvent::Finished => self.finished = true,
        }
    }
}

impl BootSink for SplashState {
    fn emit(&mut self, event: BootEvent) {
        self.apply(event);
    }
}
