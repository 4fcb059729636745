//! Dashboard state and input handling.
//!
//! [`App`] is mutated only by the UI loop: key presses, rain ticks and [`AppEvent`]s coming
//! back from background tasks. Tool runs and chat sends are spawned and report through the
//! event channel.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use grid_core::{
    generate_password, BootEvent, CharClass, DashboardConfig, HashCracker, Panel, PanelSwitcher,
    PasswordPolicy, PortScanner, RainField, Selection, SplashState, Surfaces, TerminalWriter, Tool,
    Transcript, HASH_TYPES,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::chat_worker::ChatQueue;
use crate::events::{forward, AppEvent, ChannelWriter, EventSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Booting,
    Dashboard,
}

/// Focusable controls inside a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ScanTarget,
    ScanPorts,
    ScanRun,
    PassLength,
    PassClass(CharClass),
    PassGenerate,
    CrackDigest,
    CrackType,
    CrackRun,
    ChatInput,
}

impl Field {
    pub fn for_panel(panel: Panel) -> &'static [Field] {
        match panel {
            Panel::Home => &[],
            Panel::Tool(Tool::PortScanner) => &[Field::ScanTarget, Field::ScanPorts, Field::ScanRun],
            Panel::Tool(Tool::PassGen) => &[
                Field::PassLength,
                Field::PassClass(CharClass::Upper),
                Field::PassClass(CharClass::Lower),
                Field::PassClass(CharClass::Digit),
                Field::PassClass(CharClass::Symbol),
                Field::PassGenerate,
            ],
            Panel::Tool(Tool::HashCracker) => &[Field::CrackDigest, Field::CrackType, Field::CrackRun],
            Panel::Tool(Tool::AiAssistant) => &[Field::ChatInput],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScanForm {
    pub target: String,
    pub ports: String,
}

#[derive(Debug, Clone)]
pub struct PassForm {
    pub policy: PasswordPolicy,
    /// Last generated password or the validation error.
    pub output: Option<Result<String, String>>,
}

#[derive(Debug, Clone, Default)]
pub struct CrackForm {
    pub digest: String,
    pub type_index: usize,
}

impl CrackForm {
    pub fn hash_type(&self) -> &'static str {
        HASH_TYPES[self.type_index % HASH_TYPES.len()]
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatView {
    pub transcript: Transcript,
    pub input: String,
    /// Lines scrolled up from the bottom; 0 follows new output.
    pub scroll_back: u16,
    /// Messages handed to the worker and not yet settled.
    pub pending: usize,
}

pub struct App {
    pub config: DashboardConfig,
    pub phase: Phase,
    pub splash: SplashState,
    pub rain: RainField,
    pub switcher: PanelSwitcher,
    pub surfaces: Surfaces,
    pub scan: ScanForm,
    pub pass: PassForm,
    pub crack: CrackForm,
    pub chat: ChatView,
    pub focus: usize,
    /// Background runs in flight, per tool.
    pub running: HashMap<Tool, usize>,
    pub should_quit: bool,
    rng: StdRng,
    events: EventSender,
    chat_queue: Option<ChatQueue>,
}

impl App {
    pub fn new(config: DashboardConfig, events: EventSender, rng: StdRng) -> Self {
        let rain = RainField::new(0, 0, &config.rain);
        let policy = PasswordPolicy::new(config.password.default_length);
        Self {
            phase: Phase::Booting,
            splash: SplashState::default(),
            rain,
            switcher: PanelSwitcher::default(),
            surfaces: Surfaces::default(),
            scan: ScanForm::default(),
            pass: PassForm { policy, output: None },
            crack: CrackForm::default(),
            chat: ChatView::default(),
            focus: 0,
            running: HashMap::new(),
            should_quit: false,
            rng,
            events,
            chat_queue: None,
            config,
        }
    }

    pub fn attach_chat(&mut self, queue: ChatQueue) {
        self.chat_queue = Some(queue);
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.rain.resize(width, height);
    }

    pub fn tick(&mut self) {
        self.rain.tick(&mut self.rng);
    }

    pub fn fields(&self) -> &'static [Field] {
        Field::for_panel(self.switcher.active())
    }

    pub fn focused(&self) -> Option<Field> {
        self.fields().get(self.focus).copied()
    }

    pub fn is_running(&self, tool: Tool) -> bool {
        self.running.get(&tool).copied().unwrap_or(0) > 0
    }

    // -----------------------------------------------------------------------
    // Background events
    // -----------------------------------------------------------------------

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Boot(event) => {
                let finished = event == BootEvent::Finished;
                self.splash.apply(event);
                if finished {
                    self.phase = Phase::Dashboard;
                }
            }
            AppEvent::Output { surface, fragments, mode } => {
                self.surfaces.write(surface, fragments, mode);
            }
            AppEvent::Transcript(update) => {
                self.chat.transcript.apply(update);
            }
            AppEvent::ChatSettled { unsent } => {
                self.chat.pending = self.chat.pending.saturating_sub(1);
                if let Some(text) = unsent {
                    if self.chat.input.is_empty() {
                        self.chat.input = text;
                    }
                }
            }
            AppEvent::ToolFinished(tool) => {
                if let Some(n) = self.running.get_mut(&tool) {
                    *n = n.saturating_sub(1);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Keys
    // -----------------------------------------------------------------------

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.phase == Phase::Booting {
            return;
        }

        if let Some(selection) = selection_for(&key) {
            self.select(selection);
            return;
        }

        match key.code {
            KeyCode::Tab => self.cycle_focus(1),
            KeyCode::BackTab => self.cycle_focus(-1),
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
                if self.focused() == Some(Field::ChatInput) {
                    self.chat.input.push('\n');
                }
            }
            KeyCode::Enter => self.activate(),
            KeyCode::Left => self.adjust(-1),
            KeyCode::Right => self.adjust(1),
            KeyCode::Up => self.scroll_chat(1),
            KeyCode::Down => self.scroll_chat(-1),
            KeyCode::PageUp => self.scroll_chat(10),
            KeyCode::PageDown => self.scroll_chat(-10),
            KeyCode::Backspace => {
                if let Some(input) = self.focused_text() {
                    input.pop();
                }
            }
            KeyCode::Char(' ') if matches!(self.focused(), Some(Field::PassClass(_))) => {
                if let Some(Field::PassClass(class)) = self.focused() {
                    self.pass.policy.toggle(class);
                }
            }
            KeyCode::Char(c) => {
                if let Some(input) = self.focused_text() {
                    input.push(c);
                }
            }
            _ => {}
        }
    }

    pub fn select(&mut self, selection: Selection) {
        let before = self.switcher.active();
        self.switcher.select(selection);
        if self.switcher.active() != before {
            self.focus = 0;
        }
    }

    fn cycle_focus(&mut self, step: isize) {
        let n = self.fields().len();
        if n == 0 {
            return;
        }
        self.focus = (self.focus as isize + step).rem_euclid(n as isize) as usize;
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        match self.focused()? {
            Field::ScanTarget => Some(&mut self.scan.target),
            Field::ScanPorts => Some(&mut self.scan.ports),
            Field::CrackDigest => Some(&mut self.crack.digest),
            Field::ChatInput => Some(&mut self.chat.input),
            _ => None,
        }
    }

    fn adjust(&mut self, delta: isize) {
        match self.focused() {
            Some(Field::PassLength) => {
                let settings = &self.config.password;
                let next = (self.pass.policy.length as isize + delta).max(0) as usize;
                self.pass.policy.length = next.clamp(settings.min_length, settings.max_length);
            }
            Some(Field::CrackType) => {
                let n = HASH_TYPES.len() as isize;
                self.crack.type_index = (self.crack.type_index as isize + delta).rem_euclid(n) as usize;
            }
            _ => {}
        }
    }

    fn scroll_chat(&mut self, lines: i32) {
        if self.switcher.active() != Panel::Tool(Tool::AiAssistant) {
            return;
        }
        let next = (self.chat.scroll_back as i32 + lines).max(0);
        self.chat.scroll_back = next.min(u16::MAX as i32) as u16;
    }

    /// Enter: run whatever the active panel does.
    fn activate(&mut self) {
        match self.switcher.active() {
            Panel::Home => {}
            Panel::Tool(Tool::PortScanner) => self.run_scan(),
            Panel::Tool(Tool::PassGen) => self.generate_password(),
            Panel::Tool(Tool::HashCracker) => self.run_crack(),
            Panel::Tool(Tool::AiAssistant) => self.submit_chat(),
        }
    }

    // -----------------------------------------------------------------------
    // Tool actions
    // -----------------------------------------------------------------------

    pub fn run_scan(&mut self) {
        let target = self.scan.target.clone();
        let ports = self.scan.ports.clone();
        let settings = self.config.scan.clone();
        let events = self.events.clone();
        *self.running.entry(Tool::PortScanner).or_insert(0) += 1;
        tracing::info!(target = %target, "port scan requested");

        tokio::spawn(async move {
            let mut scanner = PortScanner::new(settings, StdRng::from_entropy());
            let mut out = ChannelWriter::new(events.clone());
            if let Err(e) = scanner.run(&target, &ports, &mut out).await {
                tracing::debug!(error = %e, "port scan rejected");
            }
            forward(&events, AppEvent::ToolFinished(Tool::PortScanner));
        });
    }

    pub fn generate_password(&mut self) {
        let output = generate_password(&self.pass.policy, &mut self.rng).map_err(|e| e.to_string());
        if let Err(e) = &output {
            tracing::debug!(error = %e, "password generation rejected");
        }
        self.pass.output = Some(output);
    }

    pub fn run_crack(&mut self) {
        let digest = self.crack.digest.trim().to_string();
        let hash_type = self.crack.hash_type();
        let settings = self.config.crack.clone();
        let events = self.events.clone();
        *self.running.entry(Tool::HashCracker).or_insert(0) += 1;
        tracing::info!(hash_type, "hash crack requested");

        tokio::spawn(async move {
            let cracker = HashCracker::new(settings);
            let mut out = ChannelWriter::new(events.clone());
            let outcome = cracker.run(&digest, hash_type, &mut out).await;
            tracing::debug!(outcome = ?outcome, "hash crack finished");
            forward(&events, AppEvent::ToolFinished(Tool::HashCracker));
        });
    }

    pub fn submit_chat(&mut self) {
        if self.chat.input.trim().is_empty() {
            return;
        }
        let Some(queue) = &self.chat_queue else {
            tracing::warn!("chat worker not attached");
            return;
        };
        let message = std::mem::take(&mut self.chat.input);
        if queue.submit(message) {
            self.chat.pending += 1;
            self.chat.scroll_back = 0;
        } else {
            tracing::warn!("chat worker stopped; message dropped");
        }
    }
}

/// F1 / Alt+1 home, F2..F5 / Alt+2..5 the tools in sidebar order.
fn selection_for(key: &KeyEvent) -> Option<Selection> {
    let slot = match key.code {
        KeyCode::F(n) if (1..=5).contains(&n) => n as usize,
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::ALT) => match c.to_digit(10) {
            Some(d) if (1..=5).contains(&d) => d as usize,
            _ => return None,
        },
        _ => return None,
    };
    Some(match slot {
        1 => Selection::Home,
        n => Selection::Tool(Tool::ALL[n - 2]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn alt(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::ALT)
    }

    fn dashboard() -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut app = App::new(DashboardConfig::default(), tx, StdRng::seed_from_u64(7));
        app.handle_event(AppEvent::Boot(BootEvent::Finished));
        (app, rx)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn keys_are_ignored_while_booting() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(DashboardConfig::default(), tx, StdRng::seed_from_u64(1));
        app.handle_key(key(KeyCode::F(2)));
        assert_eq!(app.switcher.active(), Panel::Home);

        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[test]
    fn boot_finished_switches_to_dashboard() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(DashboardConfig::default(), tx, StdRng::seed_from_u64(1));
        app.handle_event(AppEvent::Boot(BootEvent::Ready { status: "ok".into() }));
        assert_eq!(app.phase, Phase::Booting);
        app.handle_event(AppEvent::Boot(BootEvent::Finished));
        assert_eq!(app.phase, Phase::Dashboard);
    }

    #[test]
    fn function_keys_and_alt_digits_select_panels() {
        let (mut app, _rx) = dashboard();
        app.handle_key(key(KeyCode::F(3)));
        assert_eq!(app.switcher.active(), Panel::Tool(Tool::PassGen));
        app.handle_key(alt(KeyCode::Char('5')));
        assert_eq!(app.switcher.active(), Panel::Tool(Tool::AiAssistant));
        app.handle_key(key(KeyCode::F(1)));
        assert_eq!(app.switcher.active(), Panel::Home);
        assert_eq!(app.switcher.highlighted(), None);
    }

    #[test]
    fn typing_goes_to_the_focused_field() {
        let (mut app, _rx) = dashboard();
        app.handle_key(key(KeyCode::F(2)));
        type_text(&mut app, "10.0.0.1");
        app.handle_key(key(KeyCode::Tab));
        type_text(&mut app, "22,80x");
        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.scan.target, "10.0.0.1");
        assert_eq!(app.scan.ports, "22,80");

        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.focused(), Some(Field::ScanTarget));
    }

    #[test]
    fn password_controls_adjust_policy() {
        let (mut app, _rx) = dashboard();
        app.handle_key(key(KeyCode::F(3)));
        for _ in 0..100 {
            app.handle_key(key(KeyCode::Left));
        }
        assert_eq!(app.pass.policy.length, 4);
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.pass.policy.length, 5);

        for class in CharClass::ALL {
            app.handle_key(key(KeyCode::Tab));
            assert_eq!(app.focused(), Some(Field::PassClass(class)));
            app.handle_key(key(KeyCode::Char(' ')));
        }
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(
            app.pass.output,
            Some(Err("Error: Select at least one character set.".to_string()))
        );

        // Focus is still on the symbol checkbox.
        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_key(key(KeyCode::Enter));
        match &app.pass.output {
            Some(Ok(pw)) => {
                assert_eq!(pw.len(), 5);
                assert!(pw.chars().all(|c| grid_core::tools::password::SYMBOLS.contains(c)));
            }
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn hash_type_cycles_both_ways() {
        let (mut app, _rx) = dashboard();
        app.handle_key(key(KeyCode::F(4)));
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.crack.hash_type(), "md5");
        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.crack.hash_type(), "sha256");
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.crack.hash_type(), "sha1");
    }

    #[test]
    fn blank_chat_input_is_not_submitted() {
        let (mut app, _rx) = dashboard();
        let (tx, mut queued) = mpsc::unbounded_channel();
        app.attach_chat(ChatQueue::from_sender(tx));
        app.handle_key(key(KeyCode::F(5)));

        type_text(&mut app, "   ");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.chat.pending, 0);
        assert!(queued.try_recv().is_err());

        type_text(&mut app, "hi");
        app.handle_key(alt(KeyCode::Enter));
        type_text(&mut app, "there");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(queued.try_recv().unwrap(), "   hi\nthere");
        assert_eq!(app.chat.input, "");
        assert_eq!(app.chat.pending, 1);

        app.handle_event(AppEvent::ChatSettled { unsent: None });
        assert_eq!(app.chat.pending, 0);
    }

    #[test]
    fn unsent_chat_message_is_restored_to_the_input() {
        let (mut app, _rx) = dashboard();
        let (tx, mut queued) = mpsc::unbounded_channel();
        app.attach_chat(ChatQueue::from_sender(tx));
        app.handle_key(key(KeyCode::F(5)));

        type_text(&mut app, "ping");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(queued.try_recv().unwrap(), "ping");
        assert_eq!(app.chat.input, "");

        app.handle_event(AppEvent::ChatSettled { unsent: Some("ping".into()) });
        assert_eq!(app.chat.pending, 0);
        assert_eq!(app.chat.input, "ping");

        // Resubmitted, then new text typed before the worker settles: the new text wins.
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(queued.try_recv().unwrap(), "ping");
        type_text(&mut app, "next");
        app.handle_event(AppEvent::ChatSettled { unsent: Some("ping".into()) });
        assert_eq!(app.chat.input, "next");
    }

    #[tokio::test(start_paused = true)]
    async fn scan_runs_in_the_background_and_reports_back() {
        let (mut app, mut rx) = dashboard();
        app.handle_key(key(KeyCode::F(2)));
        type_text(&mut app, "host");
        app.handle_key(key(KeyCode::Tab));
        type_text(&mut app, "22");
        app.handle_key(key(KeyCode::Enter));
        assert!(app.is_running(Tool::PortScanner));

        while app.is_running(Tool::PortScanner) {
            let event = rx.recv().await.unwrap();
            app.handle_event(event);
        }
        let text = app.surfaces.get(grid_core::SurfaceId::PortScan).text();
        assert!(text.starts_with("> Starting scan on host..."));
        assert!(text.ends_with("> Scan complete."));
    }

    #[tokio::test(start_paused = true)]
    async fn crack_reports_finished_through_the_event_channel() {
        let (mut app, mut rx) = dashboard();
        app.crack.digest = "deadbeef".into();
        app.run_crack();
        assert!(app.is_running(Tool::HashCracker));

        loop {
            let event = rx.recv().await.unwrap();
            let finished = event == AppEvent::ToolFinished(Tool::HashCracker);
            app.handle_event(event);
            if finished {
                break;
            }
        }
        assert!(!app.is_running(Tool::HashCracker));
    }
}
