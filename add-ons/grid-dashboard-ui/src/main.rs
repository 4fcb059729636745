//! grid: the GRID dashboard in a terminal.
//! Boot splash, then keyboard-driven tool panels over the glyph rain.

use crossterm::{
    event::{Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use grid_core::{BootSequencer, ChatClient, DashboardConfig, OpenRouterTransport};
use grid_dashboard_ui::{chat_worker, ui, App, AppEvent, ChannelBootSink, EventSender};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{stdout, Stdout};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Tui = Terminal<CrosstermBackend<Stdout>>;

const DEFAULT_LOG_FILE: &str = "grid-dashboard.log";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (before any env::var calls)
    let dotenv = dotenvy::dotenv();
    init_logging()?;
    if let Err(e) = dotenv {
        tracing::debug!(error = %e, ".env not loaded, using system environment");
    }

    let config = DashboardConfig::load()?;
    tracing::info!(model = %config.chat.model, "GRID dashboard starting");

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(run(config))
}

/// The TUI owns the screen, so logs go to a file.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::var("GRID_LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.into());
    let file = std::fs::OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .init();
    Ok(())
}

async fn run(config: DashboardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();

    let mut app = App::new(config.clone(), tx.clone(), StdRng::from_entropy());
    let client = ChatClient::new(OpenRouterTransport::factory(config.chat.clone()));
    let (queue, _worker) = chat_worker::spawn(client, tx.clone());
    app.attach_chat(queue);

    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut app, &mut rx, tx).await;
    restore_terminal(&mut terminal)?;
    if let Err(e) = &result {
        tracing::error!(error = %e, "dashboard stopped on error");
    }
    result
}

fn setup_terminal() -> Result<Tui, Box<dyn std::error::Error>> {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), LeaveAlternateScreen);
        hook(info);
    }));

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(terminal: &mut Tui) -> Result<(), Box<dyn std::error::Error>> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn event_loop(
    terminal: &mut Tui,
    app: &mut App,
    rx: &mut mpsc::UnboundedReceiver<AppEvent>,
    tx: EventSender,
) -> Result<(), Box<dyn std::error::Error>> {
    let size = terminal.size()?;
    app.resize(size.width, size.height);

    let boot = BootSequencer::new(app.config.boot.clone(), StdRng::from_entropy());
    tokio::spawn(async move {
        let mut sink = ChannelBootSink::new(tx);
        boot.run(&mut sink).await;
    });

    let mut reader = EventStream::new();
    let mut ticker = tokio::time::interval(app.config.rain.tick());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        tokio::select! {
            _ = ticker.tick() => app.tick(),
            Some(event) = rx.recv() => app.handle_event(event),
            maybe = reader.next() => match maybe {
                Some(Ok(Event::Key(key))) => app.handle_key(key),
                Some(Ok(Event::Resize(width, height))) => app.resize(width, height),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        }

        if app.should_quit {
            tracing::info!("operator quit");
            break;
        }
    }
    Ok(())
}
