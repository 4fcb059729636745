//! Drawing. Everything here reads [`App`]; nothing mutates it.

use grid_core::{
    CharClass, Fragment, LineKind, Markup, MarkupLine, MessageBody, Panel, RainField, Sender,
    SurfaceId, Tone, Tool, HASH_TYPES,
};
use ratatui::{
    buffer::Buffer,
    prelude::*,
    widgets::{Block, Borders, Clear, Gauge, LineGauge, List, ListItem, Paragraph, Wrap},
};

use crate::app::{App, Field, Phase};

const ACCENT: Color = Color::Rgb(0, 255, 65);
const DIM_GREEN: Color = Color::Rgb(0, 143, 17);
const FOCUS: Color = Color::Yellow;

pub fn draw(f: &mut Frame, app: &App) {
    f.render_widget(RainView { field: &app.rain }, f.area());
    match app.phase {
        Phase::Booting => draw_splash(f, app),
        Phase::Dashboard => draw_dashboard(f, app),
    }
}

// ---------------------------------------------------------------------------
// Rain
// ---------------------------------------------------------------------------

/// Paints the rain buffer cell by cell; brightness follows intensity.
pub struct RainView<'a> {
    pub field: &'a RainField,
}

impl Widget for RainView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                let Some(cell) = self.field.cell(x - area.left(), y - area.top()) else {
                    continue;
                };
                let color = if cell.intensity > 0.95 {
                    Color::Rgb(180, 255, 180)
                } else {
                    Color::Rgb(0, (cell.intensity * 255.0) as u8, (cell.intensity * 65.0) as u8)
                };
                if let Some(target) = buf.cell_mut((x, y)) {
                    target.set_char(cell.glyph).set_fg(color);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Splash
// ---------------------------------------------------------------------------

fn draw_splash(f: &mut Frame, app: &App) {
    let splash = &app.splash;
    let area = centered(f.area(), 64, 14);
    let dim = if splash.fading.is_some() {
        Style::default().add_modifier(Modifier::DIM)
    } else {
        Style::default()
    };

    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(DIM_GREEN))
        .title(" H4CK3R-OS ")
        .style(dim);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let lines: Vec<Line> = splash
        .lines
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let mut spans = vec![Span::styled(text.clone(), Style::default().fg(ACCENT))];
            if splash.typing == Some(i) {
                spans.push(Span::styled("█", Style::default().fg(ACCENT).add_modifier(Modifier::SLOW_BLINK)));
            }
            Line::from(spans)
        })
        .collect();
    f.render_widget(Paragraph::new(lines).style(dim), chunks[0]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(ACCENT).bg(Color::Black))
        .ratio(f64::from(splash.progress).clamp(0.0, 1.0))
        .label(format!("{:>3}%", (splash.progress * 100.0).round() as u32))
        .style(dim);
    f.render_widget(gauge, chunks[1]);

    if let Some(status) = &splash.status {
        f.render_widget(
            Paragraph::new(status.as_str()).alignment(Alignment::Center).style(dim.fg(ACCENT)),
            chunks[2],
        );
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

// ---------------------------------------------------------------------------
// Dashboard frame
// ---------------------------------------------------------------------------

fn draw_dashboard(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(3), Constraint::Min(10), Constraint::Length(1)])
        .split(f.area());

    let clock = chrono::Local::now().format("%H:%M:%S").to_string();
    let header = Paragraph::new(Line::from(vec![
        Span::styled("THE GRID", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        Span::raw("  //  operator console  //  "),
        Span::styled(clock, Style::default().fg(DIM_GREEN)),
    ]))
    .block(panel_block(" Header ", false));
    f.render_widget(Clear, rows[0]);
    f.render_widget(header, rows[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(30)])
        .split(rows[1]);
    draw_sidebar(f, app, body[0]);

    f.render_widget(Clear, body[1]);
    match app.switcher.active() {
        Panel::Home => draw_home(f, app, body[1]),
        Panel::Tool(Tool::PortScanner) => draw_port_scanner(f, app, body[1]),
        Panel::Tool(Tool::PassGen) => draw_pass_gen(f, app, body[1]),
        Panel::Tool(Tool::HashCracker) => draw_hash_cracker(f, app, body[1]),
        Panel::Tool(Tool::AiAssistant) => draw_chat(f, app, body[1]),
    }

    let help = Paragraph::new(
        "F1 home  F2-F5 tools  Tab fields  Enter run/send  Alt+Enter newline  ←/→ adjust  Space toggle  ↑/↓ scroll  Ctrl+C quit",
    )
    .style(Style::default().fg(DIM_GREEN));
    f.render_widget(Clear, rows[2]);
    f.render_widget(help, rows[2]);
}

fn panel_block(title: &str, focused: bool) -> Block<'static> {
    let color = if focused { FOCUS } else { DIM_GREEN };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title.to_string())
}

fn draw_sidebar(f: &mut Frame, app: &App, area: Rect) {
    let mut items = vec![sidebar_item("F1", "Home", app.switcher.active() == Panel::Home)];
    for (i, tool) in Tool::ALL.into_iter().enumerate() {
        let mut label = tool.label().to_string();
        if app.is_running(tool) || (tool == Tool::AiAssistant && app.chat.pending > 0) {
            label.push_str(" *");
        }
        items.push(sidebar_item(&format!("F{}", i + 2), &label, app.switcher.is_highlighted(tool)));
    }
    f.render_widget(Clear, area);
    f.render_widget(List::new(items).block(panel_block(" Tools ", false)), area);
}

fn sidebar_item(key: &str, label: &str, active: bool) -> ListItem<'static> {
    let style = if active {
        Style::default().fg(Color::Black).bg(ACCENT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(ACCENT)
    };
    ListItem::new(Line::from(vec![
        Span::styled(format!("{:>3} ", key), Style::default().fg(DIM_GREEN)),
        Span::styled(label.to_string(), style),
    ]))
}

// ---------------------------------------------------------------------------
// Panels
// ---------------------------------------------------------------------------

fn draw_home(f: &mut Frame, app: &App, area: Rect) {
    let text = vec![
        Line::styled("Welcome, Operator.", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        Line::raw(""),
        Line::raw("Pick a tool from the sidebar. Everything here is simulated:"),
        Line::raw("  Port Scanner        sends no packets, verdicts are random"),
        Line::raw("  Password Generator  draws from the classes you enable"),
        Line::raw("  Hash Cracker        knows exactly one MD5 digest"),
        Line::raw("  GRID AI Assistant   ethical-hacking Q&A, needs GRID_LLM_API_KEY"),
        Line::raw(""),
        Line::styled(format!("active panel: {}", app.switcher.active().id()), Style::default().fg(DIM_GREEN)),
    ];
    f.render_widget(
        Paragraph::new(text).wrap(Wrap { trim: false }).block(panel_block(" Dashboard ", false)),
        area,
    );
}

fn input_line<'a>(label: &'a str, value: &'a str, focused: bool) -> Paragraph<'a> {
    let mut spans = vec![Span::styled(value, Style::default().fg(ACCENT))];
    if focused {
        spans.push(Span::styled("█", Style::default().fg(FOCUS)));
    }
    Paragraph::new(Line::from(spans)).block(panel_block(label, focused))
}

fn button<'a>(label: &'a str, focused: bool, busy: bool) -> Paragraph<'a> {
    let text = if busy { format!("[ {} ... ]", label) } else { format!("[ {} ]", label) };
    let style = if focused {
        Style::default().fg(Color::Black).bg(FOCUS).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(ACCENT)
    };
    Paragraph::new(Line::styled(text, style)).alignment(Alignment::Center)
}

fn draw_port_scanner(f: &mut Frame, app: &App, area: Rect) {
    let focus = app.focused();
    let block = panel_block(" Port Scanner ", false);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(3),
        ])
        .split(inner);
    f.render_widget(input_line(" Target (IP / host) ", &app.scan.target, focus == Some(Field::ScanTarget)), rows[0]);
    f.render_widget(input_line(" Ports (e.g. 22,80,443) ", &app.scan.ports, focus == Some(Field::ScanPorts)), rows[1]);
    f.render_widget(
        button("RUN SCAN", focus == Some(Field::ScanRun), app.is_running(Tool::PortScanner)),
        rows[2],
    );
    draw_surface(f, app, SurfaceId::PortScan, rows[3]);
}

fn draw_pass_gen(f: &mut Frame, app: &App, area: Rect) {
    let focus = app.focused();
    let block = panel_block(" Password Generator ", false);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(inner);

    let settings = &app.config.password;
    let length = app.pass.policy.length;
    let span = settings.max_length.saturating_sub(settings.min_length).max(1);
    let ratio = length.saturating_sub(settings.min_length) as f64 / span as f64;
    let length_focused = focus == Some(Field::PassLength);
    let gauge = LineGauge::default()
        .filled_style(Style::default().fg(if length_focused { FOCUS } else { ACCENT }))
        .label(format!("Length: {:>2}  ", length))
        .ratio(ratio.clamp(0.0, 1.0));
    f.render_widget(gauge, rows[0]);

    let boxes: Vec<Line> = CharClass::ALL
        .into_iter()
        .map(|class| {
            let mark = if app.pass.policy.is_enabled(class) { "[x]" } else { "[ ]" };
            let style = if focus == Some(Field::PassClass(class)) {
                Style::default().fg(FOCUS)
            } else {
                Style::default().fg(ACCENT)
            };
            Line::styled(format!("{} {}", mark, class.label()), style)
        })
        .collect();
    f.render_widget(Paragraph::new(boxes), rows[1]);

    f.render_widget(button("GENERATE", focus == Some(Field::PassGenerate), false), rows[2]);

    let output = match &app.pass.output {
        Some(Ok(password)) => Line::styled(password.clone(), Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        Some(Err(message)) => Line::styled(message.clone(), Style::default().fg(Color::Red)),
        None => Line::styled("(press Enter to generate)", Style::default().fg(DIM_GREEN)),
    };
    f.render_widget(
        Paragraph::new(output).wrap(Wrap { trim: false }).block(panel_block(" Output ", false)),
        rows[3],
    );
}

fn draw_hash_cracker(f: &mut Frame, app: &App, area: Rect) {
    let focus = app.focused();
    let block = panel_block(" Hash Cracker ", false);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
        ])
        .split(inner);
    f.render_widget(input_line(" Hash ", &app.crack.digest, focus == Some(Field::CrackDigest)), rows[0]);

    let type_focused = focus == Some(Field::CrackType);
    let mut spans = vec![Span::styled("Type: ", Style::default().fg(DIM_GREEN))];
    for (i, name) in HASH_TYPES.iter().enumerate() {
        let selected = i == app.crack.type_index % HASH_TYPES.len();
        let style = match (selected, type_focused) {
            (true, true) => Style::default().fg(Color::Black).bg(FOCUS),
            (true, false) => Style::default().fg(Color::Black).bg(ACCENT),
            _ => Style::default().fg(ACCENT),
        };
        spans.push(Span::styled(format!(" {} ", name), style));
        spans.push(Span::raw(" "));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), rows[1]);

    f.render_widget(
        button("CRACK", focus == Some(Field::CrackRun), app.is_running(Tool::HashCracker)),
        rows[2],
    );
    draw_surface(f, app, SurfaceId::HashCrack, rows[3]);
}

fn draw_surface(f: &mut Frame, app: &App, surface: SurfaceId, area: Rect) {
    let lines: Vec<Line> = app
        .surfaces
        .get(surface)
        .lines()
        .into_iter()
        .map(|runs| Line::from(runs.into_iter().map(fragment_span).collect::<Vec<_>>()))
        .collect();
    let block = panel_block(" Output ", false);
    let inner = block.inner(area);
    let scroll = bottom_scroll(&lines, inner, 0);
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).scroll((scroll, 0)).block(block),
        area,
    );
}

fn fragment_span(fragment: Fragment) -> Span<'static> {
    let style = match fragment.tone {
        Tone::Plain => Style::default().fg(ACCENT),
        Tone::Open => Style::default().fg(Color::LightGreen).add_modifier(Modifier::BOLD),
        Tone::Closed => Style::default().fg(Color::Red),
        Tone::Accent => Style::default().fg(Color::Black).bg(ACCENT).add_modifier(Modifier::BOLD),
        Tone::Error => Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
    };
    Span::styled(fragment.text, style)
}

/// Scroll offset that keeps the last line visible, minus `back` lines.
fn bottom_scroll(lines: &[Line], inner: Rect, back: u16) -> u16 {
    let width = inner.width.max(1) as usize;
    let total: usize = lines.iter().map(|l| l.width().max(1).div_ceil(width)).sum();
    let max = total.saturating_sub(inner.height as usize);
    max.saturating_sub(back as usize).min(u16::MAX as usize) as u16
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

fn draw_chat(f: &mut Frame, app: &App, area: Rect) {
    let input_height = (app.chat.input.lines().count().max(1) as u16 + 2).min(8);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(input_height)])
        .split(area);

    let lines = transcript_lines(app);
    let title = if app.chat.pending > 0 {
        format!(" GRID AI Assistant · {} queued ", app.chat.pending)
    } else {
        " GRID AI Assistant ".to_string()
    };
    let block = panel_block(&title, false);
    let inner = block.inner(rows[0]);
    let scroll = bottom_scroll(&lines, inner, app.chat.scroll_back);
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).scroll((scroll, 0)).block(block),
        rows[0],
    );

    let focused = app.focused() == Some(Field::ChatInput);
    let mut input: Vec<Line> = app.chat.input.split('\n').map(|l| Line::styled(l.to_string(), Style::default().fg(ACCENT))).collect();
    if focused {
        if let Some(last) = input.last_mut() {
            last.spans.push(Span::styled("█", Style::default().fg(FOCUS)));
        }
    }
    f.render_widget(
        Paragraph::new(input).wrap(Wrap { trim: false }).block(panel_block(" Ask GRID (Enter send, Alt+Enter newline) ", focused)),
        rows[1],
    );
}

fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    for message in app.chat.transcript.messages() {
        let who_style = match message.sender {
            Sender::Operator => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            Sender::Assistant => Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        };
        let stamp = message.sent_at.with_timezone(&chrono::Local).format("%H:%M:%S").to_string();
        out.push(Line::from(vec![
            Span::styled(message.sender.label().to_string(), who_style),
            Span::styled(format!("  {}", stamp), Style::default().fg(DIM_GREEN)),
        ]));
        match &message.body {
            MessageBody::Plain(text) => {
                out.extend(text.lines().map(|l| Line::styled(l.to_string(), Style::default().fg(Color::White))));
            }
            MessageBody::Typing => {
                out.push(Line::styled("...", Style::default().fg(DIM_GREEN).add_modifier(Modifier::SLOW_BLINK)));
            }
            MessageBody::Markup(markup) => out.extend(markup_lines(markup)),
            MessageBody::Error(text) => {
                out.push(Line::styled(text.clone(), Style::default().fg(Color::LightRed)));
            }
        }
        out.push(Line::raw(""));
    }
    out
}

/// Styled lines for rendered markdown.
pub fn markup_lines(markup: &Markup) -> Vec<Line<'static>> {
    markup.lines.iter().map(markup_line).collect()
}

fn markup_line(line: &MarkupLine) -> Line<'static> {
    let base = match line.kind {
        LineKind::Heading(1) => Style::default().fg(ACCENT).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        LineKind::Heading(_) => Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        LineKind::Code => Style::default().fg(Color::LightYellow).bg(Color::Rgb(20, 20, 20)),
        LineKind::Quote => Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        LineKind::Text | LineKind::Rule | LineKind::Blank => Style::default().fg(Color::White),
    };
    match line.kind {
        LineKind::Rule => return Line::styled("─".repeat(24), Style::default().fg(DIM_GREEN)),
        LineKind::Blank => return Line::raw(""),
        _ => {}
    }

    let mut spans = Vec::with_capacity(line.spans.len() + 1);
    if line.kind == LineKind::Quote {
        spans.push(Span::styled("│ ", Style::default().fg(DIM_GREEN)));
    }
    for span in &line.spans {
        let mut style = base;
        if span.style.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if span.style.italic {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if span.style.strikethrough {
            style = style.add_modifier(Modifier::CROSSED_OUT);
        }
        if span.style.code && line.kind != LineKind::Code {
            style = style.fg(Color::LightYellow);
        }
        if span.style.link {
            style = style.fg(Color::Cyan).add_modifier(Modifier::UNDERLINED);
        }
        if span.style.marker {
            style = style.fg(DIM_GREEN);
        }
        spans.push(Span::styled(span.text.clone(), style));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_core::{CmarkRenderer, MarkdownRenderer};

    #[test]
    fn markup_keeps_text_and_marks_code() {
        let markup = CmarkRenderer.render("# Title\n\nuse `nmap`\n\n> careful");
        let lines = markup_lines(&markup);
        let text: Vec<String> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert_eq!(text[0], "Title");
        assert!(text.iter().any(|t| t == "use nmap"));
        assert!(text.iter().any(|t| t == "│ careful"));

        let code = lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .find(|s| s.content == "nmap")
            .unwrap();
        assert_eq!(code.style.fg, Some(Color::LightYellow));
    }

    #[test]
    fn bottom_scroll_follows_the_tail() {
        let lines: Vec<Line> = (0..10).map(|i| Line::raw(format!("line {}", i))).collect();
        let inner = Rect::new(0, 0, 20, 4);
        assert_eq!(bottom_scroll(&lines, inner, 0), 6);
        assert_eq!(bottom_scroll(&lines, inner, 2), 4);
        assert_eq!(bottom_scroll(&lines, inner, 50), 0);
    }

    #[test]
    fn dashboard_renders_into_a_test_backend() {
        use crate::events::AppEvent;
        use grid_core::{BootEvent, DashboardConfig};
        use rand::rngs::StdRng;
        use rand::SeedableRng;
        use ratatui::backend::TestBackend;

        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let mut app = App::new(DashboardConfig::default(), tx, StdRng::seed_from_u64(3));
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        app.resize(120, 40);
        app.tick();

        terminal.draw(|f| draw(f, &app)).unwrap();
        app.handle_event(AppEvent::Boot(BootEvent::Finished));
        terminal.draw(|f| draw(f, &app)).unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(screen.contains("THE GRID"));
        assert!(screen.contains("dashboard-home"));
    }
}
