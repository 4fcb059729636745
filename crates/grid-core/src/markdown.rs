//! Markdown to styled markup.
//!
//! [`MarkdownRenderer`] is a pure function from full source text to [`Markup`]. It has no
//! notion of streaming: callers re-render the complete accumulated buffer every time, so
//! constructs that span fragment boundaries resolve once their closing token arrives.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub code: bool,
    pub link: bool,
    /// Structural prefix such as a list bullet or quote bar.
    pub marker: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupSpan {
    pub text: String,
    pub style: SpanStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineKind {
    #[default]
    Text,
    Heading(u8),
    Code,
    Quote,
    Rule,
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkupLine {
    pub kind: LineKind,
    pub spans: Vec<MarkupSpan>,
}

impl MarkupLine {
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Rendered document: a list of styled lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Markup {
    pub lines: Vec<MarkupLine>,
}

impl Markup {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Text content with styling dropped, one line per markup line.
    pub fn plain_text(&self) -> String {
        self.lines.iter().map(MarkupLine::text).collect::<Vec<_>>().join("\n")
    }
}

pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, source: &str) -> Markup;
}

/// pulldown-cmark backed renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CmarkRenderer;

impl MarkdownRenderer for CmarkRenderer {
    fn render(&self, source: &str) -> Markup {
        let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
        let mut state = RenderState::default();
        state.process(Parser::new_ext(source, options));
        state.finish()
    }
}

#[derive(Default)]
struct RenderState {
    lines: Vec<MarkupLine>,
    current: Vec<MarkupSpan>,
    bold: usize,
    italic: usize,
    strike: usize,
    links: Vec<String>,
    heading: Option<u8>,
    quote_depth: usize,
    in_code_block: bool,
    /// `Some(next_number)` for ordered lists.
    list_stack: Vec<Option<u64>>,
    pending_list_prefix: bool,
    needs_blank: bool,
}

impl RenderState {
    fn process<'a>(&mut self, parser: impl Iterator<Item = Event<'a>>) {
        for event in parser {
            match event {
                Event::Start(tag) => self.start_tag(tag),
                Event::End(tag) => self.end_tag(tag),
                Event::Text(text) => self.text(&text),
                Event::Code(code) => {
                    let style = SpanStyle { code: true, ..self.style() };
                    self.push_inline(&code, style);
                }
                Event::SoftBreak => self.push_inline(" ", self.style()),
                Event::HardBreak => self.flush_line(),
                Event::Rule => {
                    self.flush_blank();
                    self.lines.push(MarkupLine { kind: LineKind::Rule, spans: Vec::new() });
                    self.needs_blank = true;
                }
                Event::TaskListMarker(checked) => {
                    self.pending_list_prefix = false;
                    let indent = "  ".repeat(self.list_stack.len().saturating_sub(1));
                    let mark = if checked { "[x] " } else { "[ ] " };
                    self.push_marker(&format!("{}{}", indent, mark));
                }
                Event::Html(html) | Event::InlineHtml(html) => self.text(&html),
                _ => {}
            }
        }
    }

    fn start_tag(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_blank();
                self.heading = Some(heading_number(level));
            }
            Tag::Paragraph => {
                if self.list_stack.is_empty() {
                    self.flush_blank();
                }
            }
            Tag::Emphasis => self.italic += 1,
            Tag::Strong => self.bold += 1,
            Tag::Strikethrough => self.strike += 1,
            Tag::CodeBlock(_) => {
                self.flush_blank();
                self.in_code_block = true;
            }
            Tag::BlockQuote(_) => {
                self.flush_blank();
                self.quote_depth += 1;
            }
            Tag::Link { dest_url, .. } => self.links.push(dest_url.to_string()),
            Tag::List(start) => {
                if self.list_stack.is_empty() {
                    self.flush_blank();
                }
                self.list_stack.push(start);
            }
            Tag::Item => {
                self.flush_line();
                self.pending_list_prefix = true;
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.flush_line();
                self.heading = None;
                self.needs_blank = true;
            }
            TagEnd::Paragraph => {
                self.flush_line();
                if self.list_stack.is_empty() {
                    self.needs_blank = true;
                }
            }
            TagEnd::Emphasis => self.italic = self.italic.saturating_sub(1),
            TagEnd::Strong => self.bold = self.bold.saturating_sub(1),
            TagEnd::Strikethrough => self.strike = self.strike.saturating_sub(1),
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.needs_blank = true;
            }
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.needs_blank = true;
            }
            TagEnd::Link => {
                if let Some(url) = self.links.pop() {
                    let shown: String = self.current.iter().map(|s| s.text.as_str()).collect();
                    if !url.is_empty() && !shown.ends_with(url.as_str()) {
                        let style = SpanStyle { marker: true, ..SpanStyle::default() };
                        self.current.push(MarkupSpan { text: format!(" ({})", url), style });
                    }
                }
            }
            TagEnd::List(_) => {
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.flush_line();
                    self.needs_blank = true;
                }
            }
            TagEnd::Item => self.flush_line(),
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_code_block {
            for line in text.lines() {
                self.lines.push(MarkupLine {
                    kind: LineKind::Code,
                    spans: vec![MarkupSpan {
                        text: line.to_string(),
                        style: SpanStyle { code: true, ..SpanStyle::default() },
                    }],
                });
            }
            return;
        }
        self.push_inline(text, self.style());
    }

    fn push_inline(&mut self, text: &str, style: SpanStyle) {
        if self.pending_list_prefix {
            self.pending_list_prefix = false;
            let indent = "  ".repeat(self.list_stack.len().saturating_sub(1));
            let bullet = match self.list_stack.last_mut() {
                Some(Some(n)) => {
                    let b = format!("{}{}. ", indent, n);
                    *n += 1;
                    b
                }
                _ => format!("{}• ", indent),
            };
            self.push_marker(&bullet);
        }
        self.current.push(MarkupSpan { text: text.to_string(), style });
    }

    fn push_marker(&mut self, text: &str) {
        let style = SpanStyle { marker: true, ..SpanStyle::default() };
        self.current.push(MarkupSpan { text: text.to_string(), style });
    }

    fn style(&self) -> SpanStyle {
        SpanStyle {
            bold: self.bold > 0 || self.heading.is_some(),
            italic: self.italic > 0,
            strikethrough: self.strike > 0,
            code: false,
            link: !self.links.is_empty(),
            marker: false,
        }
    }

    fn line_kind(&self) -> LineKind {
        if let Some(level) = self.heading {
            LineKind::Heading(level)
        } else if self.quote_depth > 0 {
            LineKind::Quote
        } else {
            LineKind::Text
        }
    }

    fn flush_line(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.current);
        self.lines.push(MarkupLine { kind: self.line_kind(), spans });
    }

    fn flush_blank(&mut self) {
        self.flush_line();
        if self.needs_blank && !self.lines.is_empty() {
            self.lines.push(MarkupLine { kind: LineKind::Blank, spans: Vec::new() });
        }
        self.needs_blank = false;
    }

    fn finish(mut self) -> Markup {
        self.flush_line();
        Markup { lines: self.lines }
    }
}

fn heading_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(src: &str) -> Markup {
        CmarkRenderer.render(src)
    }

    #[test]
    fn heading_and_paragraph_are_separated() {
        let out = render("# Nmap\n\nA port scanner.");
        assert_eq!(out.lines[0].kind, LineKind::Heading(1));
        assert_eq!(out.lines[1].kind, LineKind::Blank);
        assert_eq!(out.lines[2].text(), "A port scanner.");
    }

    #[test]
    fn lists_get_bullets_and_numbers() {
        let out = render("- one\n- two\n\n1. first\n2. second");
        let text = out.plain_text();
        assert!(text.contains("• one"));
        assert!(text.contains("• two"));
        assert!(text.contains("1. first"));
        assert!(text.contains("2. second"));
    }

    #[test]
    fn fenced_code_lines_are_code() {
        let out = render("```bash\nnmap -sV 10.0.0.1\nexit\n```");
        let code: Vec<_> = out.lines.iter().filter(|l| l.kind == LineKind::Code).collect();
        assert_eq!(code.len(), 2);
        assert_eq!(code[0].text(), "nmap -sV 10.0.0.1");
    }

    #[test]
    fn unterminated_strong_is_literal_until_closed() {
        let partial = render("use **caut");
        assert!(partial.plain_text().contains("**caut"));
        let full = render("use **caution**");
        let span = full.lines[0].spans.iter().find(|s| s.text == "caution").unwrap();
        assert!(span.style.bold);
    }

    #[test]
    fn links_show_their_target() {
        let out = render("see [OWASP](https://owasp.org)");
        assert_eq!(out.plain_text(), "see OWASP (https://owasp.org)");
    }
}
