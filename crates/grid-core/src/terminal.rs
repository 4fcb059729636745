//! Terminal Writer: styled text fragments appended to named output surfaces.
//!
//! Tools never talk to the screen directly. They write through a [`TerminalWriter`]; the
//! dashboard forwards writes over its event channel, tests collect them in [`Surfaces`].

use serde::{Deserialize, Serialize};

/// Named output surface a tool writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurfaceId {
    PortScan,
    HashCrack,
}

/// Presentation hint for one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tone {
    #[default]
    Plain,
    /// Positive verdict (open port).
    Open,
    /// Negative verdict (closed port).
    Closed,
    /// Highlighted result, e.g. a recovered plaintext.
    Accent,
    Error,
}

/// A run of text with a single tone. May contain newlines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    pub tone: Tone,
}

impl Fragment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), tone: Tone::Plain }
    }

    pub fn toned(text: impl Into<String>, tone: Tone) -> Self {
        Self { text: text.into(), tone }
    }
}

/// Whether a write replaces the surface content or appends to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Append,
    Clear,
}

/// Sink for tool output.
pub trait TerminalWriter {
    /// Write a sequence of fragments as one unit. With [`WriteMode::Clear`] the surface is
    /// emptied first.
    fn write(&mut self, surface: SurfaceId, fragments: Vec<Fragment>, mode: WriteMode);

    fn append(&mut self, surface: SurfaceId, text: &str) {
        self.write(surface, vec![Fragment::plain(text)], WriteMode::Append);
    }

    fn clear_and_write(&mut self, surface: SurfaceId, text: &str) {
        self.write(surface, vec![Fragment::plain(text)], WriteMode::Clear);
    }
}

/// Accumulated content of one surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSurface {
    fragments: Vec<Fragment>,
}

impl OutputSurface {
    pub fn apply(&mut self, fragments: Vec<Fragment>, mode: WriteMode) {
        if mode == WriteMode::Clear {
            self.fragments.clear();
        }
        for fragment in fragments {
            // Merge adjacent runs of the same tone so the line splitter sees fewer pieces.
            match self.fragments.last_mut() {
                Some(last) if last.tone == fragment.tone => last.text.push_str(&fragment.text),
                _ => self.fragments.push(fragment),
            }
        }
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.iter().all(|f| f.text.is_empty())
    }

    /// Whole surface as plain text.
    pub fn text(&self) -> String {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }

    /// Split into display lines, each a list of toned runs.
    pub fn lines(&self) -> Vec<Vec<Fragment>> {
        let mut lines: Vec<Vec<Fragment>> = vec![Vec::new()];
        for fragment in &self.fragments {
            let mut parts = fragment.text.split('\n').peekable();
            while let Some(part) = parts.next() {
                if !part.is_empty() {
                    if let Some(line) = lines.last_mut() {
                        line.push(Fragment::toned(part, fragment.tone));
                    }
                }
                if parts.peek().is_some() {
                    lines.push(Vec::new());
                }
            }
        }
        lines
    }
}

/// All surfaces of the dashboard. Also a [`TerminalWriter`] in its own right.
#[derive(Debug, Clone, Default)]
pub struct Surfaces {
    port_scan: OutputSurface,
    hash_crack: OutputSurface,
}

impl Surfaces {
    pub fn get(&self, id: SurfaceId) -> &OutputSurface {
        match id {
            SurfaceId::PortScan => &self.port_scan,
            SurfaceId::HashCrack => &self.hash_crack,
        }
    }

    fn get_mut(&mut self, id: SurfaceId) -> &mut OutputSurface {
        match id {
            SurfaceId::PortScan => &mut self.port_scan,
            SurfaceId::HashCrack => &mut self.hash_crack,
        }
    }
}

impl TerminalWriter for Surfaces {
    fn write(&mut self, surface: SurfaceId, fragments: Vec<Fragment>, mode: WriteMode) {
        self.get_mut(surface).apply(fragments, mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_mode_replaces_content() {
        let mut s = Surfaces::default();
        s.append(SurfaceId::PortScan, "old\n");
        s.clear_and_write(SurfaceId::PortScan, "new\n");
        assert_eq!(s.get(SurfaceId::PortScan).text(), "new\n");
        assert!(s.get(SurfaceId::HashCrack).is_empty());
    }

    #[test]
    fn lines_keep_tones_per_run() {
        let mut surface = OutputSurface::default();
        surface.apply(
            vec![
                Fragment::plain("Scanning port 22... "),
                Fragment::toned("OPEN", Tone::Open),
                Fragment::plain("\nnext"),
            ],
            WriteMode::Append,
        );
        let lines = surface.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0][1], Fragment::toned("OPEN", Tone::Open));
        assert_eq!(lines[1][0].text, "next");
    }
}
