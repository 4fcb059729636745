//! Simulated port scanner: randomized latency and open/closed verdicts, no network I/O.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ScanSettings;
use crate::error::{GridError, GridResult};
use crate::terminal::{Fragment, SurfaceId, TerminalWriter, Tone, WriteMode};

const SURFACE: SurfaceId = SurfaceId::PortScan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Open,
    Closed,
}

impl Verdict {
    pub fn label(self) -> &'static str {
        match self {
            Verdict::Open => "OPEN",
            Verdict::Closed => "CLOSED",
        }
    }

    fn tone(self) -> Tone {
        match self {
            Verdict::Open => Tone::Open,
            Verdict::Closed => Tone::Closed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortVerdict {
    /// Port token exactly as entered (trimmed); not validated as numeric.
    pub port: String,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub target: String,
    pub verdicts: Vec<PortVerdict>,
}


/// Split a comma-delimited port list, trimming tokens and dropping empty ones.
pub fn parse_ports(ports: &str) -> Vec<String> {
    ports
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct PortScanner<R> {
    settings: ScanSettings,
    rng: R,
}

impl<R: Rng + Send> PortScanner<R> {
    pub fn new(settings: ScanSettings, rng: R) -> Self {
        Self { settings, rng }
    }

    /// Run a scan against `target` for every token in `ports`.
    ///
    /// Empty target or port list: one error line, no scan, `Err(MissingInput)`.
    /// Whitespace counts as input; the target is trimmed for display only.
    pub async fn run<W>(&mut self, target: &str, ports: &str, out: &mut W) -> GridResult<ScanReport>
    where
        W: TerminalWriter + Send,
    {
        if target.is_empty() || ports.is_empty() {
            let err = GridError::MissingInput("Target and Port Range must be specified.".to_string());
            out.write(SURFACE, vec![Fragment::toned(format!("{}\n", err), Tone::Error)], WriteMode::Append);
            return Err(err);
        }

        let target = target.trim();
        let tokens = parse_ports(ports);
        tracing::info!(target = %target, ports = tokens.len(), "simulated port scan started");
        out.clear_and_write(SURFACE, &format!("> Starting scan on {}...\n\n", target));

        let mut verdicts = Vec::with_capacity(tokens.len());
        for port in tokens {
            tokio::time::sleep(self.next_latency()).await;
            let verdict = self.next_verdict();
            out.write(
                SURFACE,
                vec![
                    Fragment::plain(format!("Scanning port {}... ", port)),
                    Fragment::toned(verdict.label(), verdict.tone()),
                    Fragment::plain("\n"),
                ],
                WriteMode::Append,
            );
            verdicts.push(PortVerdict { port, verdict });
        }

        out.append(SURFACE, "\n> Scan complete.");
        tracing::debug!(target = %target, scanned = verdicts.len(), "simulated port scan complete");
        Ok(ScanReport { target: target.to_string(), verdicts })
    }

    fn next_latency(&mut self) -> Duration {
        let (min, max) = (self.settings.latency_min_ms, self.settings.latency_max_ms);
        let ms = if max > min { self.rng.gen_range(min..max) } else { min };
        Duration::from_millis(ms)
    }

    fn next_verdict(&mut self) -> Verdict {
        if self.rng.gen_bool(self.settings.verdict_probability()) {
            Verdict::Open
        } else {
            Verdict::Closed
        }
    }
}
