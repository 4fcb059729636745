//! Dashboard configuration loaded from `config/grid.toml` and `GRID_*` environment variables.
//!
//! Timings, probabilities and the chat endpoint live here. The chat credential does not: it is
//! read from the process environment when the chat session is created (see [`ChatConfig`]).

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{GridError, GridResult};

/// Environment variable holding the chat service credential.
pub const API_KEY_ENV: &str = "GRID_LLM_API_KEY";
/// Fallback credential variable (OpenRouter's own name).
pub const API_KEY_FALLBACK_ENV: &str = "OPENROUTER_API_KEY";

const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1";

/// Global dashboard configuration.
///
/// | Source | Example |
/// |--------|---------|
/// | `GRID_CONFIG` path (default `config/grid`) | `[scan] open_probability = 0.5` |
/// | Environment, prefix `GRID_`, nested with `__` | `GRID_SCAN__OPEN_PROBABILITY=0.5` |
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub boot: BootSettings,
    #[serde(default)]
    pub rain: RainSettings,
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(default)]
    pub crack: CrackSettings,
    #[serde(default)]
    pub password: PasswordSettings,
    #[serde(default)]
    pub chat: ChatSettings,
}

impl DashboardConfig {
    /// Load config from file and environment. Precedence: env > `GRID_CONFIG` file > defaults.
    pub fn load() -> GridResult<Self> {
        let config_path = std::env::var("GRID_CONFIG").unwrap_or_else(|_| "config/grid".to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Load from an explicit file path (with or without the `.toml` extension).
    pub fn load_from(path: &Path) -> GridResult<Self> {
        let builder = config::Config::builder();
        let with_ext = path.with_extension("toml");
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else if with_ext.exists() {
            builder.add_source(config::File::from(with_ext.as_path()))
        } else {
            builder
        };

        let built = builder
            .add_source(
                config::Environment::with_prefix("GRID")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Self = built.try_deserialize()?;
        if !config.scan.open_probability.is_finite() {
            tracing::warn!(
                value = %config.scan.open_probability,
                "scan.open_probability is not a finite number, using the default"
            );
        }
        Ok(config)
    }
}

/// Boot sequencer timings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootSettings {
    pub char_delay_ms: u64,
    pub pause_min_ms: u64,
    pub pause_max_ms: u64,
    pub ready_delay_ms: u64,
    pub fade_ms: u64,
}

impl Default for BootSettings {
    fn default() -> Self {
        Self {
            char_delay_ms: 30,
            pause_min_ms: 100,
            pause_max_ms: 300,
            ready_delay_ms: 1000,
            fade_ms: 1000,
        }
    }
}

impl BootSettings {
    pub fn char_delay(&self) -> Duration {
        Duration::from_millis(self.char_delay_ms)
    }
}

/// Glyph rain tick and trail settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RainSettings {
    pub tick_ms: u64,
    /// Opacity of the black overlay painted over the previous frame each tick.
    pub fade_alpha: f32,
    /// A column past the bottom resets only when a uniform draw exceeds this.
    pub reset_threshold: f64,
}

impl Default for RainSettings {
    fn default() -> Self {
        Self {
            tick_ms: 30,
            fade_alpha: 0.05,
            reset_threshold: 0.975,
        }
    }
}

impl RainSettings {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

/// Simulated port scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub latency_min_ms: u64,
    pub latency_max_ms: u64,
    pub open_probability: f64,
}

impl ScanSettings {
    /// `open_probability` clamped to `[0, 1]`; non-finite values fall back to the default.
    pub fn verdict_probability(&self) -> f64 {
        if self.open_probability.is_finite() {
            self.open_probability.clamp(0.0, 1.0)
        } else {
            Self::default().open_probability
        }
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            latency_min_ms: 200,
            latency_max_ms: 700,
            open_probability: 0.3,
        }
    }
}

/// Simulated hash cracker narrative delays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrackSettings {
    pub analyze_ms: u64,
    pub brute_force_ms: u64,
    pub found_ms: u64,
}

impl Default for CrackSettings {
    fn default() -> Self {
        Self {
            analyze_ms: 1000,
            brute_force_ms: 3000,
            found_ms: 500,
        }
    }
}

/// Password generator slider bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordSettings {
    pub default_length: usize,
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            default_length: 16,
            min_length: 4,
            max_length: 64,
        }
    }
}

/// Chat endpoint settings (no credentials).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub model: String,
    pub api_url: String,
    pub referer: String,
    pub title: String,
    /// Connect timeout only; an established stream is never timed out.
    pub connect_timeout_secs: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            referer: "https://grid.local".to_string(),
            title: "GRID Dashboard".to_string(),
            connect_timeout_secs: 15,
        }
    }
}

/// Everything the chat transport needs, resolved once at session creation.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
    pub referer: String,
    pub title: String,
    pub connect_timeout: Duration,
}

impl ChatConfig {
    /// Resolve the credential from the environment. `GRID_LLM_MODEL` and `GRID_LLM_API_URL`
    /// override the configured model and endpoint.
    pub fn from_env(settings: &ChatSettings) -> GridResult<Self> {
        let api_key = env_opt_string(API_KEY_ENV)
            .or_else(|| env_opt_string(API_KEY_FALLBACK_ENV))
            .ok_or_else(|| GridError::MissingCredential(API_KEY_ENV.to_string()))?;
        Ok(Self {
            api_key,
            model: env_opt_string("GRID_LLM_MODEL").unwrap_or_else(|| settings.model.clone()),
            api_url: env_opt_string("GRID_LLM_API_URL")
                .unwrap_or_else(|| settings.api_url.clone())
                .trim_end_matches('/')
                .to_string(),
            referer: settings.referer.clone(),
            title: settings.title.clone(),
            connect_timeout: Duration::from_secs(settings.connect_timeout_secs),
        })
    }
}

fn env_opt_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_scripted_timings() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.boot.char_delay_ms, 30);
        assert_eq!(cfg.crack.brute_force_ms, 3000);
        assert!((cfg.scan.open_probability - 0.3).abs() < f64::EPSILON);
        assert_eq!(cfg.password.default_length, 16);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = DashboardConfig::load_from(Path::new("does/not/exist/grid")).unwrap();
        assert_eq!(cfg.rain.tick_ms, 30);
        assert_eq!(cfg.chat.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn toml_file_overrides_defaults_and_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.toml");
        std::fs::write(
            &path,
            "[crack]\nbrute_force_ms = 42\n\n[scan]\nopen_probability = 0.9\nlatency_max_ms = 900\n",
        )
        .unwrap();

        // Extension is optional, matching the `config/grid` default.
        let cfg = DashboardConfig::load_from(&dir.path().join("grid")).unwrap();
        assert_eq!(cfg.crack.brute_force_ms, 42);
        assert_eq!(cfg.crack.analyze_ms, 1000);
        assert!((cfg.scan.open_probability - 0.9).abs() < f64::EPSILON);
        assert_eq!(cfg.scan.latency_max_ms, 900);

        std::env::set_var("GRID_SCAN__OPEN_PROBABILITY", "0.5");
        let cfg = DashboardConfig::load_from(&path);
        std::env::remove_var("GRID_SCAN__OPEN_PROBABILITY");
        let cfg = cfg.unwrap();
        assert!((cfg.scan.open_probability - 0.5).abs() < f64::EPSILON);
        assert_eq!(cfg.scan.latency_max_ms, 900);
        assert_eq!(cfg.crack.brute_force_ms, 42);
    }

    #[test]
    fn non_finite_open_probability_uses_the_default() {
        let nan = ScanSettings { open_probability: f64::NAN, ..ScanSettings::default() };
        assert!((nan.verdict_probability() - 0.3).abs() < f64::EPSILON);
        let inf = ScanSettings { open_probability: f64::INFINITY, ..ScanSettings::default() };
        assert!((inf.verdict_probability() - 0.3).abs() < f64::EPSILON);
        let high = ScanSettings { open_probability: 4.0, ..ScanSettings::default() };
        assert!((high.verdict_probability() - 1.0).abs() < f64::EPSILON);
    }
}
