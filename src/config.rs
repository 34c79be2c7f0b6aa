use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const FALLBACK_REFRESH: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub endpoint: String,
    pub listen: String,
    #[serde(default)]
    pub refresh_rate: Option<RefreshHint>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_watchdog_interval_ms")]
    pub watchdog_interval_ms: u64,
    #[serde(default = "default_recent_success_window_ms")]
    pub recent_success_window_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Refresh hint in seconds. Accepted as a YAML number or as text such as
/// `"3"` or `"3s"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RefreshHint {
    Seconds(i64),
    Text(String),
}

impl RefreshHint {
    pub fn seconds(&self) -> Option<i64> {
        match self {
            Self::Seconds(secs) => Some(*secs),
            Self::Text(text) => leading_integer(text),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse YAML in {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    Validation(String),
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        let cfg: Config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path_display,
            source,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigError::Validation("endpoint is required".to_string()));
        }
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError::Validation(
                "endpoint must be an http:// or https:// URL".to_string(),
            ));
        }
        if self.listen.trim().is_empty() {
            return Err(ConfigError::Validation("listen is required".to_string()));
        }
        if SocketAddr::from_str(&self.listen).is_err() {
            return Err(ConfigError::Validation(
                "listen must be a valid host:port address".to_string(),
            ));
        }
        for (name, value) in [
            ("timeout_ms", self.timeout_ms),
            ("watchdog_interval_ms", self.watchdog_interval_ms),
            ("recent_success_window_ms", self.recent_success_window_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation(format!("{name} must be > 0")));
            }
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user_agent must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Poll period derived from the refresh hint. Missing, non-numeric or
    /// non-positive hints fall back to 2 seconds.
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_rate
            .as_ref()
            .and_then(RefreshHint::seconds)
            .filter(|secs| *secs > 0)
            .map(|secs| Duration::from_millis((secs as u64).saturating_mul(1000)))
            .unwrap_or(FALLBACK_REFRESH)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog_interval_ms)
    }

    pub fn recent_success_window(&self) -> Duration {
        Duration::from_millis(self.recent_success_window_ms)
    }

    pub fn example_yaml() -> &'static str {
        include_str!("../config.yaml.example")
    }
}

/// Integer prefix of `text` after leading whitespace, with an optional sign.
fn leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let digits = rest
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, c)| &rest[..i + c.len_utf8()])?;
    digits.parse::<i64>().ok().map(|v| v * sign)
}

const fn default_timeout_ms() -> u64 {
    10_000
}

const fn default_watchdog_interval_ms() -> u64 {
    5_000
}

const fn default_recent_success_window_ms() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    format!("dashpoll/{}", env!("CARGO_PKG_VERSION"))
}
