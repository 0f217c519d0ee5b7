//! Relay client configuration
//!
//! Resolution order: defaults → YAML file → `RELAYTERM_*` environment → CLI.
//!
//! ```yaml
//! pageUrl: "https://tracker.example.com"
//! path: "/ws/terminal"
//! resizeDebounceMs: 100
//! initialFitDelayMs: 350
//! connectTimeoutMs: 10000   # optional, no timeout when absent
//! widget:
//!   fontSize: 14
//!   cursorStyle: bar
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RelayError, Result};
use crate::relay::{RelayEndpoint, DEFAULT_RELAY_PATH};
use crate::session::SessionConfig;
use crate::widget::WidgetOptions;

pub const ENV_PAGE_URL: &str = "RELAYTERM_PAGE_URL";
pub const ENV_ENDPOINT: &str = "RELAYTERM_ENDPOINT";
pub const ENV_PATH: &str = "RELAYTERM_PATH";
pub const ENV_RESIZE_DEBOUNCE_MS: &str = "RELAYTERM_RESIZE_DEBOUNCE_MS";
pub const ENV_INITIAL_FIT_DELAY_MS: &str = "RELAYTERM_INITIAL_FIT_DELAY_MS";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "RELAYTERM_CONNECT_TIMEOUT_MS";

/// `~/.relayterm`
pub fn default_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".relayterm")
}

pub fn default_config_path() -> PathBuf {
    default_home().join("config.yaml")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelayConfig {
    /// URL of the page embedding the terminal; the relay shares its host
    pub page_url: String,
    /// Explicit `ws://`/`wss://` relay URL, bypasses `page_url` + `path`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub path: String,
    pub resize_debounce_ms: u64,
    pub initial_fit_delay_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout_ms: Option<u64>,
    pub widget: WidgetOptions,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            page_url: "http://localhost:3000".to_string(),
            endpoint: None,
            path: DEFAULT_RELAY_PATH.to_string(),
            resize_debounce_ms: 100,
            initial_fit_delay_ms: 350,
            connect_timeout_ms: None,
            widget: WidgetOptions::default(),
        }
    }
}

impl RelayConfig {
    /// Load from a YAML file that must exist
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| RelayError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|source| RelayError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from a YAML file, falling back to defaults when it is missing
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Apply `RELAYTERM_*` environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key/value source
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup(ENV_PAGE_URL) {
            self.page_url = v;
        }
        if let Some(v) = lookup(ENV_ENDPOINT) {
            self.endpoint = if v.is_empty() { None } else { Some(v) };
        }
        if let Some(v) = lookup(ENV_PATH) {
            self.path = v;
        }
        if let Some(v) = lookup(ENV_RESIZE_DEBOUNCE_MS) {
            self.resize_debounce_ms = parse_millis(ENV_RESIZE_DEBOUNCE_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_INITIAL_FIT_DELAY_MS) {
            self.initial_fit_delay_ms = parse_millis(ENV_INITIAL_FIT_DELAY_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_CONNECT_TIMEOUT_MS) {
            self.connect_timeout_ms = match v.as_str() {
                "" | "0" | "none" | "off" => None,
                other => Some(parse_millis(ENV_CONNECT_TIMEOUT_MS, other)?),
            };
        }
        Ok(())
    }

    pub fn endpoint(&self) -> Result<RelayEndpoint> {
        match &self.endpoint {
            Some(url) => RelayEndpoint::parse(url),
            None => RelayEndpoint::for_page(&self.page_url, &self.path),
        }
    }

    pub fn session_config(&self) -> Result<SessionConfig> {
        Ok(SessionConfig {
            endpoint: self.endpoint()?,
            widget: self.widget.clone(),
            resize_debounce: Duration::from_millis(self.resize_debounce_ms),
            initial_fit_delay: Duration::from_millis(self.initial_fit_delay_ms),
            connect_timeout: self
                .connect_timeout_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
        })
    }
}

fn parse_millis(key: &str, value: &str) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|_| RelayError::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    use crate::widget::CursorStyle;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        let session = config.session_config().unwrap();
        assert_eq!(session.endpoint.as_str(), "ws://localhost:3000/ws/terminal");
        assert_eq!(session.resize_debounce, Duration::from_millis(100));
        assert_eq!(session.initial_fit_delay, Duration::from_millis(350));
        assert_eq!(session.connect_timeout, None);
    }

    #[test]
    fn test_load_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "pageUrl: https://tracker.example.com/board\nresizeDebounceMs: 150\nconnectTimeoutMs: 8000\nwidget:\n  fontSize: 16\n  cursorStyle: underline"
        )
        .unwrap();

        let config = RelayConfig::load(file.path()).unwrap();
        assert_eq!(config.resize_debounce_ms, 150);
        assert_eq!(config.initial_fit_delay_ms, 350);
        assert_eq!(config.widget.font_size, 16);
        assert_eq!(config.widget.cursor_style, CursorStyle::Underline);

        let session = config.session_config().unwrap();
        assert_eq!(session.endpoint.as_str(), "wss://tracker.example.com/ws/terminal");
        assert_eq!(session.connect_timeout, Some(Duration::from_secs(8)));
    }

    #[test]
    fn test_load_missing_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("config.yaml");
        assert_eq!(RelayConfig::load_or_default(&missing).unwrap(), RelayConfig::default());
        assert!(matches!(
            RelayConfig::load(&missing),
            Err(RelayError::ConfigRead { .. })
        ));

        std::fs::write(&missing, "\n").unwrap();
        assert_eq!(RelayConfig::load(&missing).unwrap(), RelayConfig::default());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "resizeDebounceMs: [not, a, number]").unwrap();
        assert!(matches!(
            RelayConfig::load(file.path()),
            Err(RelayError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_ENDPOINT, "wss://relay.internal/term"),
            (ENV_RESIZE_DEBOUNCE_MS, "250"),
            (ENV_CONNECT_TIMEOUT_MS, "off"),
        ]
        .into_iter()
        .collect();

        let mut config = RelayConfig {
            connect_timeout_ms: Some(1_000),
            ..RelayConfig::default()
        };
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.endpoint().unwrap().as_str(), "wss://relay.internal/term");
        assert_eq!(config.resize_debounce_ms, 250);
        assert_eq!(config.connect_timeout_ms, None);
    }

    #[test]
    fn test_invalid_override() {
        let mut config = RelayConfig::default();
        let err = config
            .apply_overrides(|key| (key == ENV_INITIAL_FIT_DELAY_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidSetting { key, .. } if key == ENV_INITIAL_FIT_DELAY_MS));
    }
}
