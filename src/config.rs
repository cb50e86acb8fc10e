//! Configuration
//!
//! TOML file with environment variable overrides. CLI flags are applied on
//! top of this by the binary.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub refresh: RefreshConfig,

    #[serde(default)]
    pub map: MapConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Statistics API settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Days of history for the trend chart
    #[serde(default = "default_history_days")]
    pub history_days: u32,
}

fn default_base_url() -> String {
    "https://disease.sh/v3/covid-19".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_history_days() -> u32 {
    120
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            history_days: default_history_days(),
        }
    }
}

/// Periodic refresh. `interval_secs = 0` disables it; `R` still refreshes.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_refresh_interval")]
    pub interval_secs: u64,
}

fn default_refresh_interval() -> u64 {
    600
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_refresh_interval(),
        }
    }
}

/// Basemap settings
#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    /// Directory holding Natural Earth GeoJSON files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_show_labels")]
    pub show_labels: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_show_labels() -> bool {
    true
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            show_labels: default_show_labels(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file; the terminal belongs to the UI
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("covid-tui").join("covid-tui.log"))
        .unwrap_or_else(|| PathBuf::from("covid-tui.log"))
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// An explicit path must load; otherwise try the default locations and
    /// fall back to defaults plus environment.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_with_env(path);
        }

        let candidates = [
            dirs::config_dir().map(|p| p.join("covid-tui").join("config.toml")),
            Some(PathBuf::from("covid-tui.toml")),
        ];

        for path in candidates.iter().flatten() {
            if path.exists() {
                return Self::load_with_env(path);
            }
        }

        let mut config = Config::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to an existing config
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("COVID_TUI_API_URL") {
            self.api.base_url = url;
        }
        if let Some(secs) = var("COVID_TUI_REFRESH_SECS") {
            if let Ok(secs) = secs.parse() {
                self.refresh.interval_secs = secs;
            }
        }
        if let Some(dir) = var("COVID_TUI_DATA_DIR") {
            self.map.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = var("COVID_TUI_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(file) = var("COVID_TUI_LOG_FILE") {
            self.logging.file = PathBuf::from(file);
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# covid-tui configuration
#
# Environment variables override these settings:
# - COVID_TUI_API_URL
# - COVID_TUI_REFRESH_SECS
# - COVID_TUI_DATA_DIR
# - COVID_TUI_LOG_LEVEL
# - COVID_TUI_LOG_FILE

[api]
# disease.sh compatible API root
base_url = "https://disease.sh/v3/covid-19"

# Per-request timeout in seconds
request_timeout_secs = 30

# Days of worldwide history shown in the trend chart
history_days = 120

[refresh]
# Re-fetch everything this often (seconds); 0 disables, R refreshes by hand
interval_secs = 600

[map]
# Natural Earth GeoJSON (ne_110m_coastline.json, ne_50m_borders.json, ...)
data_dir = "data"

# Label the largest markers
show_labels = true

[logging]
# trace, debug, info, warn, error (RUST_LOG wins when set)
level = "info"

# file = "/tmp/covid-tui.log"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://disease.sh/v3/covid-19");
        assert_eq!(config.api.history_days, 120);
        assert_eq!(config.refresh.interval_secs, 600);
        assert!(config.map.show_labels);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_generated_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.map.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[refresh]\ninterval_secs = 0\n[api]\nhistory_days = 30").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.refresh.interval_secs, 0);
        assert_eq!(config.api.history_days, 30);
        assert_eq!(config.api.base_url, default_base_url());
    }

    #[test]
    fn test_bad_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api\nbase_url = ").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = Config::resolve(Some(Path::new("/nonexistent/covid-tui.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("COVID_TUI_API_URL", "http://localhost:3000/v3/covid-19"),
            ("COVID_TUI_REFRESH_SECS", "60"),
            ("COVID_TUI_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.api.base_url, "http://localhost:3000/v3/covid-19");
        assert_eq!(config.refresh.interval_secs, 60);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.map.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_unparsable_refresh_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|k| (k == "COVID_TUI_REFRESH_SECS").then(|| "soon".to_string()));
        assert_eq!(config.refresh.interval_secs, 600);
    }
}
