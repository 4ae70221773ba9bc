//! TOML Configuration File Support
//!
//! Configuration for the feed engine and its driver, read from
//! `$XDG_CONFIG_HOME/feeder/feeder.toml` (typically `~/.config/feeder/feeder.toml`).
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables (`FEEDER_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [progress]
//! show_delay_ms = 750
//! min_visible_ms = 500
//!
//! [feed]
//! url = "https://example.com/api/feed"
//! refresh_on_start = true
//! favorites_only = false
//! request_timeout_ms = 10000
//! ```
//!
//! The id token is deliberately absent from the file format; it is read from
//! `FEEDER_ID_TOKEN` only.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Filters;
use crate::progress_latch::LatchConfig;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where the effective configuration came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[progress]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressToml {
    /// Loading time before the indicator appears, in milliseconds
    pub show_delay_ms: Option<u64>,

    /// Minimum time the indicator stays visible, in milliseconds
    pub min_visible_ms: Option<u64>,
}

/// `[feed]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedToml {
    /// Feed endpoint
    pub url: Option<String>,

    /// Whether to load the feed as soon as the view model starts
    pub refresh_on_start: Option<bool>,

    /// Initial favorites-only filter
    pub favorites_only: Option<bool>,

    /// HTTP request timeout in milliseconds
    pub request_timeout_ms: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeederToml {
    /// Progress indicator section
    pub progress: ProgressToml,

    /// Feed section
    pub feed: FeedToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved configuration
///
/// Use [`load_config`] to load it with proper priority handling.
#[derive(Clone, Debug)]
pub struct FeederConfig {
    /// Loading time before the progress indicator appears
    pub show_delay: Duration,

    /// Minimum time the progress indicator stays visible
    pub min_visible: Duration,

    /// Feed endpoint; `None` when no remote feed is configured
    pub feed_url: Option<String>,

    /// Bearer token for the feed endpoint
    pub id_token: Option<String>,

    /// Whether to load the feed on start
    pub refresh_on_start: bool,

    /// Initial favorites-only filter
    pub favorites_only: bool,

    /// HTTP request timeout
    pub request_timeout: Duration,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for FeederConfig {
    fn default() -> Self {
        let latch = LatchConfig::default();
        Self {
            show_delay: latch.show_delay,
            min_visible: latch.min_visible,
            feed_url: None,
            id_token: None,
            refresh_on_start: true,
            favorites_only: false,
            request_timeout: Duration::from_secs(10),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl FeederConfig {
    /// Create a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest-priority source that contributed a value
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Progress latch timing
    #[must_use]
    pub fn latch_config(&self) -> LatchConfig {
        LatchConfig::default()
            .with_show_delay(self.show_delay)
            .with_min_visible(self.min_visible)
    }

    /// Filters the view starts with
    #[must_use]
    pub fn initial_filters(&self) -> Filters {
        Filters {
            favorites_only: self.favorites_only,
        }
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for a zero request timeout or
    /// an empty feed URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "request_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.feed_url.as_deref().is_some_and(|url| url.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "feed url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/feeder/feeder.toml` or
/// `~/.config/feeder/feeder.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("feeder").join("feeder.toml"))
}

/// Load configuration from the default path, then the environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if the
/// result fails validation. A missing config file is not an error.
pub fn load_config() -> Result<FeederConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path, then the environment
///
/// With `None`, only defaults and environment variables are used.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed, or if the
/// result fails validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<FeederConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Load from `path`, reading overrides through `lookup` instead of the process environment
fn load_config_with(
    path: Option<PathBuf>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<FeederConfig, ConfigError> {
    let mut config = FeederConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: FeederToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, lookup);
    config.validate()?;

    Ok(config)
}

fn apply_toml_config(config: &mut FeederConfig, toml: &FeederToml) {
    if let Some(ms) = toml.progress.show_delay_ms {
        config.show_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.progress.min_visible_ms {
        config.min_visible = Duration::from_millis(ms);
    }

    if toml.feed.url.is_some() {
        config.feed_url = toml.feed.url.clone();
    }
    if let Some(enabled) = toml.feed.refresh_on_start {
        config.refresh_on_start = enabled;
    }
    if let Some(enabled) = toml.feed.favorites_only {
        config.favorites_only = enabled;
    }
    if let Some(ms) = toml.feed.request_timeout_ms {
        config.request_timeout = Duration::from_millis(ms);
    }
}

fn parse_flag(value: &str) -> bool {
    value != "0" && !value.eq_ignore_ascii_case("false")
}

/// Apply `FEEDER_*` overrides; `lookup` reads a variable by name
fn apply_env_config(config: &mut FeederConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("FEEDER_FEED_URL") {
        config.feed_url = Some(url);
        config.source = ConfigSource::Env;
    }
    if let Some(token) = lookup("FEEDER_ID_TOKEN") {
        config.id_token = Some(token);
        config.source = ConfigSource::Env;
    }
    if let Some(delay) = lookup("FEEDER_SHOW_DELAY_MS") {
        if let Ok(ms) = delay.parse::<u64>() {
            config.show_delay = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(visible) = lookup("FEEDER_MIN_VISIBLE_MS") {
        if let Ok(ms) = visible.parse::<u64>() {
            config.min_visible = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(enabled) = lookup("FEEDER_REFRESH_ON_START") {
        config.refresh_on_start = parse_flag(&enabled);
        config.source = ConfigSource::Env;
    }
    if let Some(enabled) = lookup("FEEDER_FAVORITES_ONLY") {
        config.favorites_only = parse_flag(&enabled);
        config.source = ConfigSource::Env;
    }
    if let Some(timeout) = lookup("FEEDER_REQUEST_TIMEOUT_MS") {
        if let Ok(ms) = timeout.parse::<u64>() {
            config.request_timeout = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Feed URL override
    pub feed_url: Option<String>,

    /// Favorites-only filter override
    pub favorites_only: Option<bool>,

    /// Refresh-on-start override
    pub refresh_on_start: Option<bool>,

    /// Show delay override (milliseconds)
    pub show_delay_ms: Option<u64>,

    /// Minimum visible time override (milliseconds)
    pub min_visible_ms: Option<u64>,
}

impl ConfigOverrides {
    /// Create an empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set feed URL override
    #[must_use]
    pub fn with_feed_url(mut self, url: String) -> Self {
        self.feed_url = Some(url);
        self
    }

    /// Set favorites-only override
    #[must_use]
    pub fn with_favorites_only(mut self, enabled: bool) -> Self {
        self.favorites_only = Some(enabled);
        self
    }

    /// Set refresh-on-start override
    #[must_use]
    pub fn with_refresh_on_start(mut self, enabled: bool) -> Self {
        self.refresh_on_start = Some(enabled);
        self
    }

    /// Set show delay override
    #[must_use]
    pub fn with_show_delay_ms(mut self, ms: u64) -> Self {
        self.show_delay_ms = Some(ms);
        self
    }

    /// Set minimum visible time override
    #[must_use]
    pub fn with_min_visible_ms(mut self, ms: u64) -> Self {
        self.min_visible_ms = Some(ms);
        self
    }

    fn is_empty(&self) -> bool {
        self.feed_url.is_none()
            && self.favorites_only.is_none()
            && self.refresh_on_start.is_none()
            && self.show_delay_ms.is_none()
            && self.min_visible_ms.is_none()
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut FeederConfig) {
        if !self.is_empty() {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref url) = self.feed_url {
            config.feed_url = Some(url.clone());
        }
        if let Some(enabled) = self.favorites_only {
            config.favorites_only = enabled;
        }
        if let Some(enabled) = self.refresh_on_start {
            config.refresh_on_start = enabled;
        }
        if let Some(ms) = self.show_delay_ms {
            config.show_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.min_visible_ms {
            config.min_visible = Duration::from_millis(ms);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn write_toml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn parse(content: &str) -> FeederConfig {
        let toml: FeederToml = toml::from_str(content).unwrap();
        let mut config = FeederConfig::default();
        apply_toml_config(&mut config, &toml);
        config
    }

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = FeederConfig::default();

        assert_eq!(config.show_delay, Duration::from_millis(750));
        assert_eq!(config.min_visible, Duration::from_millis(500));
        assert_eq!(config.feed_url, None);
        assert!(config.refresh_on_start);
        assert!(!config.favorites_only);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("feeder/feeder.toml"));
        }
    }

    // =========================================================================
    // TOML Parsing
    // =========================================================================

    #[test]
    fn test_parse_full_toml() {
        let config = parse(
            r#"
            [progress]
            show_delay_ms = 300
            min_visible_ms = 1000

            [feed]
            url = "https://example.com/feed"
            refresh_on_start = false
            favorites_only = true
            request_timeout_ms = 2500
            "#,
        );

        assert_eq!(config.show_delay, Duration::from_millis(300));
        assert_eq!(config.min_visible, Duration::from_millis(1000));
        assert_eq!(config.feed_url.as_deref(), Some("https://example.com/feed"));
        assert!(!config.refresh_on_start);
        assert!(config.favorites_only);
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert!(config.initial_filters().favorites_only);
        assert_eq!(config.latch_config().show_delay, Duration::from_millis(300));
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = parse("[progress]\nshow_delay_ms = 100\n");

        assert_eq!(config.show_delay, Duration::from_millis(100));
        assert_eq!(config.min_visible, Duration::from_millis(500));
        assert!(config.refresh_on_start);
    }

    #[test]
    fn test_load_from_file() {
        let file = write_toml("[feed]\nfavorites_only = true\n");

        let config = load_config_with(Some(file.path().to_path_buf()), env(&[])).unwrap();

        assert_eq!(config.config_file_path.as_deref(), Some(file.path()));
        assert_eq!(config.source(), ConfigSource::File);
        assert!(config.favorites_only);
    }

    #[test]
    fn test_env_applied_after_file() {
        let file = write_toml("[feed]\nrequest_timeout_ms = 2500\n");

        let config = load_config_with(
            Some(file.path().to_path_buf()),
            env(&[("FEEDER_REQUEST_TIMEOUT_MS", "4000")]),
        )
        .unwrap();

        assert_eq!(config.request_timeout, Duration::from_millis(4000));
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_missing_file_graceful() {
        let config = load_config_with(
            Some(PathBuf::from("/nonexistent/feeder/feeder.toml")),
            env(&[]),
        )
        .unwrap();
        assert_eq!(config.config_file_path, None);
    }

    #[test]
    fn test_malformed_toml_error() {
        let file = write_toml("[progress\nshow_delay_ms = ");

        let result = load_config_with(Some(file.path().to_path_buf()), env(&[]));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let file = write_toml("[feed]\nrequest_timeout_ms = 0\n");

        let result = load_config_with(Some(file.path().to_path_buf()), env(&[]));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));

        // An ambient override cannot mask the file value here.
        let result = load_config_with(
            Some(file.path().to_path_buf()),
            env(&[("FEEDER_SHOW_DELAY_MS", "100")]),
        );
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    // =========================================================================
    // Environment and CLI
    // =========================================================================

    #[test]
    fn test_env_overrides_file() {
        let mut config = parse("[feed]\nurl = \"https://file\"\nfavorites_only = true\n");

        apply_env_config(
            &mut config,
            env(&[
                ("FEEDER_FEED_URL", "https://env"),
                ("FEEDER_ID_TOKEN", "token"),
                ("FEEDER_FAVORITES_ONLY", "false"),
                ("FEEDER_SHOW_DELAY_MS", "200"),
            ]),
        );

        assert_eq!(config.feed_url.as_deref(), Some("https://env"));
        assert_eq!(config.id_token.as_deref(), Some("token"));
        assert!(!config.favorites_only);
        assert_eq!(config.show_delay, Duration::from_millis(200));
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_unparseable_env_is_ignored() {
        let mut config = FeederConfig::default();
        apply_env_config(&mut config, env(&[("FEEDER_MIN_VISIBLE_MS", "soon")]));

        assert_eq!(config.min_visible, Duration::from_millis(500));
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut config = FeederConfig::default();
        apply_env_config(&mut config, env(&[("FEEDER_FEED_URL", "https://env")]));

        ConfigOverrides::new()
            .with_feed_url("https://cli".to_string())
            .with_refresh_on_start(false)
            .with_min_visible_ms(50)
            .apply(&mut config);

        assert_eq!(config.feed_url.as_deref(), Some("https://cli"));
        assert!(!config.refresh_on_start);
        assert_eq!(config.min_visible, Duration::from_millis(50));
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_empty_overrides_keep_source() {
        let mut config = FeederConfig::default();
        ConfigOverrides::new().apply(&mut config);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_empty_feed_url_rejected() {
        let config = FeederConfig {
            feed_url: Some("  ".to_string()),
            ..FeederConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Cli.to_string(), "CLI");
        assert_eq!(ConfigSource::Env.to_string(), "environment");
        assert_eq!(ConfigSource::File.to_string(), "config file");
        assert_eq!(ConfigSource::Default.to_string(), "default");
    }
}
