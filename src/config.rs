use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use texo_core::DurationEstimator;

/// Configuration for the Texo story viewer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote story service settings
    pub service: ServiceConfig,

    /// Job status polling settings
    pub polling: PollingConfig,

    /// Slideshow playback settings
    pub playback: PlaybackConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the story service, e.g. `http://127.0.0.1:8000`
    pub base_url: String,

    /// Timeout for a single HTTP request (seconds)
    pub request_timeout_secs: u64,

    /// Connection timeout (seconds)
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between job status requests (milliseconds)
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Progress tick interval (milliseconds)
    pub tick_interval_ms: u64,

    /// Minimum time a page stays on screen (milliseconds)
    pub min_page_duration_ms: u64,

    /// Reading time granted per word (milliseconds)
    pub ms_per_word: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when RUST_LOG is unset
    pub level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_secs: 60, // audio uploads can be slow
            connect_timeout_secs: 10,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_ms: 2_000 }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            min_page_duration_ms: texo_core::MIN_PAGE_DURATION_MS,
            ms_per_word: texo_core::MS_PER_WORD,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Base URL without a trailing slash, so paths can be appended directly
    pub fn api_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl PlaybackConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn estimator(&self) -> DurationEstimator {
        DurationEstimator::new(self.min_page_duration_ms, self.ms_per_word)
    }
}

impl Config {
    /// Standard config file locations, in search order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("texo-viewer.toml"),
            PathBuf::from("config/texo-viewer.toml"),
        ];
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(PathBuf::from(home).join(".config/texo-viewer/config.toml"));
        }
        paths
    }

    /// Load configuration from the first config file found, then apply environment overrides
    pub fn load() -> Result<Self> {
        Self::load_first(&Self::search_paths())
    }

    /// Load the first existing file in `paths`. A file that exists but does not
    /// parse is an error rather than a silent fallback to defaults.
    pub fn load_first(paths: &[PathBuf]) -> Result<Self> {
        match paths.iter().find(|path| path.exists()) {
            Some(path) => Ok(Self::load_from(path)?.with_env_overrides()),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::from_env())
            }
        }
    }

    /// Load configuration from a specific TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Defaults with environment variable overrides
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `TEXO_*` environment variables on top of this configuration
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("TEXO_API_URL") {
            if !url.trim().is_empty() {
                self.service.base_url = url;
            }
        }

        if let Ok(interval) = std::env::var("TEXO_POLL_INTERVAL_MS") {
            match interval.parse() {
                Ok(ms) => self.polling.interval_ms = ms,
                Err(_) => tracing::warn!("Ignoring invalid TEXO_POLL_INTERVAL_MS: {}", interval),
            }
        }

        if let Ok(level) = std::env::var("TEXO_LOG_LEVEL") {
            self.logging.level = level;
        }

        self
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(self.service.api_url())
            .with_context(|| format!("invalid service base_url: {}", self.service.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!("service base_url must be http or https, got {}", url.scheme()));
        }

        if self.polling.interval_ms == 0 {
            return Err(anyhow!("polling interval_ms must be greater than 0"));
        }

        if self.playback.tick_interval_ms == 0 {
            return Err(anyhow!("playback tick_interval_ms must be greater than 0"));
        }

        if self.playback.min_page_duration_ms == 0 {
            return Err(anyhow!("playback min_page_duration_ms must be greater than 0"));
        }

        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Texo Viewer Configuration:\n\
            - Service: {}\n\
            - Poll Interval: {}ms\n\
            - Tick Interval: {}ms\n\
            - Page Duration: max({}ms, words x {}ms)\n\
            - Log Level: {}",
            self.service.api_url(),
            self.polling.interval_ms,
            self.playback.tick_interval_ms,
            self.playback.min_page_duration_ms,
            self.playback.ms_per_word,
            self.logging.level
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.service.base_url = url.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config.polling.interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.config.playback.tick_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.service.request_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
