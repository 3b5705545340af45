//! Watcher configuration.
//!
//! Configuration is read once, before any network activity, into an
//! immutable [`WatcherConfig`] that the cycle borrows. Any failure here is
//! fatal; nothing else in the crate can stop a cycle.
//!
//! # Example
//!
//! ```yaml
//! volcview:
//!   status_path: /api/imageApi/getImageStatus
//!   watchers: [ops@example.org]
//!   max_age_hours: 12
//!   mirrors:
//!     avo1: https://avo1.example.org
//!     avo2: https://avo2.example.org
//! sensors:
//!   - name: MODIS
//!     url: https://gina.example.org/modis/
//!     limit: 6
//!     watchers: [sat@example.org]
//!     source: GINA
//!     processing_step: terascan processing on avors2
//! notifier:
//!   kind: webhook
//!   url: https://relay.example.org/alerts
//! http:
//!   timeout_secs: 30
//!   max_concurrent_fetches: 4
//! ```
//!
//! Values can be overridden from the environment with the `PRODUCT_WATCHER_`
//! prefix and `__` between nested keys, e.g.
//! `PRODUCT_WATCHER_HTTP__TIMEOUT_SECS=10`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

use productwatch_types::SensorVariant;

/// Environment variable naming the configuration file.
pub const CONFIG_FILE_ENV: &str = "PRODUCT_WATCHER_CONFIG";

const ENV_PREFIX: &str = "PRODUCT_WATCHER";

/// Fatal configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The source could not be read or parsed.
    #[error("cannot load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The configuration parsed but makes no sense.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Complete watcher configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WatcherConfig {
    pub volcview: VolcviewConfig,
    #[serde(default)]
    pub sensors: Vec<SensorConfig>,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Downstream status service settings.
#[derive(Debug, Clone, Deserialize)]
pub struct VolcviewConfig {
    /// Path appended to each mirror's base URL.
    pub status_path: String,
    /// Mirror identifier to base URL.
    #[serde(default)]
    pub mirrors: BTreeMap<String, String>,
    /// Who hears about mirror failures.
    #[serde(default)]
    pub watchers: Vec<String>,
    /// Alert when a mirror's freshest image is older than this.
    #[serde(default)]
    pub max_age_hours: Option<f64>,
}

/// One watched sensor.
#[derive(Debug, Clone, Deserialize)]
pub struct SensorConfig {
    pub name: SensorVariant,
    /// Upstream listing URL.
    #[serde(alias = "url")]
    pub upstream_url: String,
    /// Maximum acceptable age in hours before escalating.
    #[serde(alias = "limit")]
    pub threshold_hours: f64,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, alias = "watchers")]
    pub recipients: Vec<String>,
    /// Description of the upstream source, e.g. "GINA".
    #[serde(default)]
    pub source: Option<String>,
    /// Local processing step to blame for a stall.
    #[serde(default)]
    pub processing_step: Option<String>,
}

impl SensorConfig {
    /// Upstream description for messages.
    pub fn source_label(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.upstream_url)
    }

    /// Processing step description for messages.
    pub fn processing_label(&self) -> &str {
        self.processing_step.as_deref().unwrap_or("local processing")
    }
}

/// How alerts leave the process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NotifierConfig {
    /// Log alerts only.
    #[default]
    Log,
    /// POST alerts to a relay.
    Webhook { url: String },
}

/// Network limits.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_fetches() -> usize {
    4
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

impl HttpConfig {
    /// Timeout applied to every request.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl WatcherConfig {
    /// Load from a file (format chosen by extension) plus environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path))
            .add_source(environment())
            .build()?;

        Self::from_config(config)
    }

    /// Parse from an in-memory document.
    pub fn parse(content: &str, format: FileFormat) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(content, format))
            .build()?;

        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let watcher: WatcherConfig = config.try_deserialize()?;
        watcher.validate()?;
        Ok(watcher)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.volcview.mirrors.is_empty() {
            return Err(invalid("volcview.mirrors must name at least one mirror"));
        }

        if let Some(max_age) = self.volcview.max_age_hours {
            if !max_age.is_finite() || max_age < 0.0 {
                return Err(invalid(format!(
                    "volcview.max_age_hours must be a non-negative number, got {}",
                    max_age
                )));
            }
        }

        let mut seen = BTreeSet::new();
        for sensor in &self.sensors {
            if !seen.insert(sensor.name) {
                return Err(invalid(format!("sensor {} is configured twice", sensor.name)));
            }
            if !sensor.threshold_hours.is_finite() || sensor.threshold_hours < 0.0 {
                return Err(invalid(format!(
                    "sensor {} threshold must be a non-negative number, got {}",
                    sensor.name, sensor.threshold_hours
                )));
            }
            if sensor.upstream_url.trim().is_empty() && !sensor.disabled {
                return Err(invalid(format!("sensor {} has no upstream url", sensor.name)));
            }
        }

        if self.http.max_concurrent_fetches == 0 {
            return Err(invalid("http.max_concurrent_fetches must be at least 1"));
        }
        if self.http.timeout_secs == 0 {
            return Err(invalid("http.timeout_secs must be at least 1"));
        }

        if let NotifierConfig::Webhook { url } = &self.notifier {
            if url.trim().is_empty() {
                return Err(invalid("notifier.url must not be empty"));
            }
        }

        Ok(())
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}
