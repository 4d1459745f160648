//! Configuration for limits, retries and store pruning.
//!
//! Sources are merged in increasing precedence:
//! 1. Bundled defaults (`tollgate.toml`, compiled in)
//! 2. `~/.config/tollgate/tollgate.toml`
//! 3. `./tollgate.toml`
//! 4. `TOLLGATE_*` environment variables, `__` separating nested keys
//! 5. The legacy `ANTHROPIC_RATE_LIMIT` and `FAL_RATE_LIMIT` variables, which
//!    set the `chat` and `image` ceilings
//!
//! The core crates never read any of this; the values are converted into
//! plain [`RateLimit`] and [`RetryPolicy`] values here.

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tollgate_error::{ConfigError, ConfigErrorKind};
use tollgate_rate_limit::{InMemoryCounterStore, RateLimit, SlidingWindowLimiter};
use tollgate_retry::RetryPolicy;
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../tollgate.toml");

/// Per-action request ceiling.
///
/// ```toml
/// [limits.image]
/// max_requests = 8
/// window_seconds = 3600
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_seconds: u64,
}

/// Retry budget and backoff, with delays in (fractional) seconds.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RetryPolicyConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: f64,
    /// Ceiling for any single delay
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: f64,
    /// Growth factor between delays
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_secs() -> f64 {
    1.0
}

fn default_max_delay_secs() -> f64 {
    30.0
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RetryPolicyConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_secs: default_base_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Schedule for [`spawn_pruner`](crate::maintenance::spawn_pruner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PruningConfig {
    /// Seconds between prune passes
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Events older than this many seconds are dropped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizon_secs: Option<u64>,
}

fn default_interval_secs() -> u64 {
    600
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            horizon_secs: None,
        }
    }
}

impl PruningConfig {
    /// Horizon used when none is configured or derivable.
    pub const DEFAULT_HORIZON_SECS: u64 = 3600;

    /// Time between prune passes, never zero.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    /// Age past which events are dropped.
    pub fn horizon(&self) -> Duration {
        Duration::from_secs(self.horizon_secs.unwrap_or(Self::DEFAULT_HORIZON_SECS))
    }
}

/// Complete Tollgate configuration.
///
/// # Example
///
/// ```
/// use tollgate::TollgateConfig;
///
/// let config = TollgateConfig::default();
/// assert_eq!(config.limits["chat"].max_requests, 30);
/// assert_eq!(config.limits["image"].max_requests, 8);
/// assert_eq!(config.retry_policy().unwrap().max_retries(), &3);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TollgateConfig {
    /// Limits keyed by action name
    #[serde(default)]
    pub limits: HashMap<String, RateLimitConfig>,
    /// Retry settings for downstream calls
    #[serde(default)]
    pub retry: RetryPolicyConfig,
    /// Background pruning of the in-memory store
    #[serde(default)]
    pub pruning: PruningConfig,
}

impl Default for TollgateConfig {
    /// The bundled defaults alone.
    fn default() -> Self {
        Self::from_toml_str(DEFAULT_CONFIG).unwrap_or_else(|_| Self {
            limits: HashMap::new(),
            retry: RetryPolicyConfig::default(),
            pruning: PruningConfig::default(),
        })
    }
}

impl TollgateConfig {
    /// Load from every source, highest precedence last.
    ///
    /// A `.env` file in the working directory is read first if present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigErrorKind::Load`] if a source cannot be read and
    /// [`ConfigErrorKind::Parse`] if the merged result does not deserialize.
    #[instrument]
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        debug!("Loading configuration: env > ./tollgate.toml > home > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(config_dir) = dirs::config_dir() {
            let home_config = config_dir.join("tollgate/tollgate.toml");
            debug!(path = %home_config.display(), "Checking user configuration");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("tollgate").required(false))
            .add_source(
                Environment::with_prefix("TOLLGATE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::finish(with_legacy_env(builder)?)
    }

    /// Load a single file without defaults or environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing or malformed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading configuration from file");
        Self::finish(Config::builder().add_source(File::from(path.as_ref())))
    }

    /// Parse TOML text without defaults or environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is malformed.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::finish(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .build()
            .map_err(|e| ConfigError::new(ConfigErrorKind::Load(e.to_string())))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(ConfigErrorKind::Parse(e.to_string())))
    }

    /// Validated limits keyed by action name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigErrorKind::Invalid`] naming the first bad entry.
    pub fn rate_limits(&self) -> Result<HashMap<String, RateLimit>, ConfigError> {
        self.limits
            .iter()
            .map(|(action, limit)| {
                RateLimit::new(limit.max_requests, limit.window_seconds)
                    .map(|rate_limit| (action.clone(), rate_limit))
                    .map_err(|e| {
                        ConfigError::invalid(format!("limits.{}", action), e.kind().to_string())
                    })
            })
            .collect()
    }

    /// Validated retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigErrorKind::Invalid`] for negative or non-finite
    /// delays, and anything [`RetryPolicy::validate`] rejects.
    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        let seconds = |field: &str, value: f64| {
            Duration::try_from_secs_f64(value).map_err(|e| {
                ConfigError::invalid(format!("retry.{}", field), format!("{} ({})", e, value))
            })
        };
        let policy = RetryPolicy::new(
            self.retry.max_retries,
            seconds("base_delay_secs", self.retry.base_delay_secs)?,
            seconds("max_delay_secs", self.retry.max_delay_secs)?,
            self.retry.backoff_multiplier,
        );
        policy.validate()?;
        Ok(policy)
    }

    /// Pruning schedule, with the horizon defaulting to the longest window.
    pub fn pruning(&self) -> PruningConfig {
        PruningConfig {
            horizon_secs: self.pruning.horizon_secs.or_else(|| {
                self.limits
                    .values()
                    .map(|limit| limit.window_seconds)
                    .max()
            }),
            ..self.pruning
        }
    }

    /// A limiter over a fresh in-memory store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any limit is invalid.
    pub fn limiter(&self) -> Result<SlidingWindowLimiter, ConfigError> {
        Ok(SlidingWindowLimiter::new(
            Arc::new(InMemoryCounterStore::new()),
            self.rate_limits()?,
        ))
    }
}

fn with_legacy_env(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    [
        ("ANTHROPIC_RATE_LIMIT", "limits.chat.max_requests"),
        ("FAL_RATE_LIMIT", "limits.image.max_requests"),
    ]
    .into_iter()
    .try_fold(builder, |builder, (var, key)| {
        let value = std::env::var(var).ok();
        if value.is_some() {
            debug!(var, key, "Applying legacy rate limit variable");
        }
        builder
            .set_override_option(key, value)
            .map_err(|e| ConfigError::new(ConfigErrorKind::Load(e.to_string())))
    })
}
