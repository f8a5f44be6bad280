//! Configuration types for Ephemeral
//!
//! Settings come from (lowest to highest precedence) built-in defaults, an
//! optional TOML file and the process environment. The six settings below are
//! required and read from unprefixed variables:
//!
//! - `TWITTER_CONSUMER_KEY`, `TWITTER_CONSUMER_SECRET`
//! - `TWITTER_ACCESS_TOKEN`, `TWITTER_ACCESS_TOKEN_SECRET`
//! - `MAX_TWEET_AGE` (duration such as `720h` or `30days`)
//! - `TWEPOCH` (date, `YYYY-MM-DD`)
//!
//! Everything else is optional and read from `EPHEMERAL_`-prefixed variables,
//! with `__` separating nested keys (`EPHEMERAL_API__BASE_URL`).

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{EphemeralError, Result};
use crate::retention::{RetentionPolicy, parse_epoch};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "ephemeral.toml";

/// Largest page the timeline endpoint will return
pub const MAX_PAGE_SIZE: u32 = 200;

const REQUIRED_VARS: [&str; 6] = [
    "TWITTER_CONSUMER_KEY",
    "TWITTER_CONSUMER_SECRET",
    "TWITTER_ACCESS_TOKEN",
    "TWITTER_ACCESS_TOKEN_SECRET",
    "MAX_TWEET_AGE",
    "TWEPOCH",
];

/// Main configuration, built once at startup
#[derive(Debug, Clone)]
pub struct EphemeralConfig {
    /// API credentials
    pub credentials: Credentials,

    /// Epoch and maximum age
    pub policy: RetentionPolicy,

    /// API endpoint settings
    pub api: ApiConfig,
}

/// OAuth 1.0a credentials for the timeline API
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl Credentials {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            access_token: access_token.into(),
            access_token_secret: access_token_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

/// Timeline API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API root, without the version segment
    pub base_url: String,

    /// HTTP request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Number of recent posts fetched per run (1..=200)
    pub page_size: u32,

    /// Include reposts in the fetched page
    pub include_reposts: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.twitter.com".to_string(),
            timeout: Duration::from_secs(30),
            page_size: MAX_PAGE_SIZE,
            include_reposts: true,
        }
    }
}

impl ApiConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Flat view of every source, before validation.
#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default, deserialize_with = "lenient_string")]
    twitter_consumer_key: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    twitter_consumer_secret: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    twitter_access_token: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    twitter_access_token_secret: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    max_tweet_age: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    twepoch: Option<String>,

    #[serde(default)]
    strict_max_age: bool,

    #[serde(default)]
    api: ApiConfig,
}

/// A TOML file may spell a secret as a bare number. Accept any scalar and
/// keep its textual form.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Str(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|value| match value {
        Scalar::Str(s) => s,
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Bool(b) => b.to_string(),
    }))
}

impl RawSettings {
    fn required(&self, name: &str) -> Result<String> {
        let value = match name {
            "TWITTER_CONSUMER_KEY" => &self.twitter_consumer_key,
            "TWITTER_CONSUMER_SECRET" => &self.twitter_consumer_secret,
            "TWITTER_ACCESS_TOKEN" => &self.twitter_access_token,
            "TWITTER_ACCESS_TOKEN_SECRET" => &self.twitter_access_token_secret,
            "MAX_TWEET_AGE" => &self.max_tweet_age,
            "TWEPOCH" => &self.twepoch,
            _ => &None,
        };

        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                EphemeralError::Configuration(format!(
                    "missing required environment variable {}",
                    name
                ))
            })
    }
}

impl EphemeralConfig {
    /// Load configuration from file and environment variables.
    ///
    /// Loads in this order:
    /// 1. Default configuration
    /// 2. Configuration file (`ephemeral.toml` or path from `EPHEMERAL_CONFIG_PATH`)
    /// 3. Environment variable overrides
    ///
    /// # Errors
    ///
    /// Returns an error if a required setting is missing, the epoch is not a
    /// valid date, or `max_age` is invalid while strict mode is enabled.
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment())
    }

    /// The provider chain used by [`load`](Self::load).
    pub fn figment() -> Figment {
        let path = std::env::var("EPHEMERAL_CONFIG_PATH")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        Figment::new()
            .merge(Toml::file(path))
            .merge(Serialized::defaults(required_from_env()))
            .merge(Env::prefixed("EPHEMERAL_").split("__"))
    }

    /// Extract and validate configuration from any figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let raw: RawSettings = figment.extract().map_err(|e| {
            EphemeralError::Configuration(format!("Failed to load configuration: {}", e))
        })?;

        let credentials = Credentials::new(
            raw.required("TWITTER_CONSUMER_KEY")?,
            raw.required("TWITTER_CONSUMER_SECRET")?,
            raw.required("TWITTER_ACCESS_TOKEN")?,
            raw.required("TWITTER_ACCESS_TOKEN_SECRET")?,
        );
        let max_age = parse_max_age(&raw.required("MAX_TWEET_AGE")?, raw.strict_max_age)?;
        let epoch = parse_epoch(&raw.required("TWEPOCH")?)?;

        let config = Self {
            credentials,
            policy: RetentionPolicy::new(epoch, max_age),
            api: raw.api,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.api.page_size) {
            return Err(EphemeralError::Configuration(format!(
                "api.page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.api.page_size
            )));
        }

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(EphemeralError::Configuration(format!(
                "api.base_url must be an http(s) URL, got {}",
                self.api.base_url
            )));
        }

        Ok(())
    }
}

/// Required variables as raw strings.
///
/// figment's `Env` provider parses values, which would turn a key like `0123`
/// into the number `123`.
fn required_from_env() -> BTreeMap<String, String> {
    REQUIRED_VARS
        .iter()
        .filter_map(|name| {
            std::env::var(name)
                .ok()
                .map(|value| (name.to_ascii_lowercase(), value))
        })
        .collect()
}

/// Parse the maximum post age.
///
/// An unparsable value falls back to zero, which makes every post after the
/// epoch eligible for deletion. With `strict` set it is an error instead.
pub fn parse_max_age(value: &str, strict: bool) -> Result<Duration> {
    match humantime::parse_duration(value.trim()) {
        Ok(duration) => Ok(duration),
        Err(e) if strict => Err(EphemeralError::Configuration(format!(
            "Error parsing MAX_TWEET_AGE {:?}: {}",
            value, e
        ))),
        Err(e) => {
            tracing::warn!(
                max_tweet_age = %value,
                error = %e,
                "Unparsable MAX_TWEET_AGE, using zero: every post after the epoch will be deleted"
            );
            Ok(Duration::ZERO)
        }
    }
}
