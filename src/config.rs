use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{BookError, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Client-side settings for talking to the book generation backend.
///
/// Use [`ClientConfig::builder()`] for ergonomic construction,
/// [`ClientConfig::from_env()`] to read `BOOKGEN_*` variables, or
/// [`ClientConfig::default()`] for a local backend polled every two seconds.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend; the `/api/book/...` paths are appended to it.
    pub base_url: String,

    /// Delay between two status checks.
    pub poll_interval: Duration,

    /// Maximum number of status checks per job. `None` = unbounded.
    pub max_polls: Option<u32>,

    /// Maximum wall-clock time spent polling one job. `None` = unbounded.
    pub poll_timeout: Option<Duration>,

    /// Per-request timeout for every HTTP call.
    pub request_timeout: Duration,

    /// Directory downloaded books are written to.
    pub output_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            poll_interval: Duration::from_secs(2),
            max_polls: None,
            poll_timeout: None,
            request_timeout: Duration::from_secs(30),
            output_dir: PathBuf::from("."),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Build a config from `BOOKGEN_*` environment variables, falling back
    /// to the defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("BOOKGEN_API_URL") {
            config.base_url = url;
        }
        if let Some(ms) = lookup("BOOKGEN_POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(parse_var("BOOKGEN_POLL_INTERVAL_MS", &ms)?);
        }
        if let Some(n) = lookup("BOOKGEN_MAX_POLLS") {
            config.max_polls = Some(parse_var("BOOKGEN_MAX_POLLS", &n)?);
        }
        if let Some(secs) = lookup("BOOKGEN_POLL_TIMEOUT_SECS") {
            config.poll_timeout = Some(Duration::from_secs(parse_var(
                "BOOKGEN_POLL_TIMEOUT_SECS",
                &secs,
            )?));
        }
        if let Some(dir) = lookup("BOOKGEN_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }

        if config.poll_interval.is_zero() {
            return Err(BookError::Config("poll interval must be non-zero".into()));
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| BookError::Config(format!("{} has an invalid value '{}'", key, value)))
}

/// Builder for [`ClientConfig`].
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Stop polling after this many status checks.
    pub fn with_max_polls(mut self, max: u32) -> Self {
        self.config.max_polls = Some(max);
        self
    }

    /// Stop polling once this much time has passed since the job started.
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.config.poll_timeout = Some(timeout);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
