//! Session configuration loading
//!
//! Loaded from TOML with serde defaults. Zero values for the worker limit,
//! poll interval, or validation timeout are rejected; the poll interval has
//! a one-second floor so status ticks never spin.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Session tuning knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Maximum workers in flight at once, across both phases.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Seconds between status ticks. Minimum 1.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// URL fetched through each egress point during validation. The
    /// validation phase is skipped entirely when unset.
    #[serde(default)]
    pub check_url: Option<String>,
    /// Per-check timeout for egress validation, in seconds.
    #[serde(default = "default_egress_timeout_secs")]
    pub egress_timeout_secs: u64,
}

fn default_max_workers() -> usize {
    32
}

fn default_poll_interval_secs() -> u64 {
    1
}

fn default_egress_timeout_secs() -> u64 {
    10
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            poll_interval_secs: default_poll_interval_secs(),
            check_url: None,
            egress_timeout_secs: default_egress_timeout_secs(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: SessionConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the path in `ROTAUTH_SESSION_CONFIG`, or `None` when the
    /// variable is unset.
    pub fn from_env() -> Result<Option<Self>> {
        match std::env::var("ROTAUTH_SESSION_CONFIG") {
            Ok(path) => Self::load(Path::new(&path)).map(Some),
            Err(_) => Ok(None),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(Error::Config("max_workers must be greater than 0".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(Error::Config("poll_interval_secs must be at least 1".into()));
        }
        if self.egress_timeout_secs == 0 {
            return Err(Error::Config(
                "egress_timeout_secs must be greater than 0".into(),
            ));
        }
        if let Some(url) = &self.check_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::Config(format!(
                    "check_url must start with http:// or https://, got: {url}"
                )));
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn egress_timeout(&self) -> Duration {
        Duration::from_secs(self.egress_timeout_secs)
    }
}
