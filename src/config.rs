//! Attestation authority endpoints, polling budget and environment loading.

use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::error::{RelayError, Result};

/// Circle Iris API environment URLs
///
/// See <https://developers.circle.com/stablecoins/cctp-apis>
pub const IRIS_API: &str = "https://iris-api.circle.com";
pub const IRIS_API_SANDBOX: &str = "https://iris-api-sandbox.circle.com";

/// CCTP v2 messages API path: `/v2/messages/{sourceDomain}?transactionHash={txHash}`
pub const MESSAGES_PATH_V2: &str = "/v2/messages/";

pub const ENV_IRIS_URL: &str = "CCTP_RELAY_IRIS_URL";
pub const ENV_POLL_INTERVAL_SECS: &str = "CCTP_RELAY_POLL_INTERVAL_SECS";
pub const ENV_MAX_ATTEMPTS: &str = "CCTP_RELAY_MAX_ATTEMPTS";
pub const ENV_DEADLINE_SECS: &str = "CCTP_RELAY_DEADLINE_SECS";

/// Which Iris deployment to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IrisEnvironment {
    Production,
    #[default]
    Sandbox,
}

impl IrisEnvironment {
    pub fn for_testnet(is_testnet: bool) -> Self {
        if is_testnet {
            Self::Sandbox
        } else {
            Self::Production
        }
    }

    pub fn base_url(self) -> Url {
        let raw = match self {
            Self::Production => IRIS_API,
            Self::Sandbox => IRIS_API_SANDBOX,
        };
        Url::parse(raw).expect("Iris base URLs are valid")
    }
}

/// Configuration for attestation polling behavior.
///
/// ```rust
/// use cctp_relay::PollingConfig;
///
/// // 30 attempts, 60 seconds apart
/// let config = PollingConfig::default();
/// assert_eq!(config.total_timeout_secs(), 29 * 60);
///
/// let config = PollingConfig::fast_transfer().with_deadline_secs(120);
/// assert_eq!(config.deadline(), Some(std::time::Duration::from_secs(120)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    /// Maximum number of polls before giving up.
    pub max_attempts: u32,
    /// Seconds to wait between polls.
    pub poll_interval_secs: u64,
    /// Optional wall-clock budget across all polls.
    pub deadline_secs: Option<u64>,
}

impl Default for PollingConfig {
    /// Standard transfers take 13-19 minutes to reach finality on Ethereum L2s;
    /// 30 polls one minute apart covers that with margin.
    fn default() -> Self {
        Self {
            max_attempts: 30,
            poll_interval_secs: 60,
            deadline_secs: None,
        }
    }
}

impl PollingConfig {
    /// Fast transfers usually attest in under 30 seconds.
    pub fn fast_transfer() -> Self {
        Self {
            max_attempts: 30,
            poll_interval_secs: 5,
            deadline_secs: None,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    pub fn with_deadline_secs(mut self, secs: u64) -> Self {
        self.deadline_secs = Some(secs);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }

    /// Time spent sleeping if every attempt is used; sleeps only happen between polls.
    pub fn total_timeout_secs(&self) -> u64 {
        u64::from(self.max_attempts.saturating_sub(1)) * self.poll_interval_secs
    }

    fn validate(self) -> Result<Self> {
        if self.max_attempts == 0 {
            return Err(RelayError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Runtime configuration of the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub iris_url: Url,
    pub polling: PollingConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            iris_url: IrisEnvironment::default().base_url(),
            polling: PollingConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Loads `.env` if present, then reads the `CCTP_RELAY_*` variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_IRIS_URL) {
            config.iris_url = Url::parse(&raw).map_err(|e| RelayError::InvalidUrl {
                reason: format!("{ENV_IRIS_URL}={raw}: {e}"),
            })?;
        }
        if let Some(raw) = lookup(ENV_POLL_INTERVAL_SECS) {
            config.polling.poll_interval_secs = parse_number(ENV_POLL_INTERVAL_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_ATTEMPTS) {
            config.polling.max_attempts = parse_number(ENV_MAX_ATTEMPTS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DEADLINE_SECS) {
            config.polling.deadline_secs = Some(parse_number(ENV_DEADLINE_SECS, &raw)?);
        }
        config.polling = config.polling.validate()?;

        debug!(
            iris_url = %config.iris_url,
            max_attempts = config.polling.max_attempts,
            poll_interval_secs = config.polling.poll_interval_secs,
            deadline_secs = ?config.polling.deadline_secs,
            event = "relay_config_loaded"
        );
        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| RelayError::InvalidConfig(format!("{key}={raw}: {e}")))
}
