//! Configuration and settings management
//!
//! Loads verifier settings from config files and environment variables and
//! defines the retry constants used for transport sends.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identity check form endpoint
pub const DEFAULT_IDENTITY_CHECK_URL: &str = "https://myim3.indosatooredoo.com/ceknomor/checkForm";
/// Identity result page, correlated by session cookie only
pub const DEFAULT_IDENTITY_RESULT_URL: &str = "https://myim3.indosatooredoo.com/ceknomor/result";
/// SIM status JSON endpoint
pub const DEFAULT_SIM_STATUS_URL: &str = "https://tri.co.id/api/v1/information/sim-status";
/// SIM status request timeout
pub const DEFAULT_SIM_STATUS_TIMEOUT_SECS: u64 = 10;
/// Browser user agent both services expect
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.6778.140 Safari/537.36";

// Transport retry configuration (Telegram sends only)
/// Initial backoff between send attempts
pub const TRANSPORT_INITIAL_BACKOFF_MS: u64 = 500;
/// Upper bound for the backoff
pub const TRANSPORT_MAX_BACKOFF_MS: u64 = 4000;
/// Number of retries after the first attempt
pub const TRANSPORT_MAX_RETRIES: usize = 3;

/// Build the layered configuration source.
///
/// Order: `config/default`, `config/{RUN_MODE}`, `config/local`, then
/// `APP__`-prefixed variables, then plain environment variables.
///
/// # Errors
///
/// Returns a `ConfigError` if a present source cannot be read.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Local overrides, not checked into git
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        // Plain UPPER_SNAKE_CASE variables; empty values count as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

/// Endpoints and timeouts of the two verification services.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VerifierSettings {
    /// Form endpoint of the identity check
    #[serde(default = "default_identity_check_url")]
    pub identity_check_url: String,
    /// Result page of the identity check
    #[serde(default = "default_identity_result_url")]
    pub identity_result_url: String,
    /// Optional timeout for identity lookups; unset means no timeout
    #[serde(default)]
    pub identity_timeout_secs: Option<u64>,
    /// SIM status endpoint
    #[serde(default = "default_sim_status_url")]
    pub sim_status_url: String,
    /// SIM status timeout
    #[serde(default = "default_sim_status_timeout_secs")]
    pub sim_status_timeout_secs: u64,
    /// User agent sent to both services
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_identity_check_url() -> String {
    DEFAULT_IDENTITY_CHECK_URL.to_string()
}

fn default_identity_result_url() -> String {
    DEFAULT_IDENTITY_RESULT_URL.to_string()
}

fn default_sim_status_url() -> String {
    DEFAULT_SIM_STATUS_URL.to_string()
}

const fn default_sim_status_timeout_secs() -> u64 {
    DEFAULT_SIM_STATUS_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for VerifierSettings {
    fn default() -> Self {
        Self {
            identity_check_url: default_identity_check_url(),
            identity_result_url: default_identity_result_url(),
            identity_timeout_secs: None,
            sim_status_url: default_sim_status_url(),
            sim_status_timeout_secs: default_sim_status_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl VerifierSettings {
    /// Load settings from config files and the environment.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ceknomor_core::config::VerifierSettings;
    ///
    /// let settings = VerifierSettings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        build_config()?.try_deserialize()
    }

    /// SIM status timeout as a `Duration`.
    #[must_use]
    pub const fn sim_status_timeout(&self) -> Duration {
        Duration::from_secs(self.sim_status_timeout_secs)
    }

    /// Identity lookup timeout, if one is configured.
    #[must_use]
    pub fn identity_timeout(&self) -> Option<Duration> {
        self.identity_timeout_secs.map(Duration::from_secs)
    }
}
