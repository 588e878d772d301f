//! CLI configuration: the checkout settings plus error tracking.
//!
//! # Environment Variables
//!
//! Everything [`CheckoutConfig::from_env`] reads, and:
//! - `SENTRY_DSN` - Sentry DSN for error tracking (optional)
//! - `SENTRY_ENVIRONMENT` - Environment name reported to Sentry (optional)

use segishop_checkout::{CheckoutConfig, ConfigError};

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub checkout: CheckoutConfig,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl CliConfig {
    /// Load configuration from environment variables and `.env`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a checkout variable is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let checkout = CheckoutConfig::from_env()?;

        Ok(Self {
            checkout,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
