//! Checkout configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `SEGISHOP_API_URL` - Backend base URL (default: `http://localhost:5001/api`)
//! - `SEGISHOP_AUTH_TOKEN` - Bearer token for a signed-in shopper
//! - `SEGISHOP_REQUEST_TIMEOUT_SECS` - Per-request timeout, 1-120 (default: 20)
//! - `SEGISHOP_ADDRESS_DEBOUNCE_MS` - Quiet period after an address edit
//!   before shipping is requoted, at most 10000 (default: 1000)
//! - `SEGISHOP_FREE_SHIPPING_THRESHOLD` - Subtotal that qualifies for free
//!   shipping (default: 120)

use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use segishop_core::{FreeShippingProgress, Money};
use thiserror::Error;

const DEFAULT_API_URL: &str = "http://localhost:5001/api";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
const MAX_REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_ADDRESS_DEBOUNCE_MS: u64 = 1000;
const MAX_ADDRESS_DEBOUNCE_MS: u64 = 10_000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Checkout client configuration.
///
/// Implements `Debug` manually to redact the auth token.
#[derive(Clone)]
pub struct CheckoutConfig {
    /// Normalized backend base URL, always ending in `/api`
    pub api_url: String,
    /// Bearer token for a signed-in shopper
    pub auth_token: Option<SecretString>,
    /// Timeout applied to every backend request
    pub request_timeout: Duration,
    /// Quiet period after the last address edit before requoting shipping
    pub address_debounce: Duration,
    /// Subtotal that qualifies for free shipping
    pub free_shipping_threshold: Money,
}

impl std::fmt::Debug for CheckoutConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutConfig")
            .field("api_url", &self.api_url)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("request_timeout", &self.request_timeout)
            .field("address_debounce", &self.address_debounce)
            .field("free_shipping_threshold", &self.free_shipping_threshold)
            .finish()
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            auth_token: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            address_debounce: Duration::from_millis(DEFAULT_ADDRESS_DEBOUNCE_MS),
            free_shipping_threshold: Money::new(FreeShippingProgress::DEFAULT_THRESHOLD),
        }
    }
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed or
    /// is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = normalize_api_url(&get_env_or_default("SEGISHOP_API_URL", DEFAULT_API_URL));
        let auth_token = get_optional_env("SEGISHOP_AUTH_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .map(SecretString::from);

        let timeout_secs = parse_bounded(
            "SEGISHOP_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
            1,
            MAX_REQUEST_TIMEOUT_SECS,
        )?;
        let debounce_ms = parse_bounded(
            "SEGISHOP_ADDRESS_DEBOUNCE_MS",
            DEFAULT_ADDRESS_DEBOUNCE_MS,
            0,
            MAX_ADDRESS_DEBOUNCE_MS,
        )?;

        let threshold = get_env_or_default(
            "SEGISHOP_FREE_SHIPPING_THRESHOLD",
            &FreeShippingProgress::DEFAULT_THRESHOLD.to_string(),
        );
        let free_shipping_threshold = threshold
            .trim()
            .parse::<Decimal>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "SEGISHOP_FREE_SHIPPING_THRESHOLD".to_string(),
                    e.to_string(),
                )
            })
            .map(Money::new)?;
        if free_shipping_threshold.is_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "SEGISHOP_FREE_SHIPPING_THRESHOLD".to_string(),
                "must not be negative".to_string(),
            ));
        }

        Ok(Self {
            api_url,
            auth_token,
            request_timeout: Duration::from_secs(timeout_secs),
            address_debounce: Duration::from_millis(debounce_ms),
            free_shipping_threshold,
        })
    }

    /// Settings consumed by [`crate::CheckoutRuntime`].
    #[must_use]
    pub const fn runtime_settings(&self) -> RuntimeSettings {
        RuntimeSettings {
            request_timeout: self.request_timeout,
            address_debounce: self.address_debounce,
            free_shipping_threshold: self.free_shipping_threshold,
        }
    }
}

/// Timing and display settings for the checkout runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub request_timeout: Duration,
    pub address_debounce: Duration,
    pub free_shipping_threshold: Money,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        CheckoutConfig::default().runtime_settings()
    }
}

/// Normalize a backend URL to `scheme://host[:port]/.../api`.
///
/// Accepts a bare `:5001`, a host without scheme, and URLs with or without
/// the `/api` suffix or trailing slashes.
#[must_use]
pub fn normalize_api_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DEFAULT_API_URL.to_string();
    }

    let mut url = if trimmed.starts_with(':') {
        format!("http://localhost{trimmed}")
    } else if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    while url.ends_with('/') {
        url.pop();
    }
    if !url.ends_with("/api") {
        url.push_str("/api");
    }
    url
}

fn parse_bounded(key: &str, default: u64, min: u64, max: u64) -> Result<u64, ConfigError> {
    let value = get_env_or_default(key, &default.to_string())
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(min..=max).contains(&value) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between {min} and {max}"),
        ));
    }
    Ok(value)
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
