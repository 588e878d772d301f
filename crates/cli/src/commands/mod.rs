//! Subcommand implementations.

pub mod addresses;
pub mod coupons;
pub mod quote;

use segishop_checkout::{ApiClient, CheckoutConfig, CheckoutError, ConfigError, Session};

/// A client authenticated with the configured token, if any.
fn connect(config: &CheckoutConfig) -> Result<ApiClient, CheckoutError> {
    let session = Session::new(config.auth_token.clone());
    Ok(ApiClient::new(config, session)?)
}

/// A client for endpoints that only serve signed-in shoppers.
fn connect_signed_in(config: &CheckoutConfig) -> Result<ApiClient, CheckoutError> {
    if config.auth_token.is_none() {
        return Err(ConfigError::MissingEnvVar("SEGISHOP_AUTH_TOKEN".to_string()).into());
    }
    connect(config)
}
