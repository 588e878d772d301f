//! Segishop backend REST client.
//!
//! # Architecture
//!
//! - JSON over HTTP(S) to `{base}/api/...`, one method per endpoint
//! - The injected [`Session`] supplies the bearer token; any 401 expires it
//! - Every request carries the configured timeout
//! - Available coupons are cached via `moka` (5 minute TTL)
//!
//! # Endpoints
//!
//! - Address book: `useraddress` (see [`addresses`])
//! - Shipping, tax and totals: `Shipping/*` (see [`shipping`])
//! - Coupons: `coupons/*` (see [`coupons`])
//! - Orders: `orders` (see [`orders`])

pub mod addresses;
pub mod coupons;
pub mod orders;
pub mod shipping;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use segishop_core::AvailableCoupon;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::CheckoutConfig;
use crate::session::Session;
use types::ErrorBody;

/// Errors that can occur when calling the Segishop backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request exceeded the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The backend rejected the session token.
    #[error("Authentication required")]
    Unauthorized,

    /// The backend refused the request with an explanation for the shopper.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A successful response lacked a required part.
    #[error("Response is missing {0}")]
    EmptyBody(&'static str),

    /// The configured base URL cannot be joined with an endpoint path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Segishop REST API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    session: Session,
    coupon_cache: Cache<(), Vec<AvailableCoupon>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("timeout", &self.inner.timeout)
            .field("session", &self.inner.session.state())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the HTTP client fails to
    /// build.
    pub fn new(config: &CheckoutConfig, session: Session) -> Result<Self, ApiError> {
        Url::parse(&config.api_url)?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let coupon_cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.trim_end_matches('/').to_string(),
                timeout: config.request_timeout,
                session,
                coupon_cache,
            }),
        })
    }

    /// The session this client authenticates with.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Full URL for an endpoint path such as `Shipping/calculate`.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!(
            "{}/{}",
            self.inner.base_url,
            path.trim_start_matches('/')
        ))?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .inner
            .client
            .request(method, url)
            .timeout(self.inner.timeout)
            .header("Accept", "application/json");
        match self.inner.session.token() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        self.send(self.request(Method::GET, url)).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(self.request(Method::POST, url).json(body)).await
    }

    async fn put<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(self.request(Method::PUT, url).json(body)).await
    }

    async fn delete<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        self.send(self.request(Method::DELETE, url)).await
    }

    /// Send a request and decode the JSON body.
    ///
    /// 401 expires the session. 400/404/409/422 carrying a message become
    /// [`ApiError::Rejected`] so the backend's wording reaches the shopper.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Http(e)
            }
        })?;
        let status = response.status();
        let url = response.url().path().to_string();

        if status == StatusCode::UNAUTHORIZED {
            warn!(path = %url, "Backend rejected session token");
            self.inner.session.expire();
            return Err(ApiError::Unauthorized);
        }

        let response_text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Http(e)
            }
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&response_text)
                .ok()
                .and_then(ErrorBody::into_message);
            let rejectable = matches!(
                status,
                StatusCode::BAD_REQUEST
                    | StatusCode::NOT_FOUND
                    | StatusCode::CONFLICT
                    | StatusCode::UNPROCESSABLE_ENTITY
            );
            return Err(match message {
                Some(message) if rejectable => {
                    debug!(path = %url, status = %status, %message, "Backend rejected request");
                    ApiError::Rejected {
                        status: status.as_u16(),
                        message,
                    }
                }
                message => {
                    warn!(
                        path = %url,
                        status = %status,
                        body = %response_text.chars().take(200).collect::<String>(),
                        "Backend returned non-success status"
                    );
                    ApiError::Api {
                        status: status.as_u16(),
                        message: message.unwrap_or_else(|| format!("HTTP error! status: {status}")),
                    }
                }
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            warn!(
                path = %url,
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e.to_string())
        })
    }
}

/// Turn a `success: false` body into a rejection carrying its message.
fn rejected(message: Option<String>, fallback: &str) -> ApiError {
    ApiError::Rejected {
        status: StatusCode::OK.as_u16(),
        message: message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string()),
    }
}
