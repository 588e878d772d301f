//! Checkout error types.
//!
//! Backend calls fail with [`ApiError`]. Inside the draft a failure is
//! carried as a cloneable [`Failure`] and surfaced to the shopper as a
//! [`Notice`]. Nothing here is fatal: every notice names a way forward.

use segishop_core::CouponCode;
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;

/// Top-level error for embedding the checkout in an application.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// The runtime task has stopped.
    #[error("Checkout runtime is no longer running")]
    RuntimeClosed,
}

/// A failed backend call as recorded in the draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    #[error("Unable to reach the store: {0}")]
    Network(String),

    #[error("The request timed out")]
    Timeout,

    #[error("Please log in to continue")]
    Unauthorized,

    /// The backend refused the request with its own message.
    #[error("{0}")]
    Rejected(String),

    #[error("The store returned an error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response from the store: {0}")]
    InvalidResponse(String),
}

impl Failure {
    /// True for failures the shopper can fix by retrying.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout | Self::Server { .. })
    }
}

impl From<ApiError> for Failure {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Http(e) => Self::Network(e.to_string()),
            ApiError::Timeout => Self::Timeout,
            ApiError::Unauthorized => Self::Unauthorized,
            ApiError::Rejected { message, .. } => Self::Rejected(message),
            ApiError::Api { status, message } => Self::Server { status, message },
            ApiError::Parse(message) => Self::InvalidResponse(message),
            ApiError::EmptyBody(what) => Self::InvalidResponse(format!("missing {what}")),
            ApiError::InvalidUrl(e) => Self::Network(e.to_string()),
        }
    }
}

/// How a notice is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    /// Inline, next to the offending input.
    Validation,
    /// Dismissible banner with a retry action.
    Network,
    /// The backend's own explanation, shown verbatim.
    BusinessRule,
}

/// Which part of checkout a notice belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeScope {
    Address,
    Shipping,
    Totals,
    Coupon,
    Order,
}

/// Action offered alongside a notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryAction {
    RefetchShipping,
    RecalculateTotals,
    ApplyCoupon(CouponCode),
    RemoveCoupon,
}

impl RetryAction {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::RefetchShipping => "Retry shipping options",
            Self::RecalculateTotals => "Recalculate totals",
            Self::ApplyCoupon(_) => "Try the code again",
            Self::RemoveCoupon => "Try removing again",
        }
    }
}

/// A message for the shopper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub scope: NoticeScope,
    pub message: String,
    pub retry: Option<RetryAction>,
}

impl Notice {
    #[must_use]
    pub fn validation(scope: NoticeScope, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Validation,
            scope,
            message: message.into(),
            retry: None,
        }
    }

    #[must_use]
    pub fn business_rule(scope: NoticeScope, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::BusinessRule,
            scope,
            message: message.into(),
            retry: None,
        }
    }

    /// Build a notice for a failed call.
    ///
    /// Backend rejections keep the server's message and offer no retry;
    /// everything else becomes a network banner with `retry`.
    #[must_use]
    pub fn from_failure(scope: NoticeScope, failure: &Failure, retry: RetryAction) -> Self {
        match failure {
            Failure::Rejected(message) => Self::business_rule(scope, message.clone()),
            Failure::Unauthorized => Self::business_rule(scope, failure.to_string()),
            Failure::Network(_)
            | Failure::Timeout
            | Failure::Server { .. }
            | Failure::InvalidResponse(_) => Self {
                kind: NoticeKind::Network,
                scope,
                message: failure.to_string(),
                retry: Some(retry),
            },
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
