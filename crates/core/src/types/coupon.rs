//! Coupon codes, applied coupons and rejection reasons.

use core::fmt;

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use super::money::Money;

/// Errors that can occur when parsing a [`CouponCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CouponCodeError {
    /// Nothing was entered.
    #[error("Please enter a promo code")]
    Empty,
    /// The code is longer than the backend accepts.
    #[error("promo code must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A normalized promo code.
///
/// ## Constraints
///
/// - Surrounding whitespace is removed
/// - Stored upper-case, matching the backend's lookup
/// - Length: 1-50 characters
///
/// ```
/// use segishop_core::CouponCode;
///
/// assert_eq!(CouponCode::parse(" save10 ").unwrap().as_str(), "SAVE10");
/// assert!(CouponCode::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouponCode(String);

impl CouponCode {
    pub const MAX_LENGTH: usize = 50;

    /// Parse and normalize a user-entered code.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or longer than 50
    /// characters.
    pub fn parse(s: &str) -> Result<Self, CouponCodeError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CouponCodeError::Empty);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(CouponCodeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a coupon computes its discount. Opaque to the client beyond display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CouponKind {
    Percentage,
    FixedAmount,
    FreeShipping,
}

impl CouponKind {
    const fn from_wire(value: u64) -> Option<Self> {
        match value {
            1 => Some(Self::Percentage),
            2 => Some(Self::FixedAmount),
            3 => Some(Self::FreeShipping),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "Percentage" | "percentage" => Some(Self::Percentage),
            "FixedAmount" | "fixedAmount" | "fixed_amount" => Some(Self::FixedAmount),
            "FreeShipping" | "freeShipping" | "free_shipping" => Some(Self::FreeShipping),
            _ => None,
        }
    }
}

// The backend emits the enum either as its numeric value or its name,
// depending on the endpoint.
impl<'de> Deserialize<'de> for CouponKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KindVisitor;

        impl Visitor<'_> for KindVisitor {
            type Value = CouponKind;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a coupon type as 1-3 or its name")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                CouponKind::from_wire(v)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .ok()
                    .and_then(CouponKind::from_wire)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                CouponKind::from_name(v).ok_or_else(|| E::unknown_variant(v, NAMES))
            }
        }

        const NAMES: &[&str] = &["Percentage", "FixedAmount", "FreeShipping"];
        deserializer.deserialize_any(KindVisitor)
    }
}

/// A coupon offered to the shopper as a hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableCoupon {
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: CouponKind,
    pub value: Decimal,
}

impl AvailableCoupon {
    /// `10% off`, `$5.00 off` or `Free shipping`.
    #[must_use]
    pub fn headline(&self) -> String {
        match self.kind {
            CouponKind::Percentage => format!("{}% off", self.value.normalize()),
            CouponKind::FixedAmount => format!("{} off", Money::new(self.value)),
            CouponKind::FreeShipping => "Free shipping".to_owned(),
        }
    }
}

/// The single coupon applied to the draft.
///
/// `discount` is exactly what the backend returned; the client never
/// computes a discount itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCoupon {
    pub code: CouponCode,
    pub description: String,
    pub discount: Money,
}

/// Why the backend refused a coupon. Always carries the server's message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponRejection {
    LoginRequired(String),
    Invalid(String),
    Expired(String),
    NotApplicable(String),
}

impl CouponRejection {
    /// Classify a server rejection message.
    #[must_use]
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("log in") || lower.contains("login") {
            Self::LoginRequired(message)
        } else if lower.contains("expired") {
            Self::Expired(message)
        } else if lower.contains("invalid")
            || lower.contains("not active")
            || lower.contains("no longer active")
            || lower.contains("not yet valid")
        {
            Self::Invalid(message)
        } else {
            Self::NotApplicable(message)
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::LoginRequired(m) | Self::Invalid(m) | Self::Expired(m) | Self::NotApplicable(m) => {
                m
            }
        }
    }
}

impl fmt::Display for CouponRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
