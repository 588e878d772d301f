//! Shipping options and the free-shipping progress banner.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::id::ShippingOptionId;
use super::money::Money;

/// A shipping method quoted for a specific address and cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingOption {
    pub id: ShippingOptionId,
    pub title: String,
    #[serde(default)]
    pub method_type: String,
    pub cost: Money,
    /// Free-form delivery estimate from the backend, e.g. `3-5`.
    #[serde(default)]
    pub estimated_days: String,
    #[serde(default)]
    pub is_taxable: bool,
    #[serde(default = "enabled_default")]
    pub is_enabled: bool,
}

const fn enabled_default() -> bool {
    true
}

impl ShippingOption {
    /// `Standard Shipping ($10.00, 3-5 days)`.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.estimated_days.trim().is_empty() {
            format!("{} ({})", self.title, self.cost)
        } else {
            format!("{} ({}, {} days)", self.title, self.cost, self.estimated_days)
        }
    }
}

/// Progress toward the free-shipping threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeShippingProgress {
    pub threshold: Money,
    pub qualifies: bool,
    /// Amount still needed; zero once the threshold is met.
    pub remaining: Money,
    /// Whole percent of the threshold reached, capped at 100.
    pub percent: u8,
}

impl FreeShippingProgress {
    /// Default threshold advertised by the store.
    pub const DEFAULT_THRESHOLD: Decimal = Decimal::from_parts(120, 0, 0, false, 0);

    #[must_use]
    pub fn for_subtotal(subtotal: Money, threshold: Money) -> Self {
        if threshold.is_zero() || threshold.is_negative() {
            return Self {
                threshold,
                qualifies: true,
                remaining: Money::ZERO,
                percent: 100,
            };
        }

        let qualifies = subtotal >= threshold;
        let remaining = (threshold - subtotal).clamp_non_negative();
        let ratio = (subtotal.amount() * Decimal::ONE_HUNDRED / threshold.amount())
            .floor()
            .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
        let percent = ratio.to_u8().unwrap_or(100);

        Self {
            threshold,
            qualifies,
            remaining,
            percent,
        }
    }
}
