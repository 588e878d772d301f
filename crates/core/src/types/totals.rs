//! Order totals and the candidate sources they come from.

use serde::Serialize;

use super::coupon::CouponCode;
use super::money::Money;
use crate::sequence::{Revision, Stamp};

/// The four inputs to a total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsValues {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub discount: Money,
}

/// Displayed totals. `total` is always derived from the other four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
}

impl From<TotalsValues> for OrderTotals {
    fn from(values: TotalsValues) -> Self {
        Self {
            subtotal: values.subtotal,
            shipping: values.shipping,
            tax: values.tax,
            discount: values.discount,
            total: crate::reconcile::compute_total(
                values.subtotal,
                values.shipping,
                values.tax,
                values.discount,
            ),
        }
    }
}

/// Which backend response produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TotalsSource {
    TotalsEndpoint,
    CouponResponse,
}

/// A full set of totals values returned by one backend response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalsCandidate {
    pub source: TotalsSource,
    pub values: TotalsValues,
    /// Input revision the request was issued for.
    pub basis: Revision,
    /// When the response was accepted.
    pub received: Stamp,
    /// Coupon code the backend priced in, if any.
    pub coupon_code: Option<CouponCode>,
}

impl TotalsCandidate {
    #[must_use]
    pub fn includes_coupon(&self) -> bool {
        self.coupon_code.is_some() || !self.values.discount.is_zero()
    }
}
