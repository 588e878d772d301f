//! Coupon endpoints.
//!
//! The client never computes a discount. Apply and remove send the current
//! subtotal, shipping and tax; the backend answers with the discount and a
//! full set of totals.

use segishop_core::{AppliedCoupon, AvailableCoupon, CouponCode, Money, TotalsValues};
use tracing::{debug, instrument};

use super::types::{
    AvailableCouponsResponse, CouponApplication, CouponApplyResponse, CouponRemoveResponse,
    CouponRequest,
};
use super::{ApiClient, ApiError, rejected};

/// Number of available coupons offered as hints.
pub const COUPON_HINT_COUNT: usize = 3;

impl ApiClient {
    /// Apply a coupon to the current totals.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] with the backend's message when the
    /// code is invalid, expired or not applicable, [`ApiError::Unauthorized`]
    /// when the coupon needs a signed-in shopper, or another error if the
    /// request fails.
    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn apply_coupon(&self, request: &CouponRequest) -> Result<CouponApplication, ApiError> {
        let url = self.endpoint("coupons/apply")?;
        let response: CouponApplyResponse = self.post(url, request).await?;

        if !response.success {
            return Err(rejected(response.message, "Failed to apply coupon"));
        }

        let payload = response.coupon.ok_or(ApiError::EmptyBody("coupon"))?;
        let totals = response
            .order_totals
            .ok_or(ApiError::EmptyBody("orderTotals"))?;
        let values = TotalsValues::from(&totals);

        let code = CouponCode::parse(&payload.code).unwrap_or_else(|_| request.code.clone());
        debug!(discount = %values.discount, "Coupon applied");

        Ok(CouponApplication {
            coupon: AppliedCoupon {
                code,
                description: payload.description,
                discount: values.discount,
            },
            message: response
                .message
                .unwrap_or_else(|| "Coupon applied successfully".to_string()),
            values,
            free_shipping_applied: totals.free_shipping_applied,
        })
    }

    /// Remove the applied coupon.
    ///
    /// Returns the backend's totals without the discount.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend refuses.
    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn remove_coupon(&self, request: &CouponRequest) -> Result<TotalsValues, ApiError> {
        let url = self.endpoint("coupons/remove")?;
        let response: CouponRemoveResponse = self.post(url, request).await?;

        if !response.success {
            return Err(rejected(response.message, "Failed to remove coupon"));
        }

        Ok(response.order_totals.as_ref().map_or(
            TotalsValues {
                subtotal: request.order_subtotal,
                shipping: request.shipping_amount,
                tax: request.tax_amount,
                discount: Money::ZERO,
            },
            TotalsValues::from,
        ))
    }

    /// List coupons the store currently promotes. Cached for 5 minutes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn available_coupons(&self) -> Result<Vec<AvailableCoupon>, ApiError> {
        if let Some(coupons) = self.inner.coupon_cache.get(&()).await {
            debug!("Cache hit for available coupons");
            return Ok(coupons);
        }

        let url = self.endpoint("coupons/available")?;
        let response: AvailableCouponsResponse = self.get(url).await?;
        if !response.success {
            return Err(rejected(None, "Failed to load available coupons"));
        }

        self.inner
            .coupon_cache
            .insert((), response.coupons.clone())
            .await;

        Ok(response.coupons)
    }

    /// The first few available coupons, for display next to the code input.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn coupon_hints(&self) -> Result<Vec<AvailableCoupon>, ApiError> {
        let mut coupons = self.available_coupons().await?;
        coupons.truncate(COUPON_HINT_COUNT);
        Ok(coupons)
    }
}
