//! The seam between the checkout runtime and the Segishop backend.
//!
//! [`ApiClient`] is the production implementation. Tests substitute a
//! scripted backend so responses can be delayed and reordered.

use async_trait::async_trait;
use segishop_core::{ShippingOption, TotalsValues};

use crate::api::types::{
    CouponApplication, CouponRequest, OrderTotalsRequest, ShippingCalculationRequest,
};
use crate::api::{ApiClient, ApiError};

/// Backend calls the runtime issues on behalf of the draft.
#[async_trait]
pub trait CheckoutBackend: Send + Sync {
    async fn calculate_shipping(
        &self,
        request: &ShippingCalculationRequest,
    ) -> Result<Vec<ShippingOption>, ApiError>;

    async fn calculate_totals(&self, request: &OrderTotalsRequest)
    -> Result<TotalsValues, ApiError>;

    async fn apply_coupon(&self, request: &CouponRequest) -> Result<CouponApplication, ApiError>;

    async fn remove_coupon(&self, request: &CouponRequest) -> Result<TotalsValues, ApiError>;
}

#[async_trait]
impl CheckoutBackend for ApiClient {
    async fn calculate_shipping(
        &self,
        request: &ShippingCalculationRequest,
    ) -> Result<Vec<ShippingOption>, ApiError> {
        Self::calculate_shipping(self, request).await
    }

    async fn calculate_totals(
        &self,
        request: &OrderTotalsRequest,
    ) -> Result<TotalsValues, ApiError> {
        Self::calculate_totals(self, request).await
    }

    async fn apply_coupon(&self, request: &CouponRequest) -> Result<CouponApplication, ApiError> {
        Self::apply_coupon(self, request).await
    }

    async fn remove_coupon(&self, request: &CouponRequest) -> Result<TotalsValues, ApiError> {
        Self::remove_coupon(self, request).await
    }
}
