//! Shipping, tax and order-totals endpoints.

use segishop_core::{Address, ShippingOption, TotalsValues};
use tracing::{debug, instrument};

use super::types::{
    DeliverabilityResponse, OrderTotalsRequest, OrderTotalsResponse, ShippingCalculationRequest,
    ShippingCalculationResponse, TaxCalculationRequest, TaxCalculationResponse, TaxQuote,
};
use super::{ApiClient, ApiError, rejected};

impl ApiClient {
    /// Quote shipping options for an address and cart.
    ///
    /// Disabled options are dropped. An empty list is a valid answer.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] with the backend's message when it
    /// answers `success: false` (for example, no shipping zone covers the
    /// address), or another error if the request fails.
    #[instrument(skip(self, request), fields(zip = %request.shipping_address.postal_code, items = request.items.len()))]
    pub async fn calculate_shipping(
        &self,
        request: &ShippingCalculationRequest,
    ) -> Result<Vec<ShippingOption>, ApiError> {
        let url = self.endpoint("Shipping/calculate")?;
        let response: ShippingCalculationResponse = self.post(url, request).await?;

        if !response.success {
            return Err(rejected(
                response.error_message,
                "Failed to calculate shipping options",
            ));
        }

        let options: Vec<ShippingOption> = response
            .options
            .into_iter()
            .filter(|option| option.is_enabled)
            .collect();
        debug!(count = options.len(), "Shipping options received");
        Ok(options)
    }

    /// Quote tax for an address, subtotal and selected shipping option.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, request), fields(zip = %request.shipping_address.postal_code))]
    pub async fn calculate_tax(&self, request: &TaxCalculationRequest) -> Result<TaxQuote, ApiError> {
        let url = self.endpoint("Shipping/calculate-tax")?;
        let response: TaxCalculationResponse = self.post(url, request).await?;

        if !response.success {
            return Err(rejected(response.error_message, "Failed to calculate tax"));
        }

        Ok(TaxQuote {
            amount: response.tax_amount,
            rate: response.tax_rate,
            taxable: response.is_taxable,
        })
    }

    /// Ask the backend for authoritative totals.
    ///
    /// When the request names a coupon code the backend prices it in.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the backend rejects it, or the
    /// response carries no totals.
    #[instrument(skip(self, request), fields(option = ?request.selected_shipping_option_id, coupon = ?request.coupon_code))]
    pub async fn calculate_totals(
        &self,
        request: &OrderTotalsRequest,
    ) -> Result<TotalsValues, ApiError> {
        let url = self.endpoint("Shipping/calculate-totals")?;
        let response: OrderTotalsResponse = self.post(url, request).await?;

        if !response.success {
            return Err(rejected(
                response.error_message,
                "Failed to calculate order totals",
            ));
        }

        response
            .totals
            .as_ref()
            .map(TotalsValues::from)
            .ok_or(ApiError::EmptyBody("totals"))
    }

    /// Check whether the address is deliverable at all.
    ///
    /// Returns the backend's explanation when it is not.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, address), fields(zip = %address.postal_code))]
    pub async fn check_deliverability(&self, address: &Address) -> Result<Result<(), String>, ApiError> {
        let url = self.endpoint("Shipping/validate-address")?;
        let response: DeliverabilityResponse = self.post(url, address).await?;

        if response.success && response.is_valid {
            Ok(Ok(()))
        } else {
            Ok(Err(response
                .message
                .unwrap_or_else(|| "We do not ship to this address".to_string())))
        }
    }
}
