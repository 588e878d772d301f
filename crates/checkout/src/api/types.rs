//! Request and response bodies for the Segishop REST API.
//!
//! Field names follow the backend's camelCase JSON. Amounts are JSON
//! numbers.

use rust_decimal::Decimal;
use segishop_core::{
    Address, AddressKind, AppliedCoupon, AvailableCoupon, CartLine, CouponCode, CouponId,
    CouponKind, Money, OrderId, ProductId, SavedAddress, ShippingOption, ShippingOptionId,
    TotalsValues, UserId,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// Shared
// =============================================================================

/// A cart line in the shape the shipping endpoints expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemPayload {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_price: Money,
    pub quantity: u32,
    pub total_price: Money,
}

impl From<&CartLine> for CartItemPayload {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            product_price: line.unit_price,
            quantity: line.quantity,
            total_price: line.line_total(),
        }
    }
}

/// Error body returned with 4xx responses.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        self.message
            .or(self.error_message)
            .filter(|m| !m.trim().is_empty())
    }
}

// =============================================================================
// Shipping
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingCalculationRequest {
    pub items: Vec<CartItemPayload>,
    pub subtotal: Money,
    pub shipping_address: Address,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingCalculationResponse {
    pub success: bool,
    #[serde(default)]
    pub options: Vec<ShippingOption>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxCalculationRequest {
    pub items: Vec<CartItemPayload>,
    pub subtotal: Money,
    pub shipping_address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_shipping_option_id: Option<ShippingOptionId>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxCalculationResponse {
    pub success: bool,
    #[serde(default)]
    pub tax_amount: Money,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub is_taxable: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// A tax quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxQuote {
    pub amount: Money,
    pub rate: Decimal,
    pub taxable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotalsRequest {
    pub items: Vec<CartItemPayload>,
    pub subtotal: Money,
    pub shipping_address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_shipping_option_id: Option<ShippingOptionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<CouponCode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotalsResponse {
    pub success: bool,
    #[serde(default)]
    pub totals: Option<OrderTotalsPayload>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotalsPayload {
    pub subtotal: Money,
    #[serde(default)]
    pub shipping_cost: Money,
    #[serde(default)]
    pub tax_amount: Money,
    #[serde(default)]
    pub discount_amount: Money,
    /// Backend's own total. Displayed totals are always recomputed.
    #[serde(default)]
    pub total: Money,
    #[serde(default)]
    pub applied_coupon: Option<String>,
}

impl From<&OrderTotalsPayload> for TotalsValues {
    fn from(payload: &OrderTotalsPayload) -> Self {
        Self {
            subtotal: payload.subtotal,
            shipping: payload.shipping_cost,
            tax: payload.tax_amount,
            discount: payload.discount_amount,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverabilityResponse {
    pub success: bool,
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Coupons
// =============================================================================

/// Body of both `coupons/apply` and `coupons/remove`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponRequest {
    pub code: CouponCode,
    pub order_subtotal: Money,
    pub shipping_amount: Money,
    pub tax_amount: Money,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponPayload {
    #[serde(default)]
    pub id: Option<CouponId>,
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: CouponKind,
    #[serde(default)]
    pub value: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponOrderTotals {
    pub subtotal: Money,
    #[serde(default)]
    pub discount_amount: Money,
    #[serde(default)]
    pub subtotal_after_discount: Money,
    #[serde(default)]
    pub shipping_amount: Money,
    #[serde(default)]
    pub shipping_discount: Money,
    #[serde(default)]
    pub tax_amount: Money,
    #[serde(default)]
    pub total_amount: Money,
    #[serde(default)]
    pub free_shipping_applied: bool,
}

impl From<&CouponOrderTotals> for TotalsValues {
    fn from(totals: &CouponOrderTotals) -> Self {
        Self {
            subtotal: totals.subtotal,
            shipping: totals.shipping_amount,
            tax: totals.tax_amount,
            discount: totals.discount_amount,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponApplyResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub coupon: Option<CouponPayload>,
    #[serde(default)]
    pub order_totals: Option<CouponOrderTotals>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponRemoveResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub order_totals: Option<CouponOrderTotals>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableCouponsResponse {
    pub success: bool,
    #[serde(default)]
    pub coupons: Vec<AvailableCoupon>,
}

/// A successful coupon application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponApplication {
    pub coupon: AppliedCoupon,
    /// The server's confirmation, e.g. `Coupon applied! You save $5.00`.
    pub message: String,
    pub values: TotalsValues,
    pub free_shipping_applied: bool,
}

// =============================================================================
// Address book
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAddressesResponse {
    pub success: bool,
    #[serde(default)]
    pub addresses: Vec<SavedAddress>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAddressResponse {
    pub success: bool,
    #[serde(default)]
    pub address: Option<SavedAddress>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Body for creating an address-book entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserAddressRequest {
    #[serde(rename = "type")]
    pub kind: AddressKind,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub address1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

impl CreateUserAddressRequest {
    /// Build a request that saves a checkout address.
    #[must_use]
    pub fn from_address(address: &Address, kind: AddressKind, is_default: bool) -> Self {
        Self {
            kind,
            first_name: address.first_name.trim().to_string(),
            last_name: address.last_name.trim().to_string(),
            company: None,
            address1: address.street.trim().to_string(),
            address2: address.apartment.clone(),
            city: address.city.trim().to_string(),
            state: address.state.trim().to_string(),
            zip_code: address.postal_code.trim().to_string(),
            country: address.country.code().to_string(),
            phone: address.phone.clone(),
            is_default: Some(is_default),
        }
    }
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserAddressRequest {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<AddressKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressValidationResponse {
    pub success: bool,
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub shipping_zone_id: Option<i32>,
    #[serde(default)]
    pub shipping_zone_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalSuggestionsResponse {
    pub success: bool,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub is_valid_format: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(rename = "productSKU", skip_serializing_if = "Option::is_none")]
    pub product_sku: Option<String>,
    pub unit_price: Money,
    pub quantity: u32,
    pub total_price: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_attributes: Option<String>,
}

impl From<&CartLine> for OrderItemPayload {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            product_sku: line.sku.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            total_price: line.line_total(),
            product_attributes: None,
        }
    }
}

/// Confirmation from the payment provider, collected outside checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    pub payment_method: String,
    pub payment_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
    pub amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Contact details for a guest order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestContact {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotalsSubmission {
    pub sub_total: Money,
    pub tax_amount: Money,
    pub shipping_amount: Money,
    pub discount_amount: Money,
    pub total_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_phone: Option<String>,
    pub shipping_address: Address,
    pub items: Vec<OrderItemPayload>,
    pub payment_info: PaymentInfo,
    pub totals: OrderTotalsSubmission,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<CouponCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_discount_amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_zone_method_id: Option<ShippingOptionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_method_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub id: OrderId,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total_amount: Option<Money>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub order: Option<CreatedOrder>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub validation_errors: Vec<String>,
}
