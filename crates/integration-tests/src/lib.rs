//! Integration tests for the Segishop checkout.
//!
//! Every test runs the real [`ApiClient`] and [`CheckoutRuntime`] against a
//! `wiremock` server standing in for the Segishop backend, so no network or
//! database is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p segishop-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `api_client` - Endpoint wire formats, rejections and session expiry
//! - `checkout_flow` - Runtime behavior end to end: quoting, totals,
//!   coupons, superseded responses and sign-out resets
//!
//! [`ApiClient`]: segishop_checkout::ApiClient
//! [`CheckoutRuntime`]: segishop_checkout::CheckoutRuntime

use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use segishop_checkout::config::normalize_api_url;
use segishop_checkout::{ApiClient, CheckoutConfig, Session};
use segishop_core::{Address, Cart, CartLine, Country, Money, ProductId};
use serde_json::{Value, json};
use wiremock::MockServer;

/// Debounce short enough that tests don't wait on it.
pub const TEST_DEBOUNCE: Duration = Duration::from_millis(20);

/// Token the signed-in fixtures present.
pub const TEST_TOKEN: &str = "test-session-token";

/// Configuration pointing at the mock server.
#[must_use]
pub fn config_for(server: &MockServer) -> CheckoutConfig {
    CheckoutConfig {
        api_url: normalize_api_url(&server.uri()),
        request_timeout: Duration::from_secs(2),
        address_debounce: TEST_DEBOUNCE,
        ..CheckoutConfig::default()
    }
}

/// A signed-in session.
#[must_use]
pub fn signed_in() -> Session {
    Session::new(Some(SecretString::from(TEST_TOKEN.to_string())))
}

/// Client for the mock server sharing `session`.
///
/// # Panics
///
/// Panics if the mock server URI is not a valid base URL.
#[must_use]
#[allow(clippy::expect_used)]
pub fn client_for(server: &MockServer, session: Session) -> ApiClient {
    ApiClient::new(&config_for(server), session).expect("mock server URL is valid")
}

/// The reference shopper.
#[must_use]
pub fn jane_doe() -> Address {
    Address {
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        street: "1 Main St".to_string(),
        apartment: None,
        city: "Troy".to_string(),
        state: "NY".to_string(),
        postal_code: "12180".to_string(),
        country: Country::UnitedStates,
        phone: None,
    }
}

/// Jane Doe moved to Beverly Hills.
#[must_use]
pub fn jane_in_california() -> Address {
    Address {
        city: "Beverly Hills".to_string(),
        state: "CA".to_string(),
        postal_code: "90210".to_string(),
        ..jane_doe()
    }
}

/// Two of product 1 at $25.00: a $50.00 subtotal.
#[must_use]
pub fn fifty_dollar_cart() -> Cart {
    Cart::new(vec![CartLine {
        product_id: ProductId::new(1),
        product_name: "Organic Cotton Tee".to_string(),
        sku: Some("TEE-1".to_string()),
        unit_price: Money::new(Decimal::new(2500, 2)),
        quantity: 2,
    }])
}

/// One entry of a shipping calculation response.
#[must_use]
pub fn option_json(id: i32, title: &str, cost: f64) -> Value {
    json!({
        "id": id,
        "title": title,
        "methodType": "flat_rate",
        "cost": cost,
        "estimatedDays": "3-5",
        "isTaxable": false,
        "isEnabled": true
    })
}

/// A successful shipping calculation response.
#[must_use]
pub fn shipping_body(options: &[Value]) -> Value {
    json!({ "success": true, "options": options })
}

/// A successful totals response.
#[must_use]
pub fn totals_body(subtotal: f64, shipping: f64, tax: f64, discount: f64) -> Value {
    json!({
        "success": true,
        "totals": {
            "subtotal": subtotal,
            "shippingCost": shipping,
            "taxAmount": tax,
            "discountAmount": discount,
            "total": subtotal + shipping + tax - discount
        }
    })
}

/// A successful coupon application.
#[must_use]
pub fn coupon_applied_body(code: &str, subtotal: f64, shipping: f64, tax: f64, discount: f64) -> Value {
    json!({
        "success": true,
        "message": "Coupon applied successfully",
        "coupon": {
            "id": 7,
            "code": code,
            "description": "Five dollars off",
            "type": 2,
            "value": discount
        },
        "orderTotals": {
            "subtotal": subtotal,
            "discountAmount": discount,
            "subtotalAfterDiscount": subtotal - discount,
            "shippingAmount": shipping,
            "shippingDiscount": 0,
            "taxAmount": tax,
            "totalAmount": subtotal + shipping + tax - discount,
            "freeShippingApplied": false
        }
    })
}

/// A saved address record as the address book returns it.
#[must_use]
pub fn saved_address_json(id: i32, zip: &str, is_default: bool, is_active: bool) -> Value {
    json!({
        "id": id,
        "userId": 42,
        "type": "Home",
        "firstName": "Jane",
        "lastName": "Doe",
        "address1": "1 Main St",
        "city": "Troy",
        "state": "NY",
        "zipCode": zip,
        "country": "US",
        "isDefault": is_default,
        "isActive": is_active,
        "createdAt": "2026-01-05T10:00:00Z",
        "updatedAt": "2026-01-05T10:00:00Z"
    })
}
