//! Integration tests for the backend client.
//!
//! Each test stands up a mock Segishop backend and checks both what the
//! client sends and how it reads the answer.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use segishop_checkout::api::types::{
    CartItemPayload, CouponRequest, CreateUserAddressRequest, OrderTotalsRequest,
    ShippingCalculationRequest, TaxCalculationRequest,
};
use segishop_checkout::{ApiError, Session, SessionState};
use segishop_core::{
    AddressId, AddressKind, CouponCode, CouponKind, Country, Money, ShippingOptionId, TotalsValues,
};
use segishop_integration_tests::{
    TEST_TOKEN, client_for, coupon_applied_body, fifty_dollar_cart, jane_doe, option_json,
    saved_address_json, shipping_body, signed_in, totals_body,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn shipping_request() -> ShippingCalculationRequest {
    let cart = fifty_dollar_cart();
    ShippingCalculationRequest {
        items: cart.lines.iter().map(CartItemPayload::from).collect(),
        subtotal: cart.subtotal(),
        shipping_address: jane_doe(),
    }
}

fn coupon_request(code: &str) -> CouponRequest {
    CouponRequest {
        code: CouponCode::parse(code).unwrap(),
        order_subtotal: Money::new(dec!(50)),
        shipping_amount: Money::new(dec!(10)),
        tax_amount: Money::new(dec!(4)),
    }
}

// ============================================================================
// Shipping & Totals
// ============================================================================

#[tokio::test]
async fn test_calculate_shipping_sends_address_and_drops_disabled_options() {
    let server = MockServer::start().await;
    let mut disabled = option_json(9, "Freight", 80.0);
    disabled["isEnabled"] = json!(false);

    Mock::given(method("POST"))
        .and(path("/api/Shipping/calculate"))
        .and(body_partial_json(json!({
            "subtotal": 50.0,
            "shippingAddress": {
                "firstName": "Jane",
                "address": "1 Main St",
                "zipCode": "12180",
                "country": "US"
            },
            "items": [{ "productId": 1, "quantity": 2 }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(shipping_body(&[
            option_json(1, "Standard Shipping", 10.0),
            option_json(2, "Express Shipping", 25.0),
            disabled,
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Session::anonymous());
    let options = client.calculate_shipping(&shipping_request()).await.unwrap();

    let ids: Vec<ShippingOptionId> = options.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![ShippingOptionId::new(1), ShippingOptionId::new(2)]);
    assert_eq!(options[0].cost, Money::new(dec!(10)));
    assert_eq!(options[0].summary(), "Standard Shipping ($10.00, 3-5 days)");
}

#[tokio::test]
async fn test_calculate_shipping_reports_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/Shipping/calculate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "errorMessage": "No shipping zone covers this address"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Session::anonymous());
    let error = client.calculate_shipping(&shipping_request()).await.unwrap_err();

    assert!(matches!(error, ApiError::Rejected { .. }));
    assert_eq!(error.to_string(), "No shipping zone covers this address");
}

#[tokio::test]
async fn test_calculate_totals_prices_coupon_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/Shipping/calculate-totals"))
        .and(body_partial_json(json!({
            "selectedShippingOptionId": 1,
            "couponCode": "SAVE10"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(totals_body(50.0, 10.0, 4.0, 5.0)))
        .expect(1)
        .mount(&server)
        .await;

    let cart = fifty_dollar_cart();
    let request = OrderTotalsRequest {
        items: cart.lines.iter().map(CartItemPayload::from).collect(),
        subtotal: cart.subtotal(),
        shipping_address: jane_doe(),
        selected_shipping_option_id: Some(ShippingOptionId::new(1)),
        coupon_code: Some(CouponCode::parse("save10").unwrap()),
    };

    let client = client_for(&server, Session::anonymous());
    let values = client.calculate_totals(&request).await.unwrap();

    assert_eq!(
        values,
        TotalsValues {
            subtotal: Money::new(dec!(50)),
            shipping: Money::new(dec!(10)),
            tax: Money::new(dec!(4)),
            discount: Money::new(dec!(5)),
        }
    );
}

#[tokio::test]
async fn test_calculate_tax_for_selected_option() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/Shipping/calculate-tax"))
        .and(body_partial_json(json!({ "selectedShippingOptionId": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "taxAmount": 4.0,
            "taxRate": 0.08,
            "isTaxable": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cart = fifty_dollar_cart();
    let request = TaxCalculationRequest {
        items: cart.lines.iter().map(CartItemPayload::from).collect(),
        subtotal: cart.subtotal(),
        shipping_address: jane_doe(),
        selected_shipping_option_id: Some(ShippingOptionId::new(1)),
    };

    let client = client_for(&server, Session::anonymous());
    let quote = client.calculate_tax(&request).await.unwrap();

    assert_eq!(quote.amount, Money::new(dec!(4)));
    assert_eq!(quote.rate, dec!(0.08));
    assert!(quote.taxable);
}

#[tokio::test]
async fn test_undeliverable_address_explains_why() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/Shipping/validate-address"))
        .and(body_partial_json(json!({ "zipCode": "12180" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "isValid": false,
            "message": "We do not currently ship to New York"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Session::anonymous());
    let verdict = client.check_deliverability(&jane_doe()).await.unwrap();

    assert_eq!(verdict, Err("We do not currently ship to New York".to_string()));
}

#[tokio::test]
async fn test_missing_totals_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/Shipping/calculate-totals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    let cart = fifty_dollar_cart();
    let request = OrderTotalsRequest {
        items: cart.lines.iter().map(CartItemPayload::from).collect(),
        subtotal: cart.subtotal(),
        shipping_address: jane_doe(),
        selected_shipping_option_id: Some(ShippingOptionId::new(1)),
        coupon_code: None,
    };

    let client = client_for(&server, Session::anonymous());
    let error = client.calculate_totals(&request).await.unwrap_err();
    assert!(matches!(error, ApiError::EmptyBody("totals")));
}

#[tokio::test]
async fn test_server_error_is_not_a_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/Shipping/calculate"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let client = client_for(&server, Session::anonymous());
    let error = client.calculate_shipping(&shipping_request()).await.unwrap_err();

    assert!(matches!(error, ApiError::Api { status: 503, .. }));
}

// ============================================================================
// Coupons
// ============================================================================

#[tokio::test]
async fn test_apply_coupon_returns_backend_discount_and_totals() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/coupons/apply"))
        .and(body_partial_json(json!({
            "code": "SAVE10",
            "orderSubtotal": 50.0,
            "shippingAmount": 10.0,
            "taxAmount": 4.0
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(coupon_applied_body("SAVE10", 50.0, 10.0, 4.0, 5.0)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Session::anonymous());
    let application = client.apply_coupon(&coupon_request("save10")).await.unwrap();

    assert_eq!(application.coupon.code.as_str(), "SAVE10");
    assert_eq!(application.coupon.discount, Money::new(dec!(5)));
    assert_eq!(application.values.shipping, Money::new(dec!(10)));
    assert_eq!(application.message, "Coupon applied successfully");
    assert!(!application.free_shipping_applied);
}

#[tokio::test]
async fn test_coupon_rejection_keeps_backend_wording() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/coupons/apply"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "message": "This coupon has expired"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Session::anonymous());
    let error = client.apply_coupon(&coupon_request("OLD")).await.unwrap_err();

    assert!(matches!(error, ApiError::Rejected { status: 400, .. }));
    assert_eq!(error.to_string(), "This coupon has expired");
}

#[tokio::test]
async fn test_remove_coupon_falls_back_to_request_amounts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/coupons/remove"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    let client = client_for(&server, Session::anonymous());
    let values = client.remove_coupon(&coupon_request("SAVE10")).await.unwrap();

    assert_eq!(values.subtotal, Money::new(dec!(50)));
    assert_eq!(values.shipping, Money::new(dec!(10)));
    assert_eq!(values.tax, Money::new(dec!(4)));
    assert!(values.discount.is_zero());
}

#[tokio::test]
async fn test_available_coupons_are_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/coupons/available"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "coupons": [
                { "code": "SAVE10", "description": "Ten percent", "type": 1, "value": 10 },
                { "code": "FIVE", "description": "", "type": "FixedAmount", "value": 5 },
                { "code": "SHIPFREE", "description": "", "type": 3, "value": 0 },
                { "code": "EXTRA", "description": "", "type": 1, "value": 15 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Session::anonymous());
    let coupons = client.available_coupons().await.unwrap();
    let hints = client.coupon_hints().await.unwrap();

    assert_eq!(coupons.len(), 4);
    assert_eq!(coupons[1].kind, CouponKind::FixedAmount);
    assert_eq!(coupons[0].headline(), "10% off");
    assert_eq!(coupons[2].headline(), "Free shipping");
    assert_eq!(hints.len(), 3);
}

// ============================================================================
// Session
// ============================================================================

#[tokio::test]
async fn test_signed_in_requests_carry_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/useraddress"))
        .and(header("Authorization", format!("Bearer {TEST_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "addresses": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, signed_in());
    assert!(client.list_addresses().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unauthorized_expires_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/useraddress"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let session = signed_in();
    let mut observer = session.subscribe();
    let client = client_for(&server, session.clone());

    let error = client.list_addresses().await.unwrap_err();

    assert!(matches!(error, ApiError::Unauthorized));
    assert_eq!(session.state(), SessionState::Expired);
    assert!(observer.has_changed().unwrap());
    assert_eq!(observer.borrow_and_update().state(), SessionState::Expired);
}

#[tokio::test]
async fn test_guest_stays_anonymous_on_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/coupons/apply"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let session = Session::anonymous();
    let client = client_for(&server, session.clone());

    let error = client.apply_coupon(&coupon_request("MEMBERS")).await.unwrap_err();
    assert!(matches!(error, ApiError::Unauthorized));
    assert_eq!(session.state(), SessionState::Anonymous);
}

// ============================================================================
// Address Book
// ============================================================================

#[tokio::test]
async fn test_list_addresses_skips_inactive_and_puts_default_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/useraddress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "addresses": [
                saved_address_json(1, "12180", false, true),
                saved_address_json(2, "12181", false, false),
                saved_address_json(3, "12182", true, true)
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, signed_in());
    let addresses = client.list_addresses().await.unwrap();

    let ids: Vec<AddressId> = addresses.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![AddressId::new(3), AddressId::new(1)]);
    assert!(addresses[0].is_default);
}

#[tokio::test]
async fn test_create_address_after_zone_check() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/useraddress/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "isValid": true,
            "shippingZoneId": 3,
            "shippingZoneName": "Northeast"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/useraddress"))
        .and(body_partial_json(json!({
            "type": "Home",
            "address1": "1 Main St",
            "zipCode": "12180",
            "country": "US",
            "isDefault": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "message": "Address created successfully",
            "address": saved_address_json(5, "12180", true, true)
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, signed_in());
    let request = CreateUserAddressRequest::from_address(&jane_doe(), AddressKind::Home, true);

    let zone = client.validate_address(&request).await.unwrap();
    assert!(zone.is_valid);
    assert_eq!(zone.zone_name.as_deref(), Some("Northeast"));

    let saved = client.create_address(&request).await.unwrap();
    assert_eq!(saved.id, AddressId::new(5));
    assert!(saved.is_default);
}

#[tokio::test]
async fn test_set_default_address_sends_flag_only() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/useraddress/4"))
        .and(body_partial_json(json!({ "isDefault": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "address": saved_address_json(4, "12180", true, true)
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, signed_in());
    let address = client.set_default_address(AddressId::new(4)).await.unwrap();
    assert!(address.is_default);
}

#[tokio::test]
async fn test_delete_missing_address_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/useraddress/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "message": "Address not found"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, signed_in());
    let error = client.delete_address(AddressId::new(99)).await.unwrap_err();
    assert_eq!(error.to_string(), "Address not found");
}

#[tokio::test]
async fn test_postal_suggestions_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/useraddress/postal-suggestions"))
        .and(query_param("partialCode", "121"))
        .and(query_param("country", "US"))
        .and(query_param("state", "NY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "suggestions": ["12180", "12182"],
            "isValidFormat": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, signed_in());
    let suggestions = client
        .postal_suggestions(" 121 ", &Country::UnitedStates, Some("NY"))
        .await
        .unwrap();

    assert!(suggestions.is_valid_format);
    assert_eq!(suggestions.suggestions, vec!["12180", "12182"]);
}
