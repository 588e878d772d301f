//! `segishop quote`: run one checkout from address to gate.
//!
//! The address, cart, shipping selection and coupon are fed to a
//! [`CheckoutRuntime`] in the order a shopper would enter them, waiting for
//! each step to settle before the next. The backend's deliverability verdict
//! and tax rate for the chosen option are printed alongside the totals.

#![allow(clippy::print_stdout)]

use std::sync::Arc;

use clap::Args;
use rust_decimal::Decimal;
use segishop_checkout::api::types::{CartItemPayload, TaxCalculationRequest, TaxQuote};
use segishop_checkout::{
    CheckoutConfig, CheckoutError, CheckoutRuntime, CheckoutSnapshot, NoticeKind, Session,
};
use segishop_core::{
    Address, AddressId, Cart, CartLine, CheckoutGate, Country, Money, ProductId, ShippingOptionId,
};
use thiserror::Error;
use tracing::warn;

use super::connect;

#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// Use a saved address instead of the address flags
    #[arg(long, conflicts_with_all = ["first_name", "last_name", "street", "city", "state", "zip"])]
    saved: Option<AddressId>,

    #[arg(long, required_unless_present = "saved")]
    first_name: Option<String>,
    #[arg(long, required_unless_present = "saved")]
    last_name: Option<String>,
    #[arg(long, required_unless_present = "saved")]
    street: Option<String>,
    #[arg(long)]
    apartment: Option<String>,
    #[arg(long, required_unless_present = "saved")]
    city: Option<String>,
    #[arg(long, required_unless_present = "saved")]
    state: Option<String>,
    #[arg(long, required_unless_present = "saved")]
    zip: Option<String>,
    #[arg(long, default_value = "US")]
    country: Country,
    #[arg(long)]
    phone: Option<String>,

    /// Cart line as `<product_id>:<quantity>:<unit_price>`; repeatable
    #[arg(long = "line", value_parser = parse_line, required = true)]
    lines: Vec<CartLine>,

    /// Shipping option to select instead of the first one offered
    #[arg(long)]
    option: Option<ShippingOptionId>,

    /// Promo code to apply
    #[arg(long)]
    coupon: Option<String>,
}

impl QuoteArgs {
    fn manual_address(&self) -> Address {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Address {
            first_name: text(&self.first_name),
            last_name: text(&self.last_name),
            street: text(&self.street),
            apartment: self.apartment.clone(),
            city: text(&self.city),
            state: text(&self.state),
            postal_code: text(&self.zip),
            country: self.country.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// A `--line` value that could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineParseError {
    #[error("expected <product_id>:<quantity>:<unit_price>, got {0:?}")]
    Shape(String),
    #[error("invalid {field} {value:?}")]
    Field { field: &'static str, value: String },
}

fn parse_line(raw: &str) -> Result<CartLine, LineParseError> {
    let parts: Vec<&str> = raw.split(':').map(str::trim).collect();
    let [id, quantity, price] = parts.as_slice() else {
        return Err(LineParseError::Shape(raw.to_string()));
    };
    let field = |field: &'static str, value: &str| LineParseError::Field {
        field,
        value: value.to_string(),
    };

    let product_id: ProductId = id.parse().map_err(|_| field("product id", id))?;
    let quantity: u32 = quantity
        .parse()
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| field("quantity", quantity))?;
    let unit_price: Decimal = price
        .trim_start_matches('$')
        .parse()
        .ok()
        .filter(|p: &Decimal| !p.is_sign_negative())
        .ok_or_else(|| field("unit price", price))?;

    Ok(CartLine {
        product_id,
        product_name: format!("Product {product_id}"),
        sku: None,
        unit_price: Money::new(unit_price),
        quantity,
    })
}

pub async fn run(config: &CheckoutConfig, args: QuoteArgs) -> Result<(), CheckoutError> {
    let client = connect(config)?;
    let session: Session = client.session().clone();
    let checkout = CheckoutRuntime::spawn(
        Arc::new(client.clone()),
        session,
        config.runtime_settings(),
    );

    let cart = Cart::new(args.lines.clone());
    checkout.set_cart(cart.clone()).await?;
    let address = match args.saved {
        Some(id) => {
            let saved = client.get_address(id).await?;
            let address = Address::from(&saved);
            checkout.select_saved_address(saved).await?;
            address
        }
        None => {
            let address = args.manual_address();
            checkout.set_address(address.clone()).await?;
            address
        }
    };
    let deliverability = client.check_deliverability(&address).await;
    let mut snapshot = checkout.settled().await?;

    if let Some(id) = args.option {
        checkout.select_option(id).await?;
        snapshot = checkout.settled().await?;
    }
    if let Some(code) = args.coupon {
        checkout.apply_coupon(code).await?;
        snapshot = checkout.settled().await?;
    }

    print_snapshot(&snapshot);
    match deliverability {
        Ok(verdict) => println!("\n{}", describe_deliverability(&verdict)),
        Err(err) => warn!(error = %err, "Deliverability check failed"),
    }
    if let Some(option) = &snapshot.selected_option {
        let request = TaxCalculationRequest {
            items: cart.lines.iter().map(CartItemPayload::from).collect(),
            subtotal: cart.subtotal(),
            shipping_address: address,
            selected_shipping_option_id: Some(option.id),
        };
        match client.calculate_tax(&request).await {
            Ok(quote) => println!("{}", describe_tax(&quote)),
            Err(err) => warn!(error = %err, "Tax quote failed"),
        }
    }

    match checkout.proceed().await? {
        Ok(ticket) => println!("\nReady to pay {}", ticket.totals.total),
        Err(blocked) => println!("\nCannot proceed: {blocked}"),
    }

    checkout.shutdown().await
}

fn describe_deliverability(verdict: &Result<(), String>) -> String {
    match verdict {
        Ok(()) => "Deliverable".to_string(),
        Err(reason) => format!("Not deliverable: {reason}"),
    }
}

fn describe_tax(quote: &TaxQuote) -> String {
    if !quote.taxable {
        return "Tax: not taxable".to_string();
    }
    let percent = (quote.rate * Decimal::ONE_HUNDRED).normalize();
    format!("Tax rate {percent}% ({})", quote.amount)
}

fn print_snapshot(snapshot: &CheckoutSnapshot) {
    if let Some(address) = &snapshot.address {
        println!("Ship to: {}, {}", address.full_name(), address.one_line());
    }
    for error in &snapshot.field_errors {
        println!("  ! {}: {}", error.field.label(), error.message);
    }

    println!("\nShipping options:");
    if snapshot.shipping_options.is_empty() {
        println!("  (none)");
    }
    for option in &snapshot.shipping_options {
        let marker = if snapshot.selected_option.as_ref().is_some_and(|s| s.id == option.id) {
            '*'
        } else {
            ' '
        };
        println!("  {marker} [{}] {}", option.id, option.summary());
    }

    if let Some(coupon) = &snapshot.coupon {
        let stale = if snapshot.discount_stale { " (stale)" } else { "" };
        println!("\nCoupon {}: -{}{stale}", coupon.code, coupon.discount);
    }
    if let Some(rejection) = &snapshot.coupon_rejection {
        println!("\nCoupon rejected: {rejection}");
    }
    if let Some(error) = &snapshot.coupon_input_error {
        println!("\nCoupon: {error}");
    }

    let totals = &snapshot.totals.totals;
    println!("\nSubtotal  {:>10}", totals.subtotal);
    println!("Shipping  {:>10}", totals.shipping);
    println!("Tax       {:>10}", totals.tax);
    if !totals.discount.is_zero() {
        println!("Discount  {:>10}", format!("-{}", totals.discount));
    }
    println!("Total     {:>10}", totals.total);
    println!(
        "Source: {}{}",
        snapshot.totals.source.label(),
        if snapshot.totals.stale { " (stale)" } else { "" }
    );

    let progress = snapshot.free_shipping;
    if progress.qualifies {
        println!("Free shipping unlocked");
    } else {
        println!(
            "Add {} more for free shipping ({}%)",
            progress.remaining, progress.percent
        );
    }

    for notice in &snapshot.notices {
        let label = match notice.kind {
            NoticeKind::Validation => "invalid",
            NoticeKind::Network => "error",
            NoticeKind::BusinessRule => "notice",
        };
        match &notice.retry {
            Some(retry) => println!("[{label}] {} ({})", notice.message, retry.label()),
            None => println!("[{label}] {}", notice.message),
        }
    }

    println!("\nCheckout: {}", snapshot.gate);
    if let CheckoutGate::Incomplete { checklist } = &snapshot.gate {
        for item in checklist {
            println!("  - {item}");
        }
    }
}
