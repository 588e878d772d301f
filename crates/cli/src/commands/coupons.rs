//! Coupon commands.

#![allow(clippy::print_stdout)]

use segishop_checkout::{CheckoutConfig, CheckoutError};

use super::connect;

pub async fn available(config: &CheckoutConfig) -> Result<(), CheckoutError> {
    let client = connect(config)?;
    let coupons = client.available_coupons().await?;

    if coupons.is_empty() {
        println!("No coupons available");
    }
    for coupon in &coupons {
        println!("{:<16} {}", coupon.code, coupon.headline());
        if !coupon.description.is_empty() {
            println!("{:<16} {}", "", coupon.description);
        }
    }
    Ok(())
}
