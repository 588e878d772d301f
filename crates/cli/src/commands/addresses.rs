//! Address-book commands.
//!
//! # Environment Variables
//!
//! - `SEGISHOP_AUTH_TOKEN` - required; the address book belongs to a
//!   signed-in shopper

#![allow(clippy::print_stdout)]

use segishop_checkout::{CheckoutConfig, CheckoutError};
use segishop_core::{Address, AddressId, Country, SavedAddress, is_address_complete};

use super::connect_signed_in;

pub async fn list(config: &CheckoutConfig) -> Result<(), CheckoutError> {
    let client = connect_signed_in(config)?;
    let addresses = client.list_addresses().await?;

    if addresses.is_empty() {
        println!("No saved addresses");
        return Ok(());
    }
    for address in &addresses {
        println!("{}", describe(address));
    }
    Ok(())
}

pub async fn remove(config: &CheckoutConfig, id: AddressId) -> Result<(), CheckoutError> {
    let client = connect_signed_in(config)?;
    client.delete_address(id).await?;
    tracing::info!(address_id = %id, "Address removed");
    println!("Removed address {id}");
    Ok(())
}

pub async fn set_default(config: &CheckoutConfig, id: AddressId) -> Result<(), CheckoutError> {
    let client = connect_signed_in(config)?;
    let address = client.set_default_address(id).await?;
    println!("Default address is now:\n{}", describe(&address));
    Ok(())
}

pub async fn suggest(
    config: &CheckoutConfig,
    partial: &str,
    country: &Country,
    state: Option<&str>,
) -> Result<(), CheckoutError> {
    let client = connect_signed_in(config)?;
    let suggestions = client.postal_suggestions(partial, country, state).await?;

    if !suggestions.is_valid_format {
        println!(
            "{}",
            suggestions
                .message
                .as_deref()
                .unwrap_or("Postal code format is not valid")
        );
    }
    for code in &suggestions.suggestions {
        println!("{code}");
    }
    Ok(())
}

/// `#4 [default] Home: Jane Doe, 1 Main St, Troy, NY 12180`
fn describe(saved: &SavedAddress) -> String {
    let address = Address::from(saved);
    let default = if saved.is_default { " [default]" } else { "" };
    let incomplete = if is_address_complete(&address) {
        ""
    } else {
        " (incomplete)"
    };
    format!(
        "#{}{default} {:?}: {}, {}{incomplete}",
        saved.id,
        saved.kind,
        address.full_name(),
        address.one_line()
    )
}
