//! Core types for Segishop checkout.
//!
//! This module provides type-safe wrappers for the checkout domain.

pub mod address;
pub mod cart;
pub mod coupon;
pub mod id;
pub mod money;
pub mod shipping;
pub mod totals;

pub use address::{Address, AddressField, AddressKind, AddressSelection, Country, SavedAddress};
pub use cart::{Cart, CartLine};
pub use coupon::{
    AppliedCoupon, AvailableCoupon, CouponCode, CouponCodeError, CouponKind, CouponRejection,
};
pub use id::*;
pub use money::{CurrencyCode, Money};
pub use shipping::{FreeShippingProgress, ShippingOption};
pub use totals::{OrderTotals, TotalsCandidate, TotalsSource, TotalsValues};
