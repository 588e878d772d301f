//! Segishop Core - Shared checkout types and pricing rules.
//!
//! This crate provides the value types and pure rules used by every
//! Segishop checkout surface:
//! - `checkout` - Backend client, order draft state machine and async runtime
//! - `cli` - Command-line front end for quoting and address management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no clocks. Every rule that more than one surface depends on
//! (address completeness, total arithmetic, source precedence, gating) lives
//! here exactly once.
//!
//! # Modules
//!
//! - [`types`] - Ids, money, addresses, shipping options, coupons, totals
//! - [`validation`] - Address completeness predicate and inline field checks
//! - [`reconcile`] - Total arithmetic and the ordered totals-source precedence
//! - [`gate`] - Checkout gating state machine and the missing-items checklist
//! - [`sequence`] - Monotonic request tagging for last-issued-wins responses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod gate;
pub mod reconcile;
pub mod sequence;
pub mod types;
pub mod validation;

pub use gate::{CheckoutGate, ChecklistItem, GateInputs};
pub use reconcile::{PRECEDENCE, ReconcileInputs, Reconciled, SourceKind, compute_total, reconcile};
pub use sequence::{Revision, Seq, Sequencer, Stamp};
pub use types::*;
pub use validation::{
    FieldError, PostalCodeError, field_errors, is_address_complete, missing_fields,
    validate_postal_code,
};
