//! Segishop Checkout - order draft, backend client and async runtime.
//!
//! # Architecture
//!
//! - [`draft::OrderDraft`] is the single writer for the current order
//!   draft. It consumes [`draft::Event`]s and returns [`draft::Effect`]s;
//!   it never performs I/O itself.
//! - [`runtime::CheckoutRuntime`] owns a draft on one tokio task, executes
//!   its effects against a [`backend::CheckoutBackend`] and publishes a
//!   [`draft::CheckoutSnapshot`] after every event.
//! - [`api::ApiClient`] is the REST client for the Segishop backend. It
//!   carries an injected [`session::Session`] and expires it on a 401.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use segishop_checkout::{ApiClient, CheckoutConfig, CheckoutRuntime, Session};
//!
//! let config = CheckoutConfig::from_env()?;
//! let session = Session::new(config.auth_token.clone());
//! let client = ApiClient::new(&config, session.clone())?;
//! let checkout = CheckoutRuntime::spawn(Arc::new(client), session, config.runtime_settings());
//!
//! checkout.set_address(address).await?;
//! let snapshot = checkout.settled().await?;
//! println!("{}", snapshot.totals.totals.total);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod backend;
pub mod config;
pub mod draft;
pub mod error;
pub mod runtime;
pub mod session;

pub use api::{ApiClient, ApiError};
pub use backend::CheckoutBackend;
pub use config::{CheckoutConfig, ConfigError, RuntimeSettings};
pub use draft::{CheckoutSnapshot, Effect, Event, OrderDraft, ProceedBlocked, ProceedTicket};
pub use error::{CheckoutError, Failure, Notice, NoticeKind, NoticeScope, RetryAction};
pub use runtime::{CheckoutHandle, CheckoutRuntime};
pub use session::{Session, SessionState};
