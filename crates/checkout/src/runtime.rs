//! Async driver for an [`OrderDraft`].
//!
//! # Architecture
//!
//! - One tokio task owns the draft. Shopper intents from [`CheckoutHandle`]
//!   and completions from effect tasks share one command channel, so the
//!   draft sees a single ordered stream of events.
//! - Each [`Effect`] runs on its own task. Backend calls are bounded by the
//!   configured request timeout and report back as completion events.
//! - After every event the current [`CheckoutSnapshot`] is published on a
//!   watch channel.
//! - Session changes are observed before queued commands, so a completion
//!   that follows a 401 is handled against the reset draft.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use segishop_core::{Address, AddressField, Cart, SavedAddress, ShippingOptionId};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::backend::CheckoutBackend;
use crate::config::RuntimeSettings;
use crate::draft::{CheckoutSnapshot, Effect, Event, OrderDraft, ProceedBlocked, ProceedTicket};
use crate::error::{CheckoutError, Failure, NoticeScope, RetryAction};
use crate::session::{Session, SessionSnapshot};

const COMMAND_BUFFER: usize = 64;

#[derive(Debug)]
enum Command {
    Event(Event),
    /// Reply once nothing is outstanding.
    Settled(oneshot::Sender<CheckoutSnapshot>),
    Proceed(oneshot::Sender<Result<ProceedTicket, ProceedBlocked>>),
    Shutdown,
}

// =============================================================================
// Runtime
// =============================================================================

/// The task that owns a checkout draft.
pub struct CheckoutRuntime<B> {
    draft: OrderDraft,
    backend: Arc<B>,
    request_timeout: Duration,
    commands: mpsc::Receiver<Command>,
    /// Handed to effect tasks; weak so the runtime stops once every handle
    /// and task is gone.
    completions: mpsc::WeakSender<Command>,
    session: watch::Receiver<SessionSnapshot>,
    session_open: bool,
    snapshots: watch::Sender<CheckoutSnapshot>,
    waiting: Vec<oneshot::Sender<CheckoutSnapshot>>,
}

impl<B: CheckoutBackend + 'static> CheckoutRuntime<B> {
    /// Start a checkout on the current tokio runtime.
    #[must_use]
    pub fn spawn(backend: Arc<B>, session: Session, settings: RuntimeSettings) -> CheckoutHandle {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let draft = OrderDraft::new(settings, session.is_signed_in());
        let (snapshots, snapshot_rx) = watch::channel(draft.snapshot());

        let runtime = Self {
            draft,
            backend,
            request_timeout: settings.request_timeout,
            commands: rx,
            completions: tx.downgrade(),
            session: session.subscribe(),
            session_open: true,
            snapshots,
            waiting: Vec::new(),
        };
        tokio::spawn(runtime.run());

        CheckoutHandle {
            commands: tx,
            snapshots: snapshot_rx,
        }
    }

    async fn run(mut self) {
        info!("Checkout runtime started");
        loop {
            tokio::select! {
                biased;

                changed = self.session.changed(), if self.session_open => {
                    if changed.is_ok() {
                        let state = self.session.borrow_and_update().state();
                        self.apply(Event::SessionChanged(state));
                    } else {
                        self.session_open = false;
                    }
                }

                command = self.commands.recv() => match command {
                    Some(Command::Event(event)) => self.apply(event),
                    Some(Command::Settled(reply)) => {
                        if self.draft.is_settled() {
                            let _ = reply.send(self.draft.snapshot());
                        } else {
                            self.waiting.push(reply);
                        }
                    }
                    Some(Command::Proceed(reply)) => {
                        let _ = reply.send(self.draft.proceed());
                    }
                    Some(Command::Shutdown) | None => break,
                },
            }
        }
        debug!("Checkout runtime stopped");
    }

    fn apply(&mut self, event: Event) {
        for effect in self.draft.handle(event) {
            self.execute(effect);
        }

        let snapshot = self.draft.snapshot();
        if snapshot.settled {
            for reply in self.waiting.drain(..) {
                let _ = reply.send(snapshot.clone());
            }
        }
        self.snapshots.send_replace(snapshot);
    }

    fn execute(&self, effect: Effect) {
        let Some(tx) = self.completions.upgrade() else {
            return;
        };
        let backend = Arc::clone(&self.backend);
        let limit = self.request_timeout;

        match effect {
            Effect::ScheduleShippingFetch { seq, delay } => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(Command::Event(Event::ShippingDebounceElapsed(seq))).await;
                });
            }
            Effect::FetchShipping { seq, request } => {
                tokio::spawn(async move {
                    let result = call("shipping", limit, backend.calculate_shipping(&request)).await;
                    let _ = tx.send(Command::Event(Event::ShippingQuoted { seq, result })).await;
                });
            }
            Effect::CalculateTotals {
                seq,
                basis,
                request,
            } => {
                tokio::spawn(async move {
                    let result = call("totals", limit, backend.calculate_totals(&request)).await;
                    let event = Event::TotalsCalculated {
                        seq,
                        basis,
                        coupon_code: request.coupon_code,
                        result,
                    };
                    let _ = tx.send(Command::Event(event)).await;
                });
            }
            Effect::ApplyCoupon {
                seq,
                basis,
                request,
            } => {
                tokio::spawn(async move {
                    let result = call("coupon apply", limit, backend.apply_coupon(&request)).await;
                    let event = Event::CouponApplied {
                        seq,
                        basis,
                        code: request.code,
                        result,
                    };
                    let _ = tx.send(Command::Event(event)).await;
                });
            }
            Effect::RemoveCoupon { seq, request } => {
                tokio::spawn(async move {
                    let result = call("coupon remove", limit, backend.remove_coupon(&request)).await;
                    let _ = tx.send(Command::Event(Event::CouponRemoved { seq, result })).await;
                });
            }
        }
    }
}

/// Run a backend call under the request timeout.
async fn call<T>(
    operation: &'static str,
    limit: Duration,
    request: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, Failure> {
    let result = match tokio::time::timeout(limit, request).await {
        Ok(result) => result.map_err(Failure::from),
        Err(_) => Err(Failure::Timeout),
    };
    if let Err(failure) = &result {
        if failure.is_transient() {
            warn!(operation, error = %failure, "Backend call failed");
        } else {
            debug!(operation, error = %failure, "Backend refused request");
        }
    }
    result
}

// =============================================================================
// Handle
// =============================================================================

/// Cloneable handle for driving a running checkout.
#[derive(Debug, Clone)]
pub struct CheckoutHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<CheckoutSnapshot>,
}

impl CheckoutHandle {
    /// Queue an event for the draft.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::RuntimeClosed`] if the runtime has stopped.
    pub async fn dispatch(&self, event: Event) -> Result<(), CheckoutError> {
        self.send(Command::Event(event)).await
    }

    async fn send(&self, command: Command) -> Result<(), CheckoutError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CheckoutError::RuntimeClosed)
    }

    /// Use an address-book entry as the shipping address.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::RuntimeClosed`] if the runtime has stopped.
    pub async fn select_saved_address(&self, address: SavedAddress) -> Result<(), CheckoutError> {
        self.dispatch(Event::SelectSavedAddress(address)).await
    }

    /// Change one field of the address form.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::RuntimeClosed`] if the runtime has stopped.
    pub async fn edit_field(
        &self,
        field: AddressField,
        value: impl Into<String>,
    ) -> Result<(), CheckoutError> {
        self.dispatch(Event::EditAddressField {
            field,
            value: value.into(),
        })
        .await
    }

    /// Replace the whole address form.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::RuntimeClosed`] if the runtime has stopped.
    pub async fn set_address(&self, address: Address) -> Result<(), CheckoutError> {
        self.dispatch(Event::SetAddress(address)).await
    }

    /// # Errors
    ///
    /// Returns [`CheckoutError::RuntimeClosed`] if the runtime has stopped.
    pub async fn set_cart(&self, cart: Cart) -> Result<(), CheckoutError> {
        self.dispatch(Event::SetCart(cart)).await
    }

    /// # Errors
    ///
    /// Returns [`CheckoutError::RuntimeClosed`] if the runtime has stopped.
    pub async fn select_option(&self, id: ShippingOptionId) -> Result<(), CheckoutError> {
        self.dispatch(Event::SelectShippingOption(id)).await
    }

    /// # Errors
    ///
    /// Returns [`CheckoutError::RuntimeClosed`] if the runtime has stopped.
    pub async fn apply_coupon(&self, code: impl Into<String>) -> Result<(), CheckoutError> {
        self.dispatch(Event::ApplyCoupon(code.into())).await
    }

    /// # Errors
    ///
    /// Returns [`CheckoutError::RuntimeClosed`] if the runtime has stopped.
    pub async fn remove_coupon(&self) -> Result<(), CheckoutError> {
        self.dispatch(Event::RemoveCoupon).await
    }

    /// # Errors
    ///
    /// Returns [`CheckoutError::RuntimeClosed`] if the runtime has stopped.
    pub async fn retry(&self, action: RetryAction) -> Result<(), CheckoutError> {
        self.dispatch(Event::Retry(action)).await
    }

    /// # Errors
    ///
    /// Returns [`CheckoutError::RuntimeClosed`] if the runtime has stopped.
    pub async fn dismiss(&self, scope: NoticeScope) -> Result<(), CheckoutError> {
        self.dispatch(Event::DismissNotices(scope)).await
    }

    /// The latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CheckoutSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Observe every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CheckoutSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until every event queued so far has been handled and nothing is
    /// outstanding, then return the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::RuntimeClosed`] if the runtime stops first.
    pub async fn settled(&self) -> Result<CheckoutSnapshot, CheckoutError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Settled(tx)).await?;
        rx.await.map_err(|_| CheckoutError::RuntimeClosed)
    }

    /// Ask to proceed to payment.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::RuntimeClosed`] if the runtime has stopped.
    pub async fn proceed(&self) -> Result<Result<ProceedTicket, ProceedBlocked>, CheckoutError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Proceed(tx)).await?;
        rx.await.map_err(|_| CheckoutError::RuntimeClosed)
    }

    /// Stop the runtime. Outstanding requests finish but are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::RuntimeClosed`] if it already stopped.
    pub async fn shutdown(&self) -> Result<(), CheckoutError> {
        self.send(Command::Shutdown).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use secrecy::SecretString;
    use segishop_core::{
        AppliedCoupon, CartLine, CheckoutGate, ChecklistItem, Country, CouponRejection, Money,
        ProductId, ShippingOption, SourceKind, TotalsValues,
    };

    use super::*;
    use crate::api::types::{
        CouponApplication, CouponRequest, OrderTotalsRequest, ShippingCalculationRequest,
    };
    use crate::draft::ShippingStatus;
    use crate::error::NoticeKind;

    /// Prices like the real backend for a tiny catalogue. Shipping and totals
    /// calls can be delayed one by one.
    #[derive(Default)]
    struct FakeBackend {
        shipping_delays: Mutex<VecDeque<Duration>>,
        totals_delays: Mutex<VecDeque<Duration>>,
        shipping_calls: AtomicUsize,
        totals_calls: AtomicUsize,
    }

    fn delays(secs: &[u64]) -> Mutex<VecDeque<Duration>> {
        Mutex::new(secs.iter().map(|s| Duration::from_secs(*s)).collect())
    }

    impl FakeBackend {
        fn with_shipping_delays(secs: &[u64]) -> Self {
            Self {
                shipping_delays: delays(secs),
                ..Self::default()
            }
        }

        fn with_totals_delays(secs: &[u64]) -> Self {
            Self {
                totals_delays: delays(secs),
                ..Self::default()
            }
        }
    }

    fn option(id: i32, title: &str, cost: rust_decimal::Decimal) -> ShippingOption {
        ShippingOption {
            id: ShippingOptionId::new(id),
            title: title.to_string(),
            method_type: "flat_rate".to_string(),
            cost: Money::new(cost),
            estimated_days: "3-5".to_string(),
            is_taxable: true,
            is_enabled: true,
        }
    }

    fn options_for(zip: &str) -> Vec<ShippingOption> {
        if zip.starts_with("121") {
            vec![option(1, "Standard", dec!(10)), option(2, "Express", dec!(25))]
        } else {
            vec![option(3, "Ground", dec!(7))]
        }
    }

    #[async_trait]
    impl CheckoutBackend for FakeBackend {
        async fn calculate_shipping(
            &self,
            request: &ShippingCalculationRequest,
        ) -> Result<Vec<ShippingOption>, ApiError> {
            self.shipping_calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.shipping_delays.lock().unwrap().pop_front();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok(options_for(&request.shipping_address.postal_code))
        }

        async fn calculate_totals(
            &self,
            request: &OrderTotalsRequest,
        ) -> Result<TotalsValues, ApiError> {
            self.totals_calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.totals_delays.lock().unwrap().pop_front();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let shipping = options_for(&request.shipping_address.postal_code)
                .into_iter()
                .find(|o| Some(o.id) == request.selected_shipping_option_id)
                .map_or(Money::ZERO, |o| o.cost);
            let discount = match request.coupon_code.as_ref().map(|c| c.as_str()) {
                Some("SAVE10") => Money::new(dec!(5)),
                _ => Money::ZERO,
            };
            Ok(TotalsValues {
                subtotal: request.subtotal,
                shipping,
                tax: Money::new(dec!(4)),
                discount,
            })
        }

        async fn apply_coupon(
            &self,
            request: &CouponRequest,
        ) -> Result<CouponApplication, ApiError> {
            match request.code.as_str() {
                "SAVE10" => Ok(CouponApplication {
                    coupon: AppliedCoupon {
                        code: request.code.clone(),
                        description: "10% off".to_string(),
                        discount: Money::new(dec!(5)),
                    },
                    message: "Coupon applied! You save $5.00".to_string(),
                    values: TotalsValues {
                        subtotal: request.order_subtotal,
                        shipping: request.shipping_amount,
                        tax: request.tax_amount,
                        discount: Money::new(dec!(5)),
                    },
                    free_shipping_applied: false,
                }),
                "MEMBERS" => Err(ApiError::Unauthorized),
                _ => Err(ApiError::Rejected {
                    status: 200,
                    message: "Invalid coupon code".to_string(),
                }),
            }
        }

        async fn remove_coupon(&self, request: &CouponRequest) -> Result<TotalsValues, ApiError> {
            Ok(TotalsValues {
                subtotal: request.order_subtotal,
                shipping: request.shipping_amount,
                tax: request.tax_amount,
                discount: Money::ZERO,
            })
        }
    }

    fn jane(zip: &str) -> Address {
        Address {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            street: "1 Main St".to_string(),
            city: "Troy".to_string(),
            state: "NY".to_string(),
            postal_code: zip.to_string(),
            country: Country::UnitedStates,
            ..Address::default()
        }
    }

    fn cart() -> Cart {
        Cart::new(vec![CartLine {
            product_id: ProductId::new(1),
            product_name: "Silk scarf".to_string(),
            sku: None,
            unit_price: Money::new(dec!(25)),
            quantity: 2,
        }])
    }

    fn start(backend: FakeBackend, session: Session) -> (Arc<FakeBackend>, CheckoutHandle) {
        let backend = Arc::new(backend);
        let handle = CheckoutRuntime::spawn(Arc::clone(&backend), session, RuntimeSettings::default());
        (backend, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkout_reaches_ready_with_backend_totals() {
        let (_, checkout) = start(FakeBackend::default(), Session::anonymous());
        checkout.set_cart(cart()).await.unwrap();
        checkout.set_address(jane("12180")).await.unwrap();

        let snapshot = checkout.settled().await.unwrap();
        assert_eq!(snapshot.totals.totals.total, Money::new(dec!(64.00)));
        assert_eq!(snapshot.totals.source, SourceKind::TotalsEndpoint);
        assert_eq!(snapshot.gate, CheckoutGate::Ready);

        let ticket = checkout.proceed().await.unwrap().unwrap();
        assert_eq!(ticket.option.title, "Standard");

        checkout.apply_coupon("save10").await.unwrap();
        let snapshot = checkout.settled().await.unwrap();
        assert_eq!(snapshot.totals.totals.total, Money::new(dec!(59.00)));
        assert_eq!(snapshot.totals.source, SourceKind::CouponResponse);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_edits_issue_one_fetch() {
        let (backend, checkout) = start(FakeBackend::default(), Session::anonymous());
        checkout.set_cart(cart()).await.unwrap();
        checkout.set_address(jane("12180")).await.unwrap();
        checkout.edit_field(AddressField::Street, "1 Main Street").await.unwrap();
        checkout.edit_field(AddressField::Street, "1 Main Street East").await.unwrap();

        let snapshot = checkout.settled().await.unwrap();
        assert_eq!(backend.shipping_calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.totals_calls.load(Ordering::SeqCst), 1);
        assert_eq!(snapshot.address.unwrap().street, "1 Main Street East");
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_quote_arriving_late_is_ignored() {
        // The first fetch takes 5s; the second resolves at once.
        let (backend, checkout) = start(FakeBackend::with_shipping_delays(&[5, 0]), Session::anonymous());
        checkout.set_cart(cart()).await.unwrap();
        checkout.set_address(jane("12180")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(backend.shipping_calls.load(Ordering::SeqCst), 1);
        checkout.edit_field(AddressField::PostalCode, "90210").await.unwrap();

        let snapshot = checkout.settled().await.unwrap();
        assert_eq!(snapshot.shipping_options, options_for("90210"));

        tokio::time::sleep(Duration::from_secs(10)).await;
        let snapshot = checkout.snapshot();
        assert_eq!(snapshot.shipping_options, options_for("90210"));
        assert_eq!(snapshot.totals.totals.total, Money::new(dec!(61.00)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_backend_times_out_with_retry() {
        let (_, checkout) = start(FakeBackend::with_shipping_delays(&[60]), Session::anonymous());
        checkout.set_cart(cart()).await.unwrap();
        checkout.set_address(jane("12180")).await.unwrap();

        let snapshot = checkout.settled().await.unwrap();
        assert_eq!(snapshot.shipping_status, ShippingStatus::Failed);
        assert_eq!(snapshot.notices.len(), 1);
        assert_eq!(snapshot.notices[0].kind, NoticeKind::Network);
        assert_eq!(snapshot.notices[0].retry, Some(RetryAction::RefetchShipping));
        assert_eq!(
            snapshot.gate.checklist(),
            &[ChecklistItem::SelectShippingOption]
        );

        checkout.retry(RetryAction::RefetchShipping).await.unwrap();
        let snapshot = checkout.settled().await.unwrap();
        assert_eq!(snapshot.gate, CheckoutGate::Ready);
        assert!(snapshot.notices.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_and_restricted_coupons() {
        let (_, checkout) = start(FakeBackend::default(), Session::anonymous());
        checkout.set_cart(cart()).await.unwrap();
        checkout.set_address(jane("12180")).await.unwrap();
        checkout.settled().await.unwrap();

        checkout.apply_coupon("BOGUS").await.unwrap();
        let snapshot = checkout.settled().await.unwrap();
        assert_eq!(
            snapshot.coupon_rejection,
            Some(CouponRejection::Invalid("Invalid coupon code".to_string()))
        );
        assert_eq!(snapshot.totals.totals.total, Money::new(dec!(64.00)));

        checkout.apply_coupon("members").await.unwrap();
        let snapshot = checkout.settled().await.unwrap();
        assert_eq!(
            snapshot.coupon_rejection.unwrap().message(),
            "Please log in to apply coupons"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_coupon_applied_while_totals_pending_keeps_discount() {
        // The totals for Express take 5s; everything else is instant.
        let (backend, checkout) = start(FakeBackend::with_totals_delays(&[0, 5, 0]), Session::anonymous());
        checkout.set_cart(cart()).await.unwrap();
        checkout.set_address(jane("12180")).await.unwrap();
        checkout.settled().await.unwrap();

        checkout.select_option(ShippingOptionId::new(2)).await.unwrap();
        checkout.apply_coupon("SAVE10").await.unwrap();
        let snapshot = checkout.settled().await.unwrap();
        assert_eq!(backend.totals_calls.load(Ordering::SeqCst), 3);
        assert_eq!(snapshot.totals.totals.total, Money::new(dec!(74.00)));
        assert_eq!(snapshot.totals.source, SourceKind::TotalsEndpoint);
        assert_eq!(snapshot.gate, CheckoutGate::Ready);

        tokio::time::sleep(Duration::from_secs(10)).await;
        let snapshot = checkout.snapshot();
        assert_eq!(snapshot.totals.totals.discount, Money::new(dec!(5)));
        assert_eq!(snapshot.totals.totals.total, Money::new(dec!(74.00)));
        let ticket = checkout.proceed().await.unwrap().unwrap();
        assert_eq!(ticket.coupon.unwrap().discount, Money::new(dec!(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_coupon_removed_while_totals_pending_drops_discount() {
        let (backend, checkout) = start(FakeBackend::with_totals_delays(&[0, 5, 0]), Session::anonymous());
        checkout.set_cart(cart()).await.unwrap();
        checkout.set_address(jane("12180")).await.unwrap();
        checkout.settled().await.unwrap();
        checkout.apply_coupon("SAVE10").await.unwrap();
        checkout.settled().await.unwrap();

        // Sent with SAVE10 and answered only after the removal.
        checkout.select_option(ShippingOptionId::new(2)).await.unwrap();
        checkout.remove_coupon().await.unwrap();
        let snapshot = checkout.settled().await.unwrap();
        assert_eq!(backend.totals_calls.load(Ordering::SeqCst), 3);
        assert_eq!(snapshot.coupon, None);
        assert_eq!(snapshot.totals.totals.total, Money::new(dec!(79.00)));

        tokio::time::sleep(Duration::from_secs(10)).await;
        let snapshot = checkout.snapshot();
        assert_eq!(snapshot.totals.totals.discount, Money::ZERO);
        assert_eq!(snapshot.totals.totals.total, Money::new(dec!(79.00)));
        assert_eq!(snapshot.gate, CheckoutGate::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_session_resets_draft() {
        let session = Session::new(Some(SecretString::from("token".to_string())));
        let (_, checkout) = start(FakeBackend::default(), session.clone());
        checkout.set_cart(cart()).await.unwrap();
        checkout.set_address(jane("12180")).await.unwrap();
        let snapshot = checkout.settled().await.unwrap();
        assert!(snapshot.signed_in);

        session.expire();
        let snapshot = checkout.settled().await.unwrap();
        assert!(!snapshot.signed_in);
        assert_eq!(snapshot.address, None);
        assert_eq!(
            snapshot.gate.checklist(),
            &[
                ChecklistItem::CompleteShippingInformation { signed_in: false },
                ChecklistItem::SelectShippingOption,
            ]
        );
        assert_eq!(snapshot.totals.totals.subtotal, Money::new(dec!(50)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_closes_handle() {
        let (_, checkout) = start(FakeBackend::default(), Session::anonymous());
        checkout.shutdown().await.unwrap();
        tokio::task::yield_now().await;
        assert!(matches!(
            checkout.set_cart(cart()).await,
            Err(CheckoutError::RuntimeClosed)
        ));
    }
}
