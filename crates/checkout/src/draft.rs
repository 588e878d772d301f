//! The current order draft.
//!
//! [`OrderDraft`] is the only place checkout state changes. Shopper intents
//! and backend completions arrive as [`Event`]s; handling one mutates the
//! draft and returns the [`Effect`]s to run next. The draft performs no I/O,
//! so every ordering rule can be tested synchronously.
//!
//! # Ordering
//!
//! - Every request is tagged with a [`Seq`] from its own [`Sequencer`]; a
//!   completion is applied only if its tag is still the latest one issued.
//! - Address, cart and shipping selection changes bump the draft
//!   [`Revision`]. Totals candidates record the revision they were computed
//!   for, so a result for older inputs is reported as stale.
//! - Shipping fetches wait for the debounce window to pass without another
//!   edit before they are issued.

use std::time::Duration;

use segishop_core::{
    Address, AddressField, AddressId, AddressSelection, AppliedCoupon, Cart, CheckoutGate,
    ChecklistItem, CouponCode, CouponRejection, FieldError, FreeShippingProgress, GateInputs,
    OrderTotals, ReconcileInputs, Reconciled, Revision, SavedAddress, Seq, Sequencer,
    ShippingOption, ShippingOptionId, Stamp, TotalsCandidate, TotalsSource, TotalsValues,
    field_errors, is_address_complete, missing_fields, reconcile,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::api::types::{
    CartItemPayload, CouponApplication, CouponRequest, OrderTotalsRequest,
    ShippingCalculationRequest,
};
use crate::config::RuntimeSettings;
use crate::error::{Failure, Notice, NoticeScope, RetryAction};
use crate::session::SessionState;

/// Shown when a complete address has no shipping options.
pub const NO_SHIPPING_OPTIONS: &str = "No shipping options available for this address";

/// Shown when a coupon needs a signed-in shopper.
pub const COUPON_LOGIN_REQUIRED: &str = "Please log in to apply coupons";

// =============================================================================
// Events and effects
// =============================================================================

/// Something that happened: a shopper intent or a backend completion.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SelectSavedAddress(SavedAddress),
    EditAddressField { field: AddressField, value: String },
    SetAddress(Address),
    ClearAddress,
    SetCart(Cart),
    SelectShippingOption(ShippingOptionId),
    ApplyCoupon(String),
    RemoveCoupon,
    Retry(RetryAction),
    DismissNotices(NoticeScope),
    SessionChanged(SessionState),

    /// The debounce timer tagged `seq` fired.
    ShippingDebounceElapsed(Seq),
    ShippingQuoted {
        seq: Seq,
        result: Result<Vec<ShippingOption>, Failure>,
    },
    TotalsCalculated {
        seq: Seq,
        basis: Revision,
        coupon_code: Option<CouponCode>,
        result: Result<TotalsValues, Failure>,
    },
    CouponApplied {
        seq: Seq,
        basis: Revision,
        code: CouponCode,
        result: Result<CouponApplication, Failure>,
    },
    CouponRemoved {
        seq: Seq,
        result: Result<TotalsValues, Failure>,
    },
}

/// Work the runtime must do on the draft's behalf. Each effect reports back
/// with the matching completion event.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Post [`Event::ShippingDebounceElapsed`] after `delay`.
    ScheduleShippingFetch { seq: Seq, delay: Duration },
    FetchShipping {
        seq: Seq,
        request: ShippingCalculationRequest,
    },
    CalculateTotals {
        seq: Seq,
        basis: Revision,
        request: OrderTotalsRequest,
    },
    ApplyCoupon {
        seq: Seq,
        basis: Revision,
        request: CouponRequest,
    },
    RemoveCoupon { seq: Seq, request: CouponRequest },
}

// =============================================================================
// Snapshot and proceed
// =============================================================================

/// Where the shipping option list stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShippingStatus {
    /// No complete address yet.
    #[default]
    Idle,
    /// Waiting for the debounce window or the backend.
    Pending,
    Loaded,
    /// The backend answered with no options.
    Unavailable,
    Failed,
}

/// Everything a front end needs to render checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSnapshot {
    pub address: Option<Address>,
    pub saved_address_id: Option<AddressId>,
    pub address_complete: bool,
    pub missing_fields: Vec<AddressField>,
    /// Inline, advisory field messages.
    pub field_errors: Vec<FieldError>,
    pub shipping_status: ShippingStatus,
    pub shipping_options: Vec<ShippingOption>,
    pub selected_option: Option<ShippingOption>,
    pub coupon: Option<AppliedCoupon>,
    /// The backend's confirmation for the last successful apply.
    pub coupon_message: Option<String>,
    pub coupon_rejection: Option<CouponRejection>,
    pub coupon_input_error: Option<String>,
    pub coupon_pending: bool,
    /// Inputs changed since the backend last priced the coupon.
    pub discount_stale: bool,
    pub totals: Reconciled,
    pub gate: CheckoutGate,
    pub notices: Vec<Notice>,
    pub free_shipping: FreeShippingProgress,
    pub signed_in: bool,
    pub revision: Revision,
    /// No timer or request is outstanding.
    pub settled: bool,
}

/// What proceeding to payment hands over. Only issued when the gate is
/// ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProceedTicket {
    pub address: Address,
    pub saved_address_id: Option<AddressId>,
    pub option: ShippingOption,
    pub coupon: Option<AppliedCoupon>,
    pub totals: OrderTotals,
    pub cart: Cart,
}

/// Why proceeding was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProceedBlocked {
    #[error("Checkout is incomplete: {}", checklist_text(.0))]
    Incomplete(Vec<ChecklistItem>),

    #[error("Totals are still being calculated")]
    Calculating,
}

fn checklist_text(items: &[ChecklistItem]) -> String {
    items
        .iter()
        .map(ChecklistItem::message)
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Draft
// =============================================================================

#[derive(Debug, Default)]
struct ShippingState {
    options: Vec<ShippingOption>,
    selected: Option<ShippingOptionId>,
    status: ShippingStatus,
    debounce: Sequencer,
    fetches: Sequencer,
    awaiting_debounce: Option<Seq>,
    in_flight: Option<Seq>,
}

impl ShippingState {
    fn selected_option(&self) -> Option<&ShippingOption> {
        let id = self.selected?;
        self.options.iter().find(|option| option.id == id)
    }

    fn is_pending(&self) -> bool {
        self.awaiting_debounce.is_some() || self.in_flight.is_some()
    }
}

#[derive(Debug, Default)]
struct TotalsState {
    requests: Sequencer,
    in_flight: Option<Seq>,
    candidate: Option<TotalsCandidate>,
}

#[derive(Debug, Default)]
struct CouponState {
    applied: Option<AppliedCoupon>,
    candidate: Option<TotalsCandidate>,
    message: Option<String>,
    rejection: Option<CouponRejection>,
    input_error: Option<String>,
    discount_stale: bool,
    /// Apply and remove share one sequence.
    requests: Sequencer,
    in_flight: Option<Seq>,
    /// Request that was in flight when the draft was reset. Only an
    /// authorization failure from it is still reported.
    interrupted: Option<Seq>,
}

/// The single writer for checkout state.
#[derive(Debug)]
pub struct OrderDraft {
    settings: RuntimeSettings,
    signed_in: bool,
    selection: Option<AddressSelection>,
    cart: Cart,
    shipping: ShippingState,
    totals: TotalsState,
    coupon: CouponState,
    revision: Revision,
    clock: Stamp,
    notices: Vec<Notice>,
}

impl OrderDraft {
    #[must_use]
    pub fn new(settings: RuntimeSettings, signed_in: bool) -> Self {
        Self {
            settings,
            signed_in,
            selection: None,
            cart: Cart::default(),
            shipping: ShippingState::default(),
            totals: TotalsState::default(),
            coupon: CouponState::default(),
            revision: Revision::ZERO,
            clock: Stamp::ZERO,
            notices: Vec::new(),
        }
    }

    /// Apply one event and return the work it starts.
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::SelectSavedAddress(saved) => {
                self.change_address(Some(AddressSelection::from(&saved)))
            }
            Event::EditAddressField { field, value } => {
                let current = self.address().cloned().unwrap_or_default();
                let next = current.with_field(field, &value);
                if next == current && self.selection.is_some() {
                    return Vec::new();
                }
                self.change_address(Some(AddressSelection::Manual(next)))
            }
            Event::SetAddress(address) => self.change_address(Some(AddressSelection::Manual(address))),
            Event::ClearAddress => self.change_address(None),
            Event::SetCart(cart) => self.change_cart(cart),
            Event::SelectShippingOption(id) => self.select_option(id),
            Event::ApplyCoupon(raw) => self.apply_coupon(&raw),
            Event::RemoveCoupon => self.remove_coupon(),
            Event::Retry(action) => self.retry(action),
            Event::DismissNotices(scope) => {
                self.notices.retain(|notice| notice.scope != scope);
                Vec::new()
            }
            Event::SessionChanged(state) => self.session_changed(state),
            Event::ShippingDebounceElapsed(seq) => self.debounce_elapsed(seq),
            Event::ShippingQuoted { seq, result } => self.shipping_quoted(seq, result),
            Event::TotalsCalculated {
                seq,
                basis,
                coupon_code,
                result,
            } => self.totals_calculated(seq, basis, coupon_code, result),
            Event::CouponApplied {
                seq,
                basis,
                code,
                result,
            } => self.coupon_applied(seq, basis, code, result),
            Event::CouponRemoved { seq, result } => self.coupon_removed(seq, result),
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn address(&self) -> Option<&Address> {
        self.selection.as_ref().map(AddressSelection::address)
    }

    #[must_use]
    pub fn is_address_complete(&self) -> bool {
        self.address().is_some_and(is_address_complete)
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub const fn revision(&self) -> Revision {
        self.revision
    }

    /// True when no timer or request is outstanding.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !self.shipping.is_pending() && self.totals.in_flight.is_none() && self.coupon.in_flight.is_none()
    }

    #[must_use]
    pub fn totals(&self) -> Reconciled {
        reconcile(&ReconcileInputs {
            subtotal: self.cart.subtotal(),
            selected_option: self.shipping.selected_option(),
            coupon: self.coupon.applied.as_ref(),
            totals_candidate: self.totals.candidate.as_ref(),
            coupon_candidate: self.coupon.candidate.as_ref(),
            revision: self.revision,
        })
    }

    #[must_use]
    pub fn gate(&self) -> CheckoutGate {
        CheckoutGate::evaluate(GateInputs {
            address_complete: self.is_address_complete(),
            option_selected: self.shipping.selected_option().is_some(),
            recalculating: !self.is_settled(),
            signed_in: self.signed_in,
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> CheckoutSnapshot {
        let address = self.address().cloned();
        let totals = self.totals();
        CheckoutSnapshot {
            saved_address_id: self.selection.as_ref().and_then(AddressSelection::saved_id),
            address_complete: self.is_address_complete(),
            missing_fields: address.as_ref().map_or_else(
                || missing_fields(&Address::default()),
                missing_fields,
            ),
            field_errors: address.as_ref().map(field_errors).unwrap_or_default(),
            address,
            shipping_status: self.shipping.status,
            shipping_options: self.shipping.options.clone(),
            selected_option: self.shipping.selected_option().cloned(),
            coupon: self.coupon.applied.clone(),
            coupon_message: self.coupon.message.clone(),
            coupon_rejection: self.coupon.rejection.clone(),
            coupon_input_error: self.coupon.input_error.clone(),
            coupon_pending: self.coupon.in_flight.is_some(),
            discount_stale: self.coupon.discount_stale,
            free_shipping: FreeShippingProgress::for_subtotal(
                totals.totals.subtotal,
                self.settings.free_shipping_threshold,
            ),
            totals,
            gate: self.gate(),
            notices: self.notices.clone(),
            signed_in: self.signed_in,
            revision: self.revision,
            settled: self.is_settled(),
        }
    }

    /// Hand over the draft for payment.
    ///
    /// # Errors
    ///
    /// Returns the checklist of missing items while incomplete, or
    /// [`ProceedBlocked::Calculating`] while a recalculation is outstanding.
    pub fn proceed(&self) -> Result<ProceedTicket, ProceedBlocked> {
        match self.gate() {
            CheckoutGate::Incomplete { checklist } => Err(ProceedBlocked::Incomplete(checklist)),
            CheckoutGate::Calculating => Err(ProceedBlocked::Calculating),
            CheckoutGate::Ready => {
                let (Some(selection), Some(option)) =
                    (self.selection.as_ref(), self.shipping.selected_option())
                else {
                    return Err(ProceedBlocked::Calculating);
                };
                Ok(ProceedTicket {
                    address: selection.address().clone(),
                    saved_address_id: selection.saved_id(),
                    option: option.clone(),
                    coupon: self.coupon.applied.clone(),
                    totals: self.totals().totals,
                    cart: self.cart.clone(),
                })
            }
        }
    }

    // -------------------------------------------------------------------------
    // Address and cart
    // -------------------------------------------------------------------------

    fn change_address(&mut self, selection: Option<AddressSelection>) -> Vec<Effect> {
        if self.address() == selection.as_ref().map(AddressSelection::address) {
            self.selection = selection;
            return Vec::new();
        }
        self.selection = selection;
        self.revision = self.revision.next();
        self.dismiss(NoticeScope::Address);
        self.dismiss(NoticeScope::Shipping);

        if self.is_address_complete() {
            self.requote()
        } else {
            self.clear_shipping();
            Vec::new()
        }
    }

    fn change_cart(&mut self, cart: Cart) -> Vec<Effect> {
        if self.cart == cart {
            return Vec::new();
        }
        self.cart = cart;
        self.revision = self.revision.next();

        if self.is_address_complete() {
            self.requote()
        } else {
            Vec::new()
        }
    }

    /// Restart the debounce window for a shipping fetch. The displayed
    /// options stay until the new quote resolves.
    fn requote(&mut self) -> Vec<Effect> {
        let seq = self.shipping.debounce.issue();
        self.shipping.awaiting_debounce = Some(seq);
        self.shipping.fetches.invalidate();
        self.shipping.in_flight = None;
        self.shipping.status = ShippingStatus::Pending;
        self.invalidate_totals();
        self.mark_discount_stale();

        vec![Effect::ScheduleShippingFetch {
            seq,
            delay: self.settings.address_debounce,
        }]
    }

    /// Drop options, selection and every outstanding request that depends
    /// on the address.
    fn clear_shipping(&mut self) {
        self.shipping.options.clear();
        self.shipping.selected = None;
        self.shipping.status = ShippingStatus::Idle;
        self.shipping.debounce.invalidate();
        self.shipping.awaiting_debounce = None;
        self.shipping.fetches.invalidate();
        self.shipping.in_flight = None;
        self.invalidate_totals();
        self.totals.candidate = None;
        self.coupon.candidate = None;
        self.mark_discount_stale();
    }

    fn invalidate_totals(&mut self) {
        self.totals.requests.invalidate();
        self.totals.in_flight = None;
    }

    fn mark_discount_stale(&mut self) {
        if self.coupon.applied.is_some() {
            self.coupon.discount_stale = true;
        }
    }

    // -------------------------------------------------------------------------
    // Shipping
    // -------------------------------------------------------------------------

    fn debounce_elapsed(&mut self, seq: Seq) -> Vec<Effect> {
        if self.shipping.awaiting_debounce != Some(seq) {
            debug!(%seq, "Discarding superseded shipping debounce");
            return Vec::new();
        }
        self.shipping.awaiting_debounce = None;
        self.fetch_shipping()
    }

    fn fetch_shipping(&mut self) -> Vec<Effect> {
        let Some(address) = self.address().filter(|a| is_address_complete(a)).cloned() else {
            return Vec::new();
        };
        let seq = self.shipping.fetches.issue();
        self.shipping.in_flight = Some(seq);
        self.shipping.status = ShippingStatus::Pending;

        vec![Effect::FetchShipping {
            seq,
            request: ShippingCalculationRequest {
                items: self.cart.lines.iter().map(CartItemPayload::from).collect(),
                subtotal: self.cart.subtotal(),
                shipping_address: address,
            },
        }]
    }

    fn shipping_quoted(
        &mut self,
        seq: Seq,
        result: Result<Vec<ShippingOption>, Failure>,
    ) -> Vec<Effect> {
        if self.shipping.in_flight != Some(seq) || !self.shipping.fetches.is_latest(seq) {
            debug!(%seq, "Discarding superseded shipping quote");
            return Vec::new();
        }
        self.shipping.in_flight = None;
        self.dismiss(NoticeScope::Shipping);
        let previous = self.shipping.selected_option().cloned();

        match result {
            Ok(options) => {
                self.shipping.options = options;
                let still_offered = self
                    .shipping
                    .selected
                    .is_some_and(|id| self.shipping.options.iter().any(|o| o.id == id));
                if !still_offered {
                    self.shipping.selected = self.shipping.options.first().map(|o| o.id);
                }
                if self.shipping.options.is_empty() {
                    self.shipping.status = ShippingStatus::Unavailable;
                    self.notices
                        .push(Notice::business_rule(NoticeScope::Shipping, NO_SHIPPING_OPTIONS));
                } else {
                    self.shipping.status = ShippingStatus::Loaded;
                }
            }
            Err(failure) => {
                info!(error = %failure, "Shipping quote failed");
                self.shipping.options.clear();
                self.shipping.selected = None;
                self.shipping.status = ShippingStatus::Failed;
                self.notices.push(Notice::from_failure(
                    NoticeScope::Shipping,
                    &failure,
                    RetryAction::RefetchShipping,
                ));
            }
        }

        if self.shipping.selected_option() != previous.as_ref() {
            self.revision = self.revision.next();
        }
        self.calculate_totals()
    }

    fn select_option(&mut self, id: ShippingOptionId) -> Vec<Effect> {
        if self.shipping.selected == Some(id) {
            return Vec::new();
        }
        if !self.shipping.options.iter().any(|option| option.id == id) {
            debug!(option = %id, "Ignoring selection of an option that is not offered");
            return Vec::new();
        }
        self.shipping.selected = Some(id);
        self.revision = self.revision.next();
        self.mark_discount_stale();
        self.calculate_totals()
    }

    // -------------------------------------------------------------------------
    // Totals
    // -------------------------------------------------------------------------

    /// Ask the backend for totals of the current inputs, superseding any
    /// outstanding request. Needs a complete address and a selected option.
    fn calculate_totals(&mut self) -> Vec<Effect> {
        self.invalidate_totals();
        let (Some(address), Some(option)) = (
            self.address().filter(|a| is_address_complete(a)).cloned(),
            self.shipping.selected_option().map(|o| o.id),
        ) else {
            return Vec::new();
        };

        let seq = self.totals.requests.issue();
        self.totals.in_flight = Some(seq);

        vec![Effect::CalculateTotals {
            seq,
            basis: self.revision,
            request: OrderTotalsRequest {
                items: self.cart.lines.iter().map(CartItemPayload::from).collect(),
                subtotal: self.cart.subtotal(),
                shipping_address: address,
                selected_shipping_option_id: Some(option),
                coupon_code: self.coupon.applied.as_ref().map(|c| c.code.clone()),
            },
        }]
    }

    fn totals_calculated(
        &mut self,
        seq: Seq,
        basis: Revision,
        coupon_code: Option<CouponCode>,
        result: Result<TotalsValues, Failure>,
    ) -> Vec<Effect> {
        if self.totals.in_flight != Some(seq) || !self.totals.requests.is_latest(seq) {
            debug!(%seq, "Discarding superseded totals");
            return Vec::new();
        }
        self.totals.in_flight = None;
        self.dismiss(NoticeScope::Totals);

        match result {
            Ok(values) => {
                self.clock = self.clock.next();
                if let Some(applied) = self.coupon.applied.as_mut() {
                    if coupon_code.as_ref() == Some(&applied.code) {
                        applied.discount = values.discount;
                        self.coupon.discount_stale = false;
                    }
                }
                self.totals.candidate = Some(TotalsCandidate {
                    source: TotalsSource::TotalsEndpoint,
                    values,
                    basis,
                    received: self.clock,
                    coupon_code,
                });
            }
            Err(failure) => {
                info!(error = %failure, "Totals calculation failed");
                self.notices.push(Notice::from_failure(
                    NoticeScope::Totals,
                    &failure,
                    RetryAction::RecalculateTotals,
                ));
            }
        }
        Vec::new()
    }

    // -------------------------------------------------------------------------
    // Coupons
    // -------------------------------------------------------------------------

    /// Subtotal, shipping and tax currently displayed, with the applied code.
    fn coupon_request(&self, code: CouponCode) -> CouponRequest {
        let displayed = self.totals().totals;
        CouponRequest {
            code,
            order_subtotal: displayed.subtotal,
            shipping_amount: displayed.shipping,
            tax_amount: displayed.tax,
        }
    }

    fn apply_coupon(&mut self, raw: &str) -> Vec<Effect> {
        self.coupon.rejection = None;
        let code = match CouponCode::parse(raw) {
            Ok(code) => code,
            Err(err) => {
                self.coupon.input_error = Some(err.to_string());
                return Vec::new();
            }
        };
        self.coupon.input_error = None;
        self.dismiss(NoticeScope::Coupon);

        let seq = self.coupon.requests.issue();
        self.coupon.in_flight = Some(seq);
        vec![Effect::ApplyCoupon {
            seq,
            basis: self.revision,
            request: self.coupon_request(code),
        }]
    }

    fn remove_coupon(&mut self) -> Vec<Effect> {
        self.coupon.rejection = None;
        self.coupon.input_error = None;
        let Some(code) = self.coupon.applied.as_ref().map(|c| c.code.clone()) else {
            return Vec::new();
        };
        self.dismiss(NoticeScope::Coupon);

        let seq = self.coupon.requests.issue();
        self.coupon.in_flight = Some(seq);
        vec![Effect::RemoveCoupon {
            seq,
            request: self.coupon_request(code),
        }]
    }

    fn coupon_applied(
        &mut self,
        seq: Seq,
        basis: Revision,
        code: CouponCode,
        result: Result<CouponApplication, Failure>,
    ) -> Vec<Effect> {
        if self.coupon.in_flight != Some(seq) || !self.coupon.requests.is_latest(seq) {
            if self.coupon.interrupted == Some(seq) && result == Err(Failure::Unauthorized) {
                self.coupon.interrupted = None;
                self.coupon.rejection =
                    Some(CouponRejection::LoginRequired(COUPON_LOGIN_REQUIRED.to_string()));
            } else {
                debug!(%seq, %code, "Discarding superseded coupon response");
            }
            return Vec::new();
        }
        self.coupon.in_flight = None;

        match result {
            Ok(application) => {
                self.clock = self.clock.next();
                self.coupon.candidate = Some(TotalsCandidate {
                    source: TotalsSource::CouponResponse,
                    values: application.values,
                    basis,
                    received: self.clock,
                    coupon_code: Some(application.coupon.code.clone()),
                });
                self.coupon.applied = Some(application.coupon);
                self.coupon.message = Some(application.message);
                self.coupon.discount_stale = false;

                // Inputs moved while the apply was in flight; have the
                // backend price the coupon against the current ones.
                if basis != self.revision {
                    self.coupon.discount_stale = true;
                    return self.calculate_totals();
                }
                // An outstanding totals request was priced without this
                // coupon; replace it with one that carries the code.
                if self.totals.in_flight.is_some() {
                    return self.calculate_totals();
                }
                Vec::new()
            }
            Err(Failure::Unauthorized) => {
                self.coupon.rejection =
                    Some(CouponRejection::LoginRequired(COUPON_LOGIN_REQUIRED.to_string()));
                Vec::new()
            }
            Err(Failure::Rejected(message)) => {
                debug!(%code, %message, "Coupon rejected");
                self.coupon.rejection = Some(CouponRejection::classify(message));
                Vec::new()
            }
            Err(failure) => {
                self.notices.push(Notice::from_failure(
                    NoticeScope::Coupon,
                    &failure,
                    RetryAction::ApplyCoupon(code),
                ));
                Vec::new()
            }
        }
    }

    fn coupon_removed(&mut self, seq: Seq, result: Result<TotalsValues, Failure>) -> Vec<Effect> {
        if self.coupon.in_flight != Some(seq) || !self.coupon.requests.is_latest(seq) {
            debug!(%seq, "Discarding superseded coupon removal");
            return Vec::new();
        }
        self.coupon.in_flight = None;

        match result {
            Ok(values) => {
                debug!(total_without_discount = %OrderTotals::from(values).total, "Coupon removed");
                self.coupon.applied = None;
                self.coupon.candidate = None;
                self.coupon.message = None;
                self.coupon.discount_stale = false;

                let priced_in = self
                    .totals
                    .candidate
                    .as_ref()
                    .is_some_and(TotalsCandidate::includes_coupon);
                // An outstanding request still carries the removed code.
                if priced_in || self.totals.in_flight.is_some() {
                    return self.calculate_totals();
                }
                Vec::new()
            }
            Err(failure) => {
                self.notices.push(Notice::from_failure(
                    NoticeScope::Coupon,
                    &failure,
                    RetryAction::RemoveCoupon,
                ));
                Vec::new()
            }
        }
    }

    // -------------------------------------------------------------------------
    // Retry, notices and session
    // -------------------------------------------------------------------------

    fn retry(&mut self, action: RetryAction) -> Vec<Effect> {
        match action {
            RetryAction::RefetchShipping => {
                self.dismiss(NoticeScope::Shipping);
                self.shipping.debounce.invalidate();
                self.shipping.awaiting_debounce = None;
                self.fetch_shipping()
            }
            RetryAction::RecalculateTotals => {
                self.dismiss(NoticeScope::Totals);
                self.calculate_totals()
            }
            RetryAction::ApplyCoupon(code) => self.apply_coupon(code.as_str()),
            RetryAction::RemoveCoupon => self.remove_coupon(),
        }
    }

    fn dismiss(&mut self, scope: NoticeScope) {
        self.notices.retain(|notice| notice.scope != scope);
    }

    fn session_changed(&mut self, state: SessionState) -> Vec<Effect> {
        let signed_in = state == SessionState::Authenticated;
        if self.signed_in && !signed_in {
            info!(?state, "Session ended; resetting checkout");
            self.reset();
        }
        self.signed_in = signed_in;
        Vec::new()
    }

    /// Forget everything but the cart. Sequencers keep counting so that
    /// responses to earlier requests are still recognized as superseded.
    fn reset(&mut self) {
        self.selection = None;
        self.clear_shipping();
        self.coupon.interrupted = self.coupon.in_flight.take();
        self.coupon.requests.invalidate();
        self.coupon.applied = None;
        self.coupon.candidate = None;
        self.coupon.message = None;
        self.coupon.rejection = None;
        self.coupon.input_error = None;
        self.coupon.discount_stale = false;
        self.notices.clear();
        self.revision = self.revision.next();
    }
}
