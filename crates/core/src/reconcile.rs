//! Total arithmetic and totals-source precedence.
//!
//! Up to three sources can supply shipping, tax and discount for the
//! displayed totals. They are tried in the fixed order of [`PRECEDENCE`];
//! the first usable one supplies all four values. Values from different
//! sources are never mixed.

use crate::sequence::Revision;
use crate::types::{AppliedCoupon, Money, OrderTotals, ShippingOption, TotalsCandidate, TotalsValues};

/// `subtotal + shipping + tax - discount`, rounded to cents once and
/// clamped at zero.
#[must_use]
pub fn compute_total(subtotal: Money, shipping: Money, tax: Money, discount: Money) -> Money {
    (subtotal + shipping + tax - discount)
        .round_to_cents()
        .clamp_non_negative()
}

/// Where the displayed totals came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Embedded totals from the latest coupon apply response.
    CouponResponse,
    /// The dedicated totals calculation.
    TotalsEndpoint,
    /// Live subtotal and the selected option's cost, with no tax or discount.
    SelectedOption,
}

impl SourceKind {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::CouponResponse => "coupon response",
            Self::TotalsEndpoint => "totals endpoint",
            Self::SelectedOption => "selected shipping option",
        }
    }
}

/// Sources in the order they are tried.
pub const PRECEDENCE: [SourceKind; 3] = [
    SourceKind::CouponResponse,
    SourceKind::TotalsEndpoint,
    SourceKind::SelectedOption,
];

/// Everything the reconciler looks at.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileInputs<'a> {
    /// Live cart subtotal.
    pub subtotal: Money,
    pub selected_option: Option<&'a ShippingOption>,
    pub coupon: Option<&'a AppliedCoupon>,
    /// Latest accepted totals-endpoint response.
    pub totals_candidate: Option<&'a TotalsCandidate>,
    /// Totals embedded in the latest accepted coupon apply response.
    pub coupon_candidate: Option<&'a TotalsCandidate>,
    /// Current revision of address, cart and shipping selection.
    pub revision: Revision,
}

/// Displayed totals and where they came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciled {
    pub totals: OrderTotals,
    pub source: SourceKind,
    /// The chosen candidate was computed for older inputs.
    pub stale: bool,
}

/// Pick the totals to display.
#[must_use]
pub fn reconcile(inputs: &ReconcileInputs<'_>) -> Reconciled {
    PRECEDENCE
        .iter()
        .find_map(|source| try_source(*source, inputs))
        .unwrap_or_else(|| from_selected_option(inputs))
}

fn try_source(source: SourceKind, inputs: &ReconcileInputs<'_>) -> Option<Reconciled> {
    match source {
        SourceKind::CouponResponse => {
            inputs.coupon?;
            let candidate = inputs.coupon_candidate?;
            let newer = inputs
                .totals_candidate
                .is_none_or(|totals| candidate.received > totals.received);
            newer.then(|| from_candidate(source, candidate, inputs.revision))
        }
        SourceKind::TotalsEndpoint => inputs
            .totals_candidate
            .map(|candidate| from_candidate(source, candidate, inputs.revision)),
        SourceKind::SelectedOption => Some(from_selected_option(inputs)),
    }
}

fn from_candidate(source: SourceKind, candidate: &TotalsCandidate, revision: Revision) -> Reconciled {
    Reconciled {
        totals: OrderTotals::from(candidate.values),
        source,
        stale: candidate.basis != revision,
    }
}

fn from_selected_option(inputs: &ReconcileInputs<'_>) -> Reconciled {
    let values = TotalsValues {
        subtotal: inputs.subtotal,
        shipping: inputs.selected_option.map_or(Money::ZERO, |option| option.cost),
        tax: Money::ZERO,
        discount: Money::ZERO,
    };
    Reconciled {
        totals: OrderTotals::from(values),
        source: SourceKind::SelectedOption,
        stale: false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal::{Decimal, RoundingStrategy};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::sequence::Stamp;
    use crate::types::{CouponCode, ShippingOptionId, TotalsSource};

    fn money(amount: Decimal) -> Money {
        Money::new(amount)
    }

    fn standard_option() -> ShippingOption {
        ShippingOption {
            id: ShippingOptionId::new(1),
            title: "Standard".to_owned(),
            method_type: "flat_rate".to_owned(),
            cost: money(dec!(10)),
            estimated_days: "3-5".to_owned(),
            is_taxable: true,
            is_enabled: true,
        }
    }

    fn candidate(
        source: TotalsSource,
        values: [Decimal; 4],
        basis: u64,
        received: u64,
    ) -> TotalsCandidate {
        let [subtotal, shipping, tax, discount] = values;
        TotalsCandidate {
            source,
            values: TotalsValues {
                subtotal: money(subtotal),
                shipping: money(shipping),
                tax: money(tax),
                discount: money(discount),
            },
            basis: Revision::new(basis),
            received: Stamp::new(received),
            coupon_code: None,
        }
    }

    fn save10() -> AppliedCoupon {
        AppliedCoupon {
            code: CouponCode::parse("SAVE10").unwrap(),
            description: "Save on your order".to_owned(),
            discount: money(dec!(5)),
        }
    }

    #[test]
    fn test_compute_total_exact() {
        let total = compute_total(money(dec!(50)), money(dec!(10)), money(dec!(4)), Money::ZERO);
        assert_eq!(total, money(dec!(64.00)));
        assert_eq!(total.to_string(), "$64.00");
    }

    #[test]
    fn test_compute_total_rounds_once_at_the_end() {
        // Rounding each input first would give 0.01 + 0.01 + 0.00 = 0.02.
        let total = compute_total(
            money(dec!(0.005)),
            money(dec!(0.005)),
            money(dec!(0.004)),
            Money::ZERO,
        );
        assert_eq!(total, money(dec!(0.01)));
    }

    #[test]
    fn test_compute_total_clamps_at_zero() {
        let total = compute_total(money(dec!(5)), Money::ZERO, Money::ZERO, money(dec!(10)));
        assert_eq!(total, Money::ZERO);
    }

    #[test]
    fn test_compute_total_property_over_grid() {
        let amounts = [dec!(0), dec!(0.01), dec!(4.99), dec!(10), dec!(123.45)];
        for subtotal in amounts {
            for shipping in amounts {
                for tax in amounts {
                    let max = subtotal + shipping + tax;
                    for discount in [dec!(0), max / dec!(2), max] {
                        let expected = (subtotal + shipping + tax - discount)
                            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
                        let total = compute_total(
                            money(subtotal),
                            money(shipping),
                            money(tax),
                            money(discount),
                        );
                        assert_eq!(total.amount(), expected);
                    }
                }
            }
        }
    }

    #[test]
    fn test_falls_back_to_selected_option() {
        let option = standard_option();
        let reconciled = reconcile(&ReconcileInputs {
            subtotal: money(dec!(50)),
            selected_option: Some(&option),
            coupon: None,
            totals_candidate: None,
            coupon_candidate: None,
            revision: Revision::new(1),
        });
        assert_eq!(reconciled.source, SourceKind::SelectedOption);
        assert_eq!(reconciled.totals.total, money(dec!(60)));
        assert!(!reconciled.stale);
    }

    #[test]
    fn test_no_option_no_candidates_is_subtotal_only() {
        let reconciled = reconcile(&ReconcileInputs {
            subtotal: money(dec!(50)),
            selected_option: None,
            coupon: None,
            totals_candidate: None,
            coupon_candidate: None,
            revision: Revision::ZERO,
        });
        assert_eq!(reconciled.totals.shipping, Money::ZERO);
        assert_eq!(reconciled.totals.total, money(dec!(50)));
    }

    #[test]
    fn test_totals_endpoint_scenario() {
        let option = standard_option();
        let totals = candidate(TotalsSource::TotalsEndpoint, [dec!(50), dec!(10), dec!(4), dec!(0)], 3, 1);
        let reconciled = reconcile(&ReconcileInputs {
            subtotal: money(dec!(50)),
            selected_option: Some(&option),
            coupon: None,
            totals_candidate: Some(&totals),
            coupon_candidate: None,
            revision: Revision::new(3),
        });
        assert_eq!(reconciled.source, SourceKind::TotalsEndpoint);
        assert_eq!(reconciled.totals.total, money(dec!(64.00)));
        assert!(!reconciled.stale);
    }

    #[test]
    fn test_newer_coupon_response_wins() {
        let option = standard_option();
        let coupon = save10();
        let totals = candidate(TotalsSource::TotalsEndpoint, [dec!(50), dec!(10), dec!(4), dec!(0)], 3, 1);
        let from_coupon =
            candidate(TotalsSource::CouponResponse, [dec!(50), dec!(10), dec!(4), dec!(5)], 3, 2);
        let reconciled = reconcile(&ReconcileInputs {
            subtotal: money(dec!(50)),
            selected_option: Some(&option),
            coupon: Some(&coupon),
            totals_candidate: Some(&totals),
            coupon_candidate: Some(&from_coupon),
            revision: Revision::new(3),
        });
        assert_eq!(reconciled.source, SourceKind::CouponResponse);
        assert_eq!(reconciled.totals.discount, money(dec!(5)));
        assert_eq!(reconciled.totals.total, money(dec!(59.00)));
    }

    #[test]
    fn test_older_coupon_response_loses_to_newer_totals() {
        let option = standard_option();
        let coupon = save10();
        let from_coupon =
            candidate(TotalsSource::CouponResponse, [dec!(50), dec!(10), dec!(4), dec!(5)], 3, 1);
        let totals = candidate(TotalsSource::TotalsEndpoint, [dec!(50), dec!(15), dec!(4.4), dec!(5)], 4, 2);
        let reconciled = reconcile(&ReconcileInputs {
            subtotal: money(dec!(50)),
            selected_option: Some(&option),
            coupon: Some(&coupon),
            totals_candidate: Some(&totals),
            coupon_candidate: Some(&from_coupon),
            revision: Revision::new(4),
        });
        assert_eq!(reconciled.source, SourceKind::TotalsEndpoint);
        // Values come wholesale from the winner, never mixed.
        assert_eq!(
            reconciled.totals,
            OrderTotals {
                subtotal: money(dec!(50)),
                shipping: money(dec!(15)),
                tax: money(dec!(4.4)),
                discount: money(dec!(5)),
                total: money(dec!(64.40)),
            }
        );
    }

    #[test]
    fn test_coupon_candidate_ignored_without_applied_coupon() {
        let from_coupon =
            candidate(TotalsSource::CouponResponse, [dec!(50), dec!(10), dec!(4), dec!(5)], 1, 5);
        let reconciled = reconcile(&ReconcileInputs {
            subtotal: money(dec!(50)),
            selected_option: None,
            coupon: None,
            totals_candidate: None,
            coupon_candidate: Some(&from_coupon),
            revision: Revision::new(1),
        });
        assert_eq!(reconciled.source, SourceKind::SelectedOption);
    }

    #[test]
    fn test_candidate_for_older_revision_is_stale() {
        let totals = candidate(TotalsSource::TotalsEndpoint, [dec!(50), dec!(10), dec!(4), dec!(0)], 2, 1);
        let reconciled = reconcile(&ReconcileInputs {
            subtotal: money(dec!(50)),
            selected_option: None,
            coupon: None,
            totals_candidate: Some(&totals),
            coupon_candidate: None,
            revision: Revision::new(3),
        });
        assert_eq!(reconciled.source, SourceKind::TotalsEndpoint);
        assert!(reconciled.stale);
        assert_eq!(reconciled.totals.total, money(dec!(64)));
    }
}
