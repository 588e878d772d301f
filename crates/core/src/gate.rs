//! Checkout gate.
//!
//! Proceeding to payment is allowed only in [`CheckoutGate::Ready`]. When
//! the draft is [`CheckoutGate::Incomplete`] the gate lists exactly what is
//! missing so the shopper sees a checklist rather than a generic error.

use core::fmt;

/// Something the shopper still has to do before proceeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecklistItem {
    /// The address is missing required fields. Signed-in shoppers are also
    /// offered their address book.
    CompleteShippingInformation { signed_in: bool },
    SelectShippingOption,
}

impl ChecklistItem {
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::CompleteShippingInformation { signed_in: true } => {
                "Select a saved address or complete your shipping information"
            }
            Self::CompleteShippingInformation { signed_in: false } => {
                "Complete your shipping information"
            }
            Self::SelectShippingOption => "Select a shipping option",
        }
    }
}

impl fmt::Display for ChecklistItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// What the gate looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GateInputs {
    pub address_complete: bool,
    pub option_selected: bool,
    /// A shipping requote or totals calculation for the current inputs has
    /// not resolved yet.
    pub recalculating: bool,
    pub signed_in: bool,
}

/// Whether the shopper may proceed to payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutGate {
    Incomplete { checklist: Vec<ChecklistItem> },
    Calculating,
    Ready,
}

impl CheckoutGate {
    #[must_use]
    pub fn evaluate(inputs: GateInputs) -> Self {
        let mut checklist = Vec::new();
        if !inputs.address_complete {
            checklist.push(ChecklistItem::CompleteShippingInformation {
                signed_in: inputs.signed_in,
            });
        }
        if !inputs.option_selected {
            checklist.push(ChecklistItem::SelectShippingOption);
        }

        if !checklist.is_empty() {
            Self::Incomplete { checklist }
        } else if inputs.recalculating {
            Self::Calculating
        } else {
            Self::Ready
        }
    }

    #[must_use]
    pub const fn can_proceed(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Missing items, empty unless incomplete.
    #[must_use]
    pub fn checklist(&self) -> &[ChecklistItem] {
        match self {
            Self::Incomplete { checklist } => checklist,
            Self::Calculating | Self::Ready => &[],
        }
    }
}

impl fmt::Display for CheckoutGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incomplete { .. } => f.write_str("incomplete"),
            Self::Calculating => f.write_str("calculating"),
            Self::Ready => f.write_str("ready"),
        }
    }
}
