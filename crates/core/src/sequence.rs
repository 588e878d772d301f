//! Monotonic counters for ordering asynchronous work.
//!
//! Responses can arrive in any order. Each request is tagged with a [`Seq`]
//! when issued and a response is accepted only if its tag is still the
//! latest one issued by its [`Sequencer`]. Inputs that feed a totals
//! calculation are versioned with a [`Revision`], and accepted results are
//! stamped with a [`Stamp`] so two sources can be compared by recency.

use core::fmt;

macro_rules! define_counter {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(u64);

        impl $name {
            pub const ZERO: Self = Self(0);

            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            #[must_use]
            pub const fn get(&self) -> u64 {
                self.0
            }

            /// The following value.
            #[must_use]
            pub const fn next(self) -> Self {
                Self(self.0.saturating_add(1))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_counter!(
    /// Tag attached to an issued request.
    Seq
);
define_counter!(
    /// Version of the inputs a totals calculation depends on.
    Revision
);
define_counter!(
    /// Logical arrival time of an accepted result.
    Stamp
);

/// Issues [`Seq`] tags and recognizes the latest one.
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    last: Seq,
}

impl Sequencer {
    #[must_use]
    pub const fn new() -> Self {
        Self { last: Seq::ZERO }
    }

    /// Issue a new tag, superseding every earlier one.
    pub const fn issue(&mut self) -> Seq {
        self.last = self.last.next();
        self.last
    }

    /// Supersede every outstanding tag without issuing a request.
    pub const fn invalidate(&mut self) {
        self.last = self.last.next();
    }

    /// True if `seq` is the most recently issued tag.
    #[must_use]
    pub fn is_latest(&self, seq: Seq) -> bool {
        seq == self.last
    }

    #[must_use]
    pub const fn last(&self) -> Seq {
        self.last
    }
}
