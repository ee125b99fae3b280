//! Instrumentation Detail Mask
//!
//! Bitmask selecting which driver operation kinds get spans. Built once at
//! setup, copied freely, never mutated - the bridge constructors test it a
//! single time so disabled kinds carry no per-call cost.

use std::ops::{BitOr, BitOrAssign};

/// Bitset of instrumented operation kinds
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Details(u32);

impl Details {
    /// Nothing instrumented
    pub const NONE: Details = Details(0);
    /// Retry-loop events
    pub const RETRY: Details = Details(1 << 0);
    /// Scripting events (execute, stream execute, explain, close)
    pub const SCRIPTING: Details = Details(1 << 1);
    /// Every known kind
    pub const ALL: Details = Details(Self::RETRY.0 | Self::SCRIPTING.0);

    /// Membership test - true if any bit of `kind` is enabled
    #[inline]
    pub const fn contains(self, kind: Details) -> bool {
        self.0 & kind.0 != 0
    }

    /// Parse a comma-separated kind list ("retry,scripting", "all", "none").
    /// Unknown names are ignored so a stale env var cannot break startup.
    pub fn parse(names: &str) -> Details {
        let mut mask = Details::NONE;
        for name in names.split(',') {
            match name.trim().to_ascii_lowercase().as_str() {
                "retry" => mask |= Details::RETRY,
                "scripting" => mask |= Details::SCRIPTING,
                "all" => mask |= Details::ALL,
                _ => {}
            }
        }
        mask
    }
}

impl BitOr for Details {
    type Output = Details;

    #[inline]
    fn bitor(self, rhs: Details) -> Details {
        Details(self.0 | rhs.0)
    }
}

impl BitOrAssign for Details {
    #[inline]
    fn bitor_assign(&mut self, rhs: Details) {
        self.0 |= rhs.0;
    }
}
