//! Half-open validity periods and the boundary helpers the reconciliation
//! engine is built on.
//!
//! A bound of `None` is unbounded: an absent `from` reaches into the infinite
//! past and an absent `to` means the period is still open. Every comparison
//! helper here treats those two cases differently, so keep them separate when
//! reading the engine.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TemporalError;

/// Instant used for period bounds. Naive, always interpreted as UTC.
pub type Timestamp = NaiveDateTime;

/// A validity period `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    /// Inclusive start, `None` for the unbounded past.
    pub from: Option<Timestamp>,
    /// Exclusive end, `None` while the period is open.
    pub to: Option<Timestamp>,
}

impl Interval {
    /// Build an interval without checking that it is well formed.
    ///
    /// Empty or inverted intervals are rejected by the store when the record
    /// is flushed; use [`Interval::checked`] to reject them up front.
    #[must_use]
    pub const fn new(from: Option<Timestamp>, to: Option<Timestamp>) -> Self {
        Self { from, to }
    }

    /// Build an interval, rejecting `from >= to`.
    ///
    /// # Errors
    ///
    /// Returns [`TemporalError::InvalidInterval`] when both bounds are set and
    /// the period would be empty or inverted.
    pub fn checked(from: Option<Timestamp>, to: Option<Timestamp>) -> Result<Self, TemporalError> {
        let interval = Self::new(from, to);
        if interval.is_empty() {
            return Err(TemporalError::InvalidInterval {
                table: None,
                detail: format!("empty period {interval}"),
            });
        }
        Ok(interval)
    }

    /// The period covering all time.
    #[must_use]
    pub const fn always() -> Self {
        Self::new(None, None)
    }

    /// `[from, ∞)`.
    #[must_use]
    pub const fn starting(from: Timestamp) -> Self {
        Self::new(Some(from), None)
    }

    /// `(-∞, to)`.
    #[must_use]
    pub const fn until(to: Timestamp) -> Self {
        Self::new(None, Some(to))
    }

    /// `true` when both bounds are set and `from >= to`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!((self.from, self.to), (Some(from), Some(to)) if from >= to)
    }

    /// `true` if `ts` falls inside the period.
    #[must_use]
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.from.is_none_or(|from| from <= ts) && self.to.is_none_or(|to| ts < to)
    }

    /// `true` if the two periods share at least one instant.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let self_reaches = match (self.to, other.from) {
            (Some(to), Some(from)) => to > from,
            _ => true,
        };
        let other_reaches = match (other.to, self.from) {
            (Some(to), Some(from)) => to > from,
            _ => true,
        };
        self_reaches && other_reaches
    }

    /// `true` if `other` starts exactly where this period ends, or the
    /// reverse. Unbounded ends never touch anything.
    #[must_use]
    pub fn adjoins(&self, other: &Self) -> bool {
        matches!((self.to, other.from), (Some(to), Some(from)) if to == from)
            || matches!((other.to, self.from), (Some(to), Some(from)) if to == from)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&period_str(self.from, self.to))
    }
}

// ---------------------------------------------------------------------------
// Boundary helpers
// ---------------------------------------------------------------------------

/// `true` if a period starting at `s_from` begins before one starting at
/// `o_from`. An unbounded start is before everything, including another
/// unbounded start.
#[must_use]
pub fn starts_before(s_from: Option<Timestamp>, o_from: Option<Timestamp>) -> bool {
    match (s_from, o_from) {
        (None, _) => true,
        (Some(s), Some(o)) => s < o,
        (Some(_), None) => false,
    }
}

/// `true` if a period ending at `s_to` reaches at least as far as one ending
/// at `o_to`.
#[must_use]
pub fn ends_at_or_after(s_to: Option<Timestamp>, o_to: Option<Timestamp>) -> bool {
    match (s_to, o_to) {
        (None, _) => true,
        (Some(s), Some(o)) => s >= o,
        (Some(_), None) => false,
    }
}

/// `true` if a period ending at `s_to` reaches strictly past a bounded `o_to`.
#[must_use]
pub fn ends_after(s_to: Option<Timestamp>, o_to: Option<Timestamp>) -> bool {
    match (s_to, o_to) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(s), Some(o)) => s > o,
    }
}

/// Earlier of two bounds; unbounded if either is.
#[must_use]
pub fn earliest(x: Option<Timestamp>, y: Option<Timestamp>) -> Option<Timestamp> {
    Some(x?.min(y?))
}

/// Later of two bounds; unbounded if either is.
#[must_use]
pub fn latest(x: Option<Timestamp>, y: Option<Timestamp>) -> Option<Timestamp> {
    Some(x?.max(y?))
}

/// Human-readable rendering of a period, as used in decision messages.
#[must_use]
pub fn period_str(from: Option<Timestamp>, to: Option<Timestamp>) -> String {
    match (from, to) {
        (None, None) => "always".to_string(),
        (None, Some(to)) => format!("until {to}"),
        (Some(from), None) => format!("{from} onwards"),
        (Some(from), Some(to)) => format!("{from} to {to}"),
    }
}

/// Microseconds since the Unix epoch, the storage representation of a bound.
#[must_use]
pub fn to_micros(ts: Timestamp) -> i64 {
    ts.and_utc().timestamp_micros()
}

/// Inverse of [`to_micros`]. `None` if the value is out of chrono's range.
#[must_use]
pub fn from_micros(us: i64) -> Option<Timestamp> {
    DateTime::from_timestamp_micros(us).map(|dt| dt.naive_utc())
}
