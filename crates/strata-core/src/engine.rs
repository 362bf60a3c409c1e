//! `set_for_period`: make a key's timeline carry a value over a period.
//!
//! The engine reads the records overlapping the candidate once, ordered by
//! start, and decides for each one whether it is deleted, shrunk, absorbed or
//! left alone, and whether the candidate itself still needs inserting. All
//! writes go through the [`TemporalStore`]; the surrounding transaction is
//! the caller's.
//!
//! # Positional cases
//!
//! For each existing record `E` (bounds `ef`/`et`) against the candidate
//! `[F, T)`:
//!
//! 1. With `coalesce`, a same-valued `E` starting elsewhere is merged into the
//!    candidate, or, if it already covers it, makes the call a no-op.
//! 2. An open-ended candidate is pinned at the first record it would
//!    otherwise run into, and the walk stops there.
//! 3. Otherwise `E` starting at `F` is replaced, `E` starting inside the
//!    candidate is deleted or has its head cut off at `T`, and `E` starting
//!    before `F` is cut back to end at `F`.
//!
//! Position tests use the requested start `F` and a strict "starts before",
//! so two unbounded starts are equal rather than ordered.

use serde::{Deserialize, Serialize};

use crate::decision::{DecisionEvent, DecisionKind, DecisionLog, LogLevels};
use crate::error::TemporalError;
use crate::interval::{
    Interval, Timestamp, earliest, ends_after, ends_at_or_after, latest, period_str, starts_before,
};
use crate::record::{TemporalRecord, Value};
use crate::schema::EntitySchema;
use crate::store::TemporalStore;

/// Knobs for one [`set_for_period`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOptions {
    /// Merge same-valued records that end up touching or overlapping.
    pub coalesce: bool,
    pub levels: LogLevels,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            coalesce: true,
            levels: LogLevels::default(),
        }
    }
}

impl SetOptions {
    #[must_use]
    pub fn without_coalesce() -> Self {
        Self {
            coalesce: false,
            ..Self::default()
        }
    }
}

/// Outcome of a [`set_for_period`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Decisions in the order they were taken.
    pub events: Vec<DecisionEvent>,
    /// Period of the inserted record, `None` when an existing record already
    /// carried the value.
    pub inserted: Option<Interval>,
}

impl Reconciliation {
    /// `true` if every decision was a no-op.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.inserted.is_none()
            && self
                .events
                .iter()
                .all(|e| e.kind == DecisionKind::Unchanged)
    }
}

/// Strictly starts before: an unbounded start is not before another one.
fn strictly_before(s_from: Option<Timestamp>, o_from: Option<Timestamp>) -> bool {
    s_from != o_from && starts_before(s_from, o_from)
}

/// Per-call state shared by the decision branches.
struct Walk<'s, S: TemporalStore + ?Sized> {
    store: &'s mut S,
    schema: &'s EntitySchema,
    log: DecisionLog,
    /// Period the candidate will be inserted with.
    period: Interval,
    create: bool,
    /// Existing record currently carrying the candidate's value in its place.
    stand_in: Option<TemporalRecord>,
}

impl<S: TemporalStore + ?Sized> Walk<'_, S> {
    fn log_set(&mut self, from: Option<Timestamp>, to: Option<Timestamp>) {
        self.log.set(&period_str(from, to));
    }

    fn log_changed(&mut self, from: Option<Timestamp>, to: Option<Timestamp>, old: &[Value]) {
        let old = self.schema.pretty_value(old);
        self.log.changed_value(&period_str(from, to), &old);
    }

    fn log_unchanged(&mut self, from: Option<Timestamp>, to: Option<Timestamp>) {
        self.log.unchanged(&period_str(from, to));
    }

    fn keep(&mut self, existing: &TemporalRecord) {
        self.create = false;
        self.stand_in = Some(existing.clone());
    }

    /// Fold the record standing in for the candidate back into it, so a
    /// later merge replaces both with one wider record.
    fn absorb_stand_in(&mut self) -> Result<(), TemporalError> {
        if let Some(stand_in) = self.stand_in.take() {
            self.store.delete(&stand_in)?;
            self.period.from = earliest(self.period.from, stand_in.interval.from);
            self.period.to = latest(self.period.to, stand_in.interval.to);
            self.create = true;
        }
        Ok(())
    }

    fn shrink(&mut self, existing: &TemporalRecord, period: Interval) -> Result<(), TemporalError> {
        if period.is_empty() {
            return Err(TemporalError::Invariant(format!(
                "shrinking record {} to empty period {period}",
                existing.id.map_or_else(|| "?".to_string(), |id| id.to_string()),
            )));
        }
        self.store.update_interval(existing, period)
    }
}

/// Make the store's timeline for `candidate.key` carry `candidate.value`
/// over `candidate.interval`.
///
/// Pending writes are flushed before returning and the decision events are
/// emitted through `tracing` only after that flush succeeded.
///
/// # Errors
///
/// - [`TemporalError::Unkeyed`] / [`TemporalError::SchemaMismatch`] for a
///   candidate the store's schema cannot hold
/// - [`TemporalError::OverlapViolation`], [`TemporalError::InvalidInterval`]
///   or [`TemporalError::ConcurrencyConflict`] from the store's constraints
/// - [`TemporalError::Invariant`] if a rewrite would leave an empty period
///
/// On error the transaction must be rolled back.
pub fn set_for_period<S: TemporalStore + ?Sized>(
    store: &mut S,
    candidate: TemporalRecord,
    options: &SetOptions,
) -> Result<Reconciliation, TemporalError> {
    let schema = store.schema().clone();
    if !schema.is_keyed() {
        return Err(TemporalError::Unkeyed {
            table: schema.table().to_string(),
        });
    }
    schema.check_record(&candidate)?;

    let coalesce = options.coalesce;
    let requested = candidate.interval;
    let start = requested.from;
    let mut self_from = start;
    let mut self_to = requested.to;
    let mut current_from = start;

    // Once an open candidate meets its first later record it is pinned, so
    // two rows decide everything unless merges can pull in more.
    let limit = (self_to.is_none() && !coalesce).then_some(2);
    let mut existing = store.overlapping(&candidate.key, &requested, limit)?;
    if coalesce {
        let (before, after): (Vec<_>, Vec<_>) = store
            .adjacent(&candidate.key, &requested, &candidate.value)?
            .into_iter()
            .partition(|r| start.is_some() && r.interval.to == start);
        existing = before.into_iter().chain(existing).chain(after).collect();
    }
    let nothing_overlaps = existing.is_empty();
    let pretty_key = schema.pretty_key(&candidate.key);

    let mut walk = Walk {
        store,
        schema: &schema,
        log: DecisionLog::new(
            pretty_key.clone(),
            schema.pretty_value(&candidate.value),
            options.levels,
        ),
        period: requested,
        create: true,
        stand_in: None,
    };

    let last = existing.len().saturating_sub(1);
    for (i, ex) in existing.iter().enumerate() {
        let (ef, et) = (ex.interval.from, ex.interval.to);
        let same_value = ex.value == candidate.value;
        let current_starts_before = strictly_before(current_from, ef);

        if current_starts_before {
            walk.log_set(current_from, ef);
        }

        if coalesce && self_from != ef && same_value {
            if strictly_before(self_from, ef) || ends_after(self_to, et) {
                walk.absorb_stand_in()?;
                self_from = earliest(self_from, ef);
                walk.period.from = self_from;
                walk.period.to = latest(walk.period.to, et);
                walk.store.delete(ex)?;
            } else {
                walk.log_unchanged(self_from, self_to);
                walk.keep(ex);
            }
            current_from = et;
            continue;
        }

        if self_to.is_none() && (current_starts_before || i != last) {
            if strictly_before(start, ef) {
                self_to = ef;
            } else if start == ef {
                self_to = et;
                if same_value {
                    walk.log_unchanged(self_from, self_to);
                    walk.keep(ex);
                } else {
                    walk.log_changed(self_from, self_to, &ex.value);
                    walk.store.delete(ex)?;
                }
            } else {
                self_to = et;
                walk.log_changed(self_from, self_to, &ex.value);
                walk.shrink(ex, Interval::new(ef, start))?;
            }
            walk.period.to = self_to;

            if coalesce {
                for next in &existing[i + 1..] {
                    if self_to.is_none()
                        || next.interval.from != self_to
                        || next.value != candidate.value
                    {
                        break;
                    }
                    walk.absorb_stand_in()?;
                    self_to = next.interval.to;
                    walk.period.to = self_to;
                    walk.store.delete(next)?;
                }
            }
            current_from = self_to;
            break;
        }

        if start == ef {
            if same_value {
                if self_to == et {
                    walk.log_unchanged(self_from, self_to);
                    walk.keep(ex);
                } else {
                    walk.log.changed_period(&period_str(ef, et), &period_str(ef, self_to));
                    walk.store.delete(ex)?;
                }
                current_from = self_to;
                continue;
            }
            walk.store.delete(ex)?;
            let to = if ends_after(self_to, et) { et } else { self_to };
            walk.log_changed(ef, to, &ex.value);
        } else if strictly_before(start, ef) {
            let kept = !ends_at_or_after(self_to, et);
            if kept {
                walk.shrink(ex, Interval::new(self_to, et))?;
            } else {
                walk.store.delete(ex)?;
            }
            if !same_value {
                walk.log_changed(ef, if kept { self_to } else { et }, &ex.value);
            } else if kept {
                walk.log.changed_period(&period_str(ef, et), &period_str(self_to, et));
            } else {
                walk.log.changed_period(&period_str(ef, et), &period_str(self_from, self_to));
            }
        } else {
            walk.shrink(ex, Interval::new(ef, start))?;
            if et.is_none() {
                walk.log_set(self_from, self_to);
            } else if !same_value {
                walk.log_changed(self_from, et, &ex.value);
            } else {
                walk.log.changed_period(&period_str(ef, et), &period_str(ef, self_from));
            }
        }
        current_from = et;
    }

    if nothing_overlaps || ends_after(self_to, current_from) {
        walk.log_set(current_from, self_to);
    }

    let inserted = if walk.create {
        let period = walk.period;
        walk.store
            .add(TemporalRecord::new(candidate.key, period, candidate.value))?;
        Some(period)
    } else {
        None
    };
    walk.store.flush()?;

    let events = walk.log.into_events();
    for event in &events {
        event.emit(schema.table(), &pretty_key);
    }
    Ok(Reconciliation { events, inserted })
}
