//! strata-core library.
//!
//! Temporal tables keyed by an entity key, where every row carries a value
//! for a half-open period `[valid_from, valid_to)` and rows for the same key
//! never overlap. [`engine::set_for_period`] is the single write path: it
//! reconciles a candidate value against the existing timeline and reports
//! what it did as [`decision::DecisionEvent`]s.
//!
//! # Conventions
//!
//! - **Errors**: library operations on temporal data return
//!   [`TemporalError`]; bootstrap and configuration use `anyhow::Result`.
//! - **Logging**: use `tracing` macros. Reconciliation decisions go to the
//!   [`decision::DECISION_TARGET`] target.
//! - **Transactions**: the caller owns them. Nothing here commits.

pub mod config;
pub mod db;
pub mod decision;
pub mod engine;
pub mod error;
pub mod interval;
pub mod record;
pub mod schema;
pub mod store;

pub use decision::{DecisionEvent, DecisionKind, LogLevels, Severity};
pub use engine::{Reconciliation, SetOptions, set_for_period};
pub use error::{ErrorCode, TemporalError};
pub use interval::{Interval, Timestamp};
pub use record::{RecordId, TemporalRecord, Value};
pub use schema::{EntitySchema, TemporalEntity};
pub use store::{SqliteStore, TemporalStore};
