use std::fmt;

/// Machine-readable error codes for callers that branch on failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidInterval,
    AmbiguousConstruction,
    MissingPeriod,
    OverlapViolation,
    ConcurrencyConflict,
    MissingId,
    Unkeyed,
    SchemaMismatch,
    InvariantViolated,
    StorageFailure,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidInterval => "E1001",
            Self::AmbiguousConstruction => "E1002",
            Self::MissingPeriod => "E1003",
            Self::OverlapViolation => "E2001",
            Self::ConcurrencyConflict => "E2002",
            Self::MissingId => "E3001",
            Self::Unkeyed => "E3002",
            Self::SchemaMismatch => "E3003",
            Self::InvariantViolated => "E9001",
            Self::StorageFailure => "E9002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidInterval => "Empty or inverted period",
            Self::AmbiguousConstruction => "Period given twice",
            Self::MissingPeriod => "No period given",
            Self::OverlapViolation => "Overlapping periods for one key",
            Self::ConcurrencyConflict => "Concurrent writer conflict",
            Self::MissingId => "Record is not persisted",
            Self::Unkeyed => "Entity has no key columns",
            Self::SchemaMismatch => "Record does not match entity schema",
            Self::InvariantViolated => "Internal invariant violated",
            Self::StorageFailure => "SQLite failure",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InvalidInterval => Some("Make sure `from` is strictly before `to`."),
            Self::AmbiguousConstruction => {
                Some("Pass either a period or value_from/value_to, not both.")
            }
            Self::MissingPeriod => Some("Pass a period, value_from or value_to."),
            Self::OverlapViolation => {
                Some("Use set_for_period instead of adding rows directly, then retry.")
            }
            Self::ConcurrencyConflict => {
                Some("Roll back and re-run the operation once the other writer is done.")
            }
            Self::MissingId => None,
            Self::Unkeyed => Some("Declare key columns for the entity."),
            Self::SchemaMismatch => Some("Supply one value per declared key and value column."),
            Self::InvariantViolated => Some("Roll back. If persistent, report a bug with logs."),
            Self::StorageFailure => Some("Check the database file and retry."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised while building records or reconciling a timeline.
///
/// Every variant propagates to the caller. Nothing here is retried locally:
/// after an error the ambient transaction must be rolled back.
#[derive(Debug, thiserror::Error)]
pub enum TemporalError {
    /// A period with `from >= to` reached construction or the store.
    #[error("invalid period{}: {detail}", table_suffix(.table.as_deref()))]
    InvalidInterval {
        table: Option<String>,
        detail: String,
    },

    /// Two rows for one key would cover the same instant.
    #[error("temporal overlap in {table}")]
    OverlapViolation { table: String },

    /// Both an explicit period and `value_from`/`value_to` were supplied.
    #[error("period not allowed if value_from or value_to used")]
    AmbiguousConstruction,

    /// Neither a period nor `value_from`/`value_to` was supplied.
    #[error("a period, value_from or value_to is required")]
    MissingPeriod,

    /// The store reported lock contention or a serialization failure.
    #[error("concurrent write conflict: {detail}")]
    ConcurrencyConflict { detail: String },

    /// A delete or update was requested for a record the store never saw.
    #[error("record in {table} has no id")]
    MissingId { table: String },

    /// The entity declares no key columns, so it has no timeline to reconcile.
    #[error("{table} has no key columns")]
    Unkeyed { table: String },

    /// Key or value arity does not match the schema.
    #[error("record does not match {table}: {detail}")]
    SchemaMismatch { table: String, detail: String },

    /// The engine was about to leave an empty period behind.
    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

fn table_suffix(table: Option<&str>) -> String {
    table.map(|t| format!(" in {t}")).unwrap_or_default()
}

impl TemporalError {
    /// The stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInterval { .. } => ErrorCode::InvalidInterval,
            Self::OverlapViolation { .. } => ErrorCode::OverlapViolation,
            Self::AmbiguousConstruction => ErrorCode::AmbiguousConstruction,
            Self::MissingPeriod => ErrorCode::MissingPeriod,
            Self::ConcurrencyConflict { .. } => ErrorCode::ConcurrencyConflict,
            Self::MissingId { .. } => ErrorCode::MissingId,
            Self::Unkeyed { .. } => ErrorCode::Unkeyed,
            Self::SchemaMismatch { .. } => ErrorCode::SchemaMismatch,
            Self::Invariant(_) => ErrorCode::InvariantViolated,
            Self::Sqlite(_) => ErrorCode::StorageFailure,
        }
    }

    /// Classify a SQLite failure raised while writing to `table`.
    ///
    /// The overlap triggers abort with `temporal overlap: <table>`, the period
    /// CHECK constraint fails with `SQLITE_CONSTRAINT_CHECK`, and lock
    /// contention surfaces as `SQLITE_BUSY`/`SQLITE_LOCKED`.
    #[must_use]
    pub fn from_write(table: &str, error: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode as Code;

        let rusqlite::Error::SqliteFailure(failure, message) = &error else {
            return Self::Sqlite(error);
        };
        let message = message.as_deref().unwrap_or_default();
        match failure.code {
            Code::ConstraintViolation if message.starts_with(crate::schema::OVERLAP_ABORT) => {
                Self::OverlapViolation {
                    table: table.to_string(),
                }
            }
            Code::ConstraintViolation
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_CHECK =>
            {
                Self::InvalidInterval {
                    table: Some(table.to_string()),
                    detail: message.to_string(),
                }
            }
            Code::DatabaseBusy | Code::DatabaseLocked => Self::ConcurrencyConflict {
                detail: message.to_string(),
            },
            _ => Self::Sqlite(error),
        }
    }
}
