//! Temporal records and the scalar values they carry.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TemporalError;
use crate::interval::{Interval, Timestamp};

/// A key or value column cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Text(String),
}

impl Value {
    /// Quoted rendering used when a value is shown next to its column name:
    /// text is single-quoted with `\` and `'` escaped, integers are bare and
    /// null is `None`.
    #[must_use]
    pub fn repr(&self) -> String {
        match self {
            Self::Null => "None".to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Text(s) => {
                let escaped = s.replace('\\', "\\\\").replace('\'', "\\'");
                format!("'{escaped}'")
            }
        }
    }

    /// Parse a command-line literal: integers stay integers, `null`/`None`
    /// becomes [`Value::Null`], everything else is text.
    #[must_use]
    pub fn parse_literal(raw: &str) -> Self {
        if raw == "null" || raw == "None" {
            return Self::Null;
        }
        raw.parse::<i64>()
            .map_or_else(|_| Self::Text(raw.to_string()), Self::Integer)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("None"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Self::Integer(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Self::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(Self::Null),
            ValueRef::Integer(i) => Ok(Self::Integer(i)),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                .map(|s| Self::Text(s.to_string()))
                .map_err(|e| FromSqlError::Other(Box::new(e))),
            ValueRef::Real(_) | ValueRef::Blob(_) => Err(FromSqlError::InvalidType),
        }
    }
}

/// Store-assigned row identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of a timeline: `value` holds for `key` during `interval`.
///
/// `key` and `value` are positional, in the order of the entity's key and
/// value columns. A record built by a caller has no `id` until the store
/// persists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalRecord {
    pub key: Vec<Value>,
    pub interval: Interval,
    pub value: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
}

impl TemporalRecord {
    /// A transient record with no id.
    #[must_use]
    pub const fn new(key: Vec<Value>, interval: Interval, value: Vec<Value>) -> Self {
        Self {
            key,
            interval,
            value,
            id: None,
        }
    }

    #[must_use]
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }

    #[must_use]
    pub const fn value_from(&self) -> Option<Timestamp> {
        self.interval.from
    }

    #[must_use]
    pub const fn value_to(&self) -> Option<Timestamp> {
        self.interval.to
    }

    /// Move the start of the period, keeping its end.
    pub fn set_value_from(&mut self, from: Option<Timestamp>) {
        self.interval.from = from;
    }

    /// Move the end of the period, keeping its start.
    pub fn set_value_to(&mut self, to: Option<Timestamp>) {
        self.interval.to = to;
    }

    /// Human-readable period this record is valid for.
    #[must_use]
    pub fn period_str(&self) -> String {
        self.interval.to_string()
    }

    /// Same value tuple, compared column by column.
    #[must_use]
    pub fn same_value(&self, other: &[Value]) -> bool {
        self.value == other
    }
}

/// Builder for [`TemporalRecord`] accepting either an explicit period or the
/// `value_from`/`value_to` shorthand.
#[derive(Debug, Default, Clone)]
pub struct RecordBuilder {
    key: Vec<Value>,
    value: Vec<Value>,
    period: Option<Interval>,
    value_from: Option<Timestamp>,
    value_to: Option<Timestamp>,
}

impl RecordBuilder {
    #[must_use]
    pub fn key(mut self, cell: impl Into<Value>) -> Self {
        self.key.push(cell.into());
        self
    }

    #[must_use]
    pub fn value(mut self, cell: impl Into<Value>) -> Self {
        self.value.push(cell.into());
        self
    }

    #[must_use]
    pub fn period(mut self, period: Interval) -> Self {
        self.period = Some(period);
        self
    }

    #[must_use]
    pub fn value_from(mut self, from: Timestamp) -> Self {
        self.value_from = Some(from);
        self
    }

    #[must_use]
    pub fn value_to(mut self, to: Timestamp) -> Self {
        self.value_to = Some(to);
        self
    }

    /// Finish the record.
    ///
    /// # Errors
    ///
    /// [`TemporalError::AmbiguousConstruction`] if a period was given together
    /// with `value_from` or `value_to`, [`TemporalError::MissingPeriod`] if
    /// none of them was given.
    pub fn build(self) -> Result<TemporalRecord, TemporalError> {
        let shorthand = self.value_from.is_some() || self.value_to.is_some();
        let interval = match (self.period, shorthand) {
            (Some(_), true) => return Err(TemporalError::AmbiguousConstruction),
            (Some(period), false) => period,
            (None, true) => Interval::new(self.value_from, self.value_to),
            (None, false) => return Err(TemporalError::MissingPeriod),
        };
        Ok(TemporalRecord::new(self.key, interval, self.value))
    }
}
