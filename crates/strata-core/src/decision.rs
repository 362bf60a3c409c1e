//! Audit trail of reconciliation decisions.
//!
//! The engine appends one [`DecisionEvent`] per decision while it walks the
//! overlap set and only hands them to `tracing` once its writes have been
//! flushed. Message text is stable and meant to be asserted on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Target used for every decision event.
pub const DECISION_TARGET: &str = "strata::temporal";

/// Log level of a decision, independent of any subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Trace,
    Debug,
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity used for each family of decision.
///
/// Period-only changes are reported at the `set` level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLevels {
    pub set: Severity,
    pub change: Severity,
    pub unchanged: Severity,
}

impl Default for LogLevels {
    fn default() -> Self {
        Self {
            set: Severity::Info,
            change: Severity::Warn,
            unchanged: Severity::Debug,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// Coverage added where the key had none.
    Set,
    /// An existing value was replaced.
    ChangedValue,
    /// Same value, different bounds.
    ChangedPeriod,
    /// Nothing to do.
    Unchanged,
}

impl DecisionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::ChangedValue => "changed_value",
            Self::ChangedPeriod => "changed_period",
            Self::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decision taken while reconciling a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionEvent {
    pub kind: DecisionKind,
    pub severity: Severity,
    pub message: String,
}

impl DecisionEvent {
    /// Hand the event to `tracing` under [`DECISION_TARGET`].
    pub fn emit(&self, table: &str, key: &str) {
        let kind = self.kind.as_str();
        let message = self.message.as_str();
        macro_rules! emit_at {
            ($level:expr) => {
                tracing::event!(target: DECISION_TARGET, $level, table, key, kind, "{}", message)
            };
        }
        match self.severity {
            Severity::Trace => emit_at!(tracing::Level::TRACE),
            Severity::Debug => emit_at!(tracing::Level::DEBUG),
            Severity::Info => emit_at!(tracing::Level::INFO),
            Severity::Warn => emit_at!(tracing::Level::WARN),
            Severity::Error => emit_at!(tracing::Level::ERROR),
        }
    }
}

impl fmt::Display for DecisionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.severity, self.message)
    }
}

/// Builds decision messages for one key and candidate value.
#[derive(Debug, Clone)]
pub(crate) struct DecisionLog {
    pretty_key: String,
    pretty_value: String,
    levels: LogLevels,
    events: Vec<DecisionEvent>,
}

impl DecisionLog {
    pub(crate) const fn new(pretty_key: String, pretty_value: String, levels: LogLevels) -> Self {
        Self {
            pretty_key,
            pretty_value,
            levels,
            events: Vec::new(),
        }
    }

    fn push(&mut self, kind: DecisionKind, severity: Severity, message: String) {
        self.events.push(DecisionEvent {
            kind,
            severity,
            message,
        });
    }

    pub(crate) fn set(&mut self, period: &str) {
        let message = format!("{} from {period} set to {}", self.pretty_key, self.pretty_value);
        self.push(DecisionKind::Set, self.levels.set, message);
    }

    pub(crate) fn changed_value(&mut self, period: &str, old_value: &str) {
        let message = format!(
            "{} from {period} changed from {old_value} to {}",
            self.pretty_key, self.pretty_value
        );
        self.push(DecisionKind::ChangedValue, self.levels.change, message);
    }

    pub(crate) fn changed_period(&mut self, old_period: &str, new_period: &str) {
        let message = format!(
            "{} changed period from {old_period} to {new_period}",
            self.pretty_key
        );
        self.push(DecisionKind::ChangedPeriod, self.levels.set, message);
    }

    pub(crate) fn unchanged(&mut self, period: &str) {
        let message = format!("{} from {period} left at {}", self.pretty_key, self.pretty_value);
        self.push(DecisionKind::Unchanged, self.levels.unchanged, message);
    }

    pub(crate) fn into_events(self) -> Vec<DecisionEvent> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_follow_templates() {
        let mut log = DecisionLog::new("key='k'".into(), "n".into(), LogLevels::default());
        log.set("2001-01-01 00:00:00 onwards");
        log.changed_value("always", "o");
        log.changed_period("until 2001-01-01 00:00:00", "always");
        log.unchanged("always");

        let rendered: Vec<String> = log.into_events().iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "INFO key='k' from 2001-01-01 00:00:00 onwards set to n",
                "WARN key='k' from always changed from o to n",
                "INFO key='k' changed period from until 2001-01-01 00:00:00 to always",
                "DEBUG key='k' from always left at n",
            ]
        );
    }

    #[test]
    fn levels_are_configurable() {
        let levels = LogLevels {
            set: Severity::Debug,
            change: Severity::Error,
            unchanged: Severity::Trace,
        };
        let mut log = DecisionLog::new("key='k'".into(), "n".into(), levels);
        log.set("always");
        log.changed_value("always", "o");
        log.changed_period("always", "always");
        log.unchanged("always");
        let severities: Vec<_> = log.into_events().iter().map(|e| e.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::Debug, Severity::Error, Severity::Debug, Severity::Trace]
        );
    }

    #[test]
    fn severity_parses_lowercase_and_warning_alias() {
        #[derive(Deserialize)]
        struct Wrapper {
            level: Severity,
        }
        let parsed: Wrapper = toml::from_str("level = \"warning\"").expect("parse");
        assert_eq!(parsed.level, Severity::Warn);
        let parsed: Wrapper = toml::from_str("level = \"debug\"").expect("parse");
        assert_eq!(parsed.level, Severity::Debug);
    }
}
