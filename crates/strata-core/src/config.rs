//! Project and user configuration.
//!
//! Both files share one format. Values in `<root>/.strata/config.toml`
//! override values in `<config_dir>/strata/config.toml`, key by key; anything
//! neither sets falls back to the built-in default.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::decision::{LogLevels, Severity};
use crate::engine::SetOptions;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrataConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub temporal: TemporalConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file; relative paths are taken from the project root.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Configured database path, or `.strata/strata.sqlite3` under the root.
    #[must_use]
    pub fn resolve_path(&self, project_root: &Path) -> PathBuf {
        self.path.as_ref().map_or_else(
            || project_root.join(".strata").join("strata.sqlite3"),
            |path| project_root.join(path),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalConfig {
    #[serde(default = "default_true")]
    pub coalesce: bool,
    #[serde(default = "default_set_level")]
    pub set_level: Severity,
    #[serde(default = "default_change_level")]
    pub change_level: Severity,
    #[serde(default = "default_unchanged_level")]
    pub unchanged_level: Severity,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            coalesce: default_true(),
            set_level: default_set_level(),
            change_level: default_change_level(),
            unchanged_level: default_unchanged_level(),
        }
    }
}

impl From<&TemporalConfig> for SetOptions {
    fn from(config: &TemporalConfig) -> Self {
        Self {
            coalesce: config.coalesce,
            levels: LogLevels {
                set: config.set_level,
                change: config.change_level,
                unchanged: config.unchanged_level,
            },
        }
    }
}

/// Path of the project config under `project_root`.
#[must_use]
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".strata").join("config.toml")
}

/// Path of the user config, if the platform has a config directory.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("strata").join("config.toml"))
}

/// Load only the project config.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<StrataConfig> {
    let table = read_table(&project_config_path(project_root))?.unwrap_or_default();
    into_config(table, "project config")
}

/// Load only the user config.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<StrataConfig> {
    let table = match user_config_path() {
        Some(path) => read_table(&path)?.unwrap_or_default(),
        None => toml::Table::new(),
    };
    into_config(table, "user config")
}

/// Effective configuration for `project_root`: project over user over
/// defaults.
///
/// # Errors
///
/// Returns an error if either file exists but cannot be read or parsed.
pub fn resolve_config(project_root: &Path) -> Result<StrataConfig> {
    let user = match user_config_path() {
        Some(path) => read_table(&path)?,
        None => None,
    };
    let project = read_table(&project_config_path(project_root))?;
    merge_files(user, project)
}

fn merge_files(user: Option<toml::Table>, project: Option<toml::Table>) -> Result<StrataConfig> {
    let mut merged = user.unwrap_or_default();
    if let Some(project) = project {
        merge_tables(&mut merged, project);
    }
    into_config(merged, "merged config")
}

fn read_table(path: &Path) -> Result<Option<toml::Table>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let table = toml::from_str::<toml::Table>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(Some(table))
}

fn into_config(table: toml::Table, what: &str) -> Result<StrataConfig> {
    toml::Value::Table(table)
        .try_into()
        .with_context(|| format!("Invalid {what}"))
}

/// Recursively overlay `top` onto `base`.
fn merge_tables(base: &mut toml::Table, top: toml::Table) {
    for (key, value) in top {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_section)), toml::Value::Table(top_section)) => {
                merge_tables(base_section, top_section);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

const fn default_true() -> bool {
    true
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

const fn default_set_level() -> Severity {
    Severity::Info
}

const fn default_change_level() -> Severity {
    Severity::Warn
}

const fn default_unchanged_level() -> Severity {
    Severity::Debug
}
