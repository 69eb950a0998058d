//! Statement options and store-level configuration loaded from TOML.
//!
//! ```toml
//! dialect = "postgresql"
//!
//! [statement]
//! naming_strategy = "t-scheme"
//! lock_for_update = true
//! ```
//!
//! `dialect` may also be a full capability table:
//!
//! ```toml
//! [dialect]
//! name = "acme"
//! ansi_join_syntax = false
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::dialect::{Capabilities, Dialect};
use crate::error::{StmtError, StmtResult};
use crate::namer::DEFAULT_NAMING_STRATEGY;
use crate::stmt::StatementBuilder;
use crate::table::Table;

/// Per-statement options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StatementOptions {
    /// Key of the alias naming strategy.
    pub naming_strategy: String,
    /// Lock the selected rows (`SELECT ... FOR UPDATE` or table hints).
    pub lock_for_update: bool,
    /// Fail instead of waiting when rows are already locked.
    pub for_update_nowait: bool,
}

impl Default for StatementOptions {
    fn default() -> Self {
        Self {
            naming_strategy: DEFAULT_NAMING_STRATEGY.to_string(),
            lock_for_update: false,
            for_update_nowait: false,
        }
    }
}

impl StatementOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the alias naming strategy key.
    pub fn with_naming_strategy(mut self, name: impl Into<String>) -> Self {
        self.naming_strategy = name.into();
        self
    }

    /// Request row locking.
    pub fn with_lock_for_update(mut self, lock: bool) -> Self {
        self.lock_for_update = lock;
        self
    }

    /// Append `NOWAIT` to the lock clause when the dialect supports it.
    pub fn with_nowait(mut self, nowait: bool) -> Self {
        self.for_update_nowait = nowait;
        self
    }
}

/// Dialect given either as a preset name or as a capability table.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DialectSource {
    Preset(String),
    Custom(Box<Capabilities>),
}

impl Default for DialectSource {
    fn default() -> Self {
        DialectSource::Preset("ansi".to_string())
    }
}

/// Store-level defaults shared by every statement built from it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub dialect: DialectSource,
    pub statement: StatementOptions,
}

impl StoreConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(raw: &str) -> StmtResult<Self> {
        let config: StoreConfig = toml::from_str(raw)?;
        config.capabilities()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> StmtResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            StmtError::config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw).map_err(|e| {
            StmtError::config(format!("failed to parse config file {}: {e}", path.display()))
        })
    }

    /// Resolved dialect capabilities.
    pub fn capabilities(&self) -> StmtResult<Capabilities> {
        match &self.dialect {
            DialectSource::Preset(name) => Capabilities::preset(name),
            DialectSource::Custom(caps) => Ok((**caps).clone()),
        }
    }

    pub fn dialect(&self) -> StmtResult<Arc<dyn Dialect>> {
        Ok(Arc::new(self.capabilities()?))
    }

    /// Start a statement on `table` using this store's dialect and options.
    pub fn statement(&self, table: Arc<Table>) -> StmtResult<StatementBuilder> {
        Ok(StatementBuilder::new(self.dialect()?, table).options(self.statement.clone()))
    }
}
