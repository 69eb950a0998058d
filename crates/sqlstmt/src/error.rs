//! Error types for sqlstmt

use thiserror::Error;

/// Result type alias for statement building operations
pub type StmtResult<T> = Result<T, StmtError>;

/// Errors raised while building or rendering a statement.
///
/// Every variant is fatal: the statement that produced it should be discarded.
/// Fidelity problems (a lock that cannot be applied, an unsupported null
/// ordering) are not errors; they are logged through `tracing` instead.
#[derive(Debug, Error)]
pub enum StmtError {
    /// An expression, mapping or column argument was empty
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    /// The table passed alongside a mapping does not own that mapping
    #[error("Table mismatch: '{given}' was given but the mapping belongs to '{owner}'")]
    TableMismatch { given: String, owner: String },

    /// Join keys with a different number of columns
    #[error("Join key arity mismatch: source has {source_arity} columns, target has {target_arity}")]
    JoinArityMismatch {
        source_arity: usize,
        target_arity: usize,
    },

    /// No table is registered under the alias
    #[error("Unknown table alias: {0}")]
    UnknownAlias(String),

    /// An alias is already bound to a different table
    #[error("Alias '{alias}' is already bound to table '{table}'")]
    DuplicateAlias { alias: String, table: String },

    /// Parallel ordering sequences have different lengths
    #[error("Ordering length mismatch: {expressions} expressions, {directions} directions, {nulls} null directives")]
    OrderingLengthMismatch {
        expressions: usize,
        directions: usize,
        nulls: usize,
    },

    /// The dialect does not support the requested construct
    #[error("Unsupported by dialect: {0}")]
    Unsupported(String),

    /// The joins cannot be ordered relative to the primary table
    #[error("Circular joins cannot be ordered: {0}")]
    CircularJoins(String),

    /// No alias namer is registered under the strategy key
    #[error("Unknown naming strategy: {0}")]
    UnknownNamingStrategy(String),

    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(String),
}

impl StmtError {
    /// Create a table mismatch error
    pub fn table_mismatch(given: impl Into<String>, owner: impl Into<String>) -> Self {
        Self::TableMismatch {
            given: given.into(),
            owner: owner.into(),
        }
    }

    /// Create an unsupported-feature error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is an unsupported-feature error
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    /// Check if this is a circular join error
    pub fn is_circular_joins(&self) -> bool {
        matches!(self, Self::CircularJoins(_))
    }

    /// Check if this is a table mismatch error
    pub fn is_table_mismatch(&self) -> bool {
        matches!(self, Self::TableMismatch { .. })
    }
}

impl From<toml::de::Error> for StmtError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
