//! Convenient imports for typical `sqlstmt` usage.
//!
//! ```ignore
//! use sqlstmt::prelude::*;
//! ```

pub use crate::{
    BoolExpr, Capabilities, Dialect, JoinSpec, JoinType, Literal, NullOrdering, SqlExpr,
    Statement, StatementOptions, StmtError, StmtResult, StoreConfig, Table, TableRef,
};
