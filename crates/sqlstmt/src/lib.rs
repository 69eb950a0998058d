//! # sqlstmt
//!
//! Dialect-portable SQL statement builder.
//!
//! ## Features
//!
//! - **Table groups**: tables joined for one logical row are registered together,
//!   with aliases assigned by a pluggable naming strategy
//! - **Join graph**: joins are reordered before rendering so each one follows the
//!   table it joins from; cycles are reported as errors
//! - **UNION fan-out**: selects, joins and filters are replayed on every union
//!   branch so all branches keep the same shape
//! - **Dialect strategies**: pagination, row locking and ordering adapt to the
//!   capabilities of the target database
//! - **Cached rendering**: statement text is built once and reused until the next
//!   mutation
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sqlstmt::prelude::*;
//!
//! let person = Arc::new(Table::new("person").with_columns(["id", "name"]).with_primary_key(["id"]));
//! let address = Arc::new(Table::new("address").with_columns(["id", "person_id", "city"]));
//!
//! let mut stmt = Statement::new(Arc::new(Capabilities::postgresql()), person.clone())?;
//! let a = stmt.join(
//!     JoinSpec::inner(address.clone())
//!         .from_primary(person.primary_key())
//!         .on(address.mapping(["person_id"])),
//! )?;
//! stmt.select_mapping(None, &person.mapping(["name"]), None, true)?;
//! stmt.where_and(SqlExpr::column(&a, "city").eq_literal("Oslo"), true);
//!
//! assert_eq!(
//!     stmt.select_sql()?,
//!     "SELECT A0.name FROM person A0 INNER JOIN address B0 ON A0.id = B0.person_id WHERE B0.city = 'Oslo'"
//! );
//! ```

pub mod config;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod namer;
pub mod prelude;
pub mod stmt;
pub mod table;

pub use config::{DialectSource, StatementOptions, StoreConfig};
pub use dialect::{Capabilities, Dialect, LockCapabilities, RangeStyle};
pub use error::{StmtError, StmtResult};
pub use expr::{BoolExpr, Literal, Origin, SqlExpr};
pub use namer::{AliasNamer, AlphaNamer, NamerRegistration, NamingContext, TNamer};
pub use stmt::{
    Join, JoinSpec, JoinType, NullOrdering, OrderSpec, Range, SelectedItem, Statement,
    StatementBuilder, StatementId, TableGroup, TableRegistry,
};
pub use table::{Column, Mapping, Table, TableRef};

// Re-export inventory so downstream crates can register naming strategies
pub use inventory;
