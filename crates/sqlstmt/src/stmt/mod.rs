//! The statement builder.
//!
//! A [`Statement`] is created around one primary table and then mutated in any
//! order: selects, joins, WHERE/HAVING predicates, grouping, ordering, range,
//! unions. Rendering (`select_sql`, `update_sql`, `delete_sql`) assembles the
//! final text for the configured [`Dialect`] and caches it until the next
//! mutation.
//!
//! ```ignore
//! use std::sync::Arc;
//! use sqlstmt::prelude::*;
//!
//! let person = Arc::new(Table::new("person").with_columns(["id", "name"]));
//! let mut stmt = Statement::new(Arc::new(Capabilities::postgresql()), person.clone())?;
//! let p = stmt.primary_table().clone();
//! stmt.select_mapping(None, &person.mapping(["id", "name"]), None, true)?;
//! stmt.where_and(SqlExpr::column(&p, "name").eq_literal("alice"), true);
//! stmt.set_range(None, Some(10));
//!
//! assert_eq!(
//!     stmt.select_sql()?,
//!     "SELECT A0.id, A0.name FROM person A0 WHERE A0.name = 'alice' LIMIT 10"
//! );
//! ```

mod join;
mod lock;
mod order;
mod paginate;
mod registry;
mod render;
mod select;
mod union;

#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use crate::config::StatementOptions;
use crate::dialect::Dialect;
use crate::error::{StmtError, StmtResult};
use crate::expr::{BoolExpr, SqlExpr};
use crate::namer::{self, AliasNamer, NamingContext};
use crate::table::{Table, TableRef};

pub use join::{Join, JoinSpec, JoinType};
pub use order::{NullOrdering, OrderSpec};
pub use paginate::Range;
pub use registry::{TableGroup, TableRegistry};
pub use select::SelectedItem;

/// Group the primary table is registered into unless overridden.
pub const PRIMARY_GROUP: &str = "Group0";

/// Process-unique statement identity, used for ancestry lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatementId(u64);

impl StatementId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        StatementId(NEXT.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

/// Which statement text the cache currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Framing {
    Select,
    Update,
    Delete,
}

/// Builder for a [`Statement`].
#[derive(Debug, Clone)]
pub struct StatementBuilder {
    dialect: Arc<dyn Dialect>,
    table: Arc<Table>,
    alias: Option<String>,
    group: Option<String>,
    options: StatementOptions,
    ancestry: Vec<StatementId>,
}

impl StatementBuilder {
    pub fn new(dialect: Arc<dyn Dialect>, table: Arc<Table>) -> Self {
        Self {
            dialect,
            table,
            alias: None,
            group: None,
            options: StatementOptions::default(),
            ancestry: Vec::new(),
        }
    }

    /// Alias of the primary table. Generated by the naming strategy when unset.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Group of the primary table. Defaults to [`PRIMARY_GROUP`].
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn options(mut self, options: StatementOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> StmtResult<Statement> {
        let namer = namer::resolve(&self.options.naming_strategy)?;
        let group = self.group.unwrap_or_else(|| PRIMARY_GROUP.to_string());

        let mut registry = TableRegistry::default();
        let alias = match self.alias {
            Some(alias) => alias,
            None => {
                let cx = NamingContext::new(&registry, self.ancestry.len());
                namer.alias_for_table(&cx, &self.table, &group)
            }
        };
        let primary = TableRef::new(self.table, alias, group);
        registry.insert(primary.clone(), None);

        Ok(Statement {
            id: StatementId::next(),
            ancestry: self.ancestry,
            dialect: self.dialect,
            namer,
            options: self.options,
            primary,
            registry,
            joins: Vec::new(),
            requires_reorder: false,
            selected: Vec::new(),
            updates: Vec::new(),
            distinct: false,
            aggregated: false,
            where_clause: None,
            grouping: Vec::new(),
            having: None,
            ordering: None,
            range: Range::default(),
            unions: Vec::new(),
            cache: None,
        })
    }
}

/// A SELECT/UPDATE/DELETE statement under construction.
///
/// Every mutator clears the cached text. Mutators taking `apply_to_unions`
/// replay themselves on every union branch, recursively, so all branches keep
/// the same select-list shape.
#[derive(Debug)]
pub struct Statement {
    id: StatementId,
    ancestry: Vec<StatementId>,
    dialect: Arc<dyn Dialect>,
    namer: Arc<dyn AliasNamer>,
    options: StatementOptions,
    primary: TableRef,
    registry: TableRegistry,
    joins: Vec<Join>,
    requires_reorder: bool,
    selected: Vec<SelectedItem>,
    updates: Vec<(SqlExpr, SqlExpr)>,
    distinct: bool,
    aggregated: bool,
    where_clause: Option<BoolExpr>,
    grouping: Vec<SqlExpr>,
    having: Option<BoolExpr>,
    ordering: Option<OrderSpec>,
    range: Range,
    unions: Vec<Statement>,
    cache: Option<(Framing, String)>,
}

impl Statement {
    /// Start building a statement on `table`.
    pub fn builder(dialect: Arc<dyn Dialect>, table: Arc<Table>) -> StatementBuilder {
        StatementBuilder::new(dialect, table)
    }

    /// A statement on `table` with default options and a generated alias.
    pub fn new(dialect: Arc<dyn Dialect>, table: Arc<Table>) -> StmtResult<Self> {
        StatementBuilder::new(dialect, table).build()
    }

    /// A correlated subquery of this statement, sharing its dialect and options.
    ///
    /// Row locking is never requested for subqueries.
    pub fn subquery(&self, table: Arc<Table>) -> StatementBuilder {
        let mut ancestry = self.ancestry.clone();
        ancestry.push(self.id);
        StatementBuilder {
            dialect: self.dialect.clone(),
            table,
            alias: None,
            group: None,
            options: self.options.clone().with_lock_for_update(false),
            ancestry,
        }
    }

    pub fn id(&self) -> StatementId {
        self.id
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    pub fn options(&self) -> &StatementOptions {
        &self.options
    }

    /// Replace the options, resolving the naming strategy they name.
    pub fn set_options(&mut self, options: StatementOptions) -> StmtResult<()> {
        self.namer = namer::resolve(&options.naming_strategy)?;
        self.options = options;
        self.invalidate();
        Ok(())
    }

    /// Switch the naming strategy used for tables registered from now on.
    pub fn set_naming_strategy(&mut self, name: &str) -> StmtResult<()> {
        let options = self.options.clone().with_naming_strategy(name);
        self.set_options(options)
    }

    /// Whether this statement is a subquery (at any depth) of `other`.
    pub fn is_child_of(&self, other: &Statement) -> bool {
        self.ancestry.contains(&other.id)
    }

    pub fn is_subquery(&self) -> bool {
        !self.ancestry.is_empty()
    }

    /// Nesting level: 0 for a top-level statement.
    pub fn subquery_depth(&self) -> usize {
        self.ancestry.len()
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn set_distinct(&mut self, distinct: bool) {
        self.distinct = distinct;
        self.invalidate();
    }

    /// Whether the statement selects or groups by aggregates.
    pub fn is_aggregated(&self) -> bool {
        self.aggregated
    }

    pub fn range(&self) -> Range {
        self.range
    }

    /// Restrict the result rows. `None` means unbounded.
    pub fn set_range(&mut self, offset: Option<u64>, count: Option<u64>) {
        self.range = Range { offset, count };
        self.invalidate();
    }

    pub fn where_clause(&self) -> Option<&BoolExpr> {
        self.where_clause.as_ref()
    }

    /// AND a predicate into the WHERE clause. A literal `TRUE` is ignored.
    pub fn where_and(&mut self, expr: BoolExpr, apply_to_unions: bool) {
        if expr.is_true() {
            return;
        }
        if apply_to_unions {
            for union in &mut self.unions {
                union.where_and(expr.clone(), true);
            }
        }
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self.invalidate();
    }

    /// OR a predicate into the WHERE clause.
    pub fn where_or(&mut self, expr: BoolExpr, apply_to_unions: bool) {
        if apply_to_unions {
            for union in &mut self.unions {
                union.where_or(expr.clone(), true);
            }
        }
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.or(expr),
            None => expr,
        });
        self.invalidate();
    }

    /// Add a GROUP BY expression, on this statement and every union branch.
    pub fn add_grouping_expression(&mut self, expr: SqlExpr) {
        for union in &mut self.unions {
            union.add_grouping_expression(expr.clone());
        }
        self.grouping.push(expr);
        self.aggregated = true;
        self.invalidate();
    }

    pub fn grouping_expressions(&self) -> &[SqlExpr] {
        &self.grouping
    }

    /// Set the HAVING clause, on this statement and every union branch.
    pub fn set_having(&mut self, expr: BoolExpr) {
        for union in &mut self.unions {
            union.set_having(expr.clone());
        }
        self.having = Some(expr);
        self.aggregated = true;
        self.invalidate();
    }

    pub fn having(&self) -> Option<&BoolExpr> {
        self.having.as_ref()
    }

    /// Set the assignments of an UPDATE statement.
    pub fn set_updates(&mut self, assignments: Vec<(SqlExpr, SqlExpr)>) -> StmtResult<()> {
        if assignments.iter().any(|(col, value)| col.is_empty() || value.is_empty()) {
            return Err(StmtError::MissingArgument("update assignment"));
        }
        self.updates = assignments;
        self.invalidate();
        Ok(())
    }

    pub fn has_updates(&self) -> bool {
        !self.updates.is_empty()
    }

    pub(crate) fn invalidate(&mut self) {
        self.cache = None;
    }

    fn cached(&self, framing: Framing) -> Option<String> {
        match &self.cache {
            Some((f, sql)) if *f == framing => Some(sql.clone()),
            _ => None,
        }
    }
}
