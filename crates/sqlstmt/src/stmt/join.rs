use std::sync::Arc;

use super::Statement;
use crate::dialect::Dialect;
use crate::error::{StmtError, StmtResult};
use crate::expr::{BoolExpr, Literal, SqlExpr};
use crate::namer::NamingContext;
use crate::table::{Mapping, Table, TableRef};

/// Kind of join between two registered tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    LeftOuter,
    RightOuter,
    Cross,
    /// Comma-joined table whose condition lives in the WHERE clause.
    NonAnsi,
}

impl JoinType {
    fn keyword(self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::LeftOuter => "LEFT OUTER JOIN",
            JoinType::RightOuter => "RIGHT OUTER JOIN",
            JoinType::Cross => "CROSS JOIN",
            JoinType::NonAnsi => ",",
        }
    }

    /// Cross and non-ANSI joins do not depend on the FROM order.
    fn is_order_independent(self) -> bool {
        matches!(self, JoinType::Cross | JoinType::NonAnsi)
    }
}

/// A join from `source` to `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    join_type: JoinType,
    target: TableRef,
    source: Option<TableRef>,
    condition: Option<BoolExpr>,
}

impl Join {
    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    pub fn target(&self) -> &TableRef {
        &self.target
    }

    /// Table joined from. `None` for cross joins.
    pub fn source(&self) -> Option<&TableRef> {
        self.source.as_ref()
    }

    pub fn condition(&self) -> Option<&BoolExpr> {
        self.condition.as_ref()
    }

    /// Render this join, including its leading separator.
    pub(crate) fn to_sql(&self, dialect: &dyn Dialect, lock_hint: Option<&str>) -> String {
        match self.join_type {
            JoinType::Cross => {
                if dialect.supports_ansi_cross_join_syntax() {
                    format!(" CROSS JOIN {}", self.target)
                } else if dialect.cross_join_as_inner() {
                    format!(" INNER JOIN {} ON 1=1", self.target)
                } else {
                    format!(", {}", self.target)
                }
            }
            JoinType::NonAnsi => format!(", {}", self.target),
            jt => {
                let mut sql = format!(" {} {}", jt.keyword(), self.target);
                if let Some(hint) = lock_hint {
                    sql.push_str(" WITH ");
                    sql.push_str(hint);
                }
                let on = self
                    .condition
                    .as_ref()
                    .map(BoolExpr::to_sql)
                    .unwrap_or_else(|| "1=1".to_string());
                sql.push_str(" ON ");
                sql.push_str(&on);
                sql
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum JoinSource {
    Primary,
    Alias(String),
}

/// Description of a join to add with [`Statement::join`].
///
/// ```ignore
/// let address = stmt.join(
///     JoinSpec::left_outer(address_table.clone())
///         .from_primary(person.primary_key())
///         .on(address_table.mapping(["person_id"])),
/// )?;
/// ```
#[derive(Debug, Clone)]
pub struct JoinSpec {
    join_type: JoinType,
    table: Arc<Table>,
    alias: Option<String>,
    group: Option<String>,
    source: JoinSource,
    source_key: Option<Mapping>,
    target_key: Option<Mapping>,
    discriminators: Vec<Literal>,
    apply_to_unions: bool,
}

impl JoinSpec {
    fn new(join_type: JoinType, table: Arc<Table>) -> Self {
        Self {
            join_type,
            table,
            alias: None,
            group: None,
            source: JoinSource::Primary,
            source_key: None,
            target_key: None,
            discriminators: Vec::new(),
            apply_to_unions: true,
        }
    }

    pub fn inner(table: Arc<Table>) -> Self {
        Self::new(JoinType::Inner, table)
    }

    pub fn left_outer(table: Arc<Table>) -> Self {
        Self::new(JoinType::LeftOuter, table)
    }

    pub fn right_outer(table: Arc<Table>) -> Self {
        Self::new(JoinType::RightOuter, table)
    }

    /// Join from the table registered under `alias`, matching on `key`.
    pub fn from(mut self, alias: impl Into<String>, key: Mapping) -> Self {
        self.source = JoinSource::Alias(alias.into());
        self.source_key = Some(key);
        self
    }

    /// Join from the primary table, matching on `key`.
    pub fn from_primary(mut self, key: Mapping) -> Self {
        self.source = JoinSource::Primary;
        self.source_key = Some(key);
        self
    }

    /// Columns of the joined table matched against the source key.
    pub fn on(mut self, key: Mapping) -> Self {
        self.target_key = Some(key);
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Table group to register the joined table into. Auto-named when unset.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Restrict the join to rows whose discriminator has one of these values.
    pub fn discriminators<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Literal>,
    {
        self.discriminators = values.into_iter().map(Into::into).collect();
        self
    }

    /// Do not replay the join on union branches.
    pub fn local_only(mut self) -> Self {
        self.apply_to_unions = false;
        self
    }
}

impl Statement {
    /// Join a table and return its registered reference.
    ///
    /// Joining a table under an alias that already holds it is a no-op and logs a warning.
    /// Union branches register the join under the alias and group resolved here.
    pub fn join(&mut self, spec: JoinSpec) -> StmtResult<TableRef> {
        if let (Some(sk), Some(tk)) = (&spec.source_key, &spec.target_key) {
            if sk.is_empty() || tk.is_empty() {
                return Err(StmtError::MissingArgument("join key mapping"));
            }
            if sk.arity() != tk.arity() {
                return Err(StmtError::JoinArityMismatch {
                    source_arity: sk.arity(),
                    target_arity: tk.arity(),
                });
            }
            if tk.table() != spec.table.name() {
                return Err(StmtError::table_mismatch(spec.table.name(), tk.table()));
            }
        }

        let target = self.add_join(&spec)?;
        if spec.apply_to_unions && !self.unions.is_empty() {
            let resolved = JoinSpec {
                alias: Some(target.alias().to_string()),
                group: Some(target.group().to_string()),
                ..spec
            };
            for union in &mut self.unions {
                union.join(resolved.clone())?;
            }
        }
        Ok(target)
    }

    fn add_join(&mut self, spec: &JoinSpec) -> StmtResult<TableRef> {
        let source = match &spec.source {
            JoinSource::Primary => self.primary.clone(),
            JoinSource::Alias(alias) => self
                .registry
                .get(alias)
                .cloned()
                .ok_or_else(|| StmtError::UnknownAlias(alias.clone()))?,
        };

        let resolved = self.resolve_target(&spec.table, spec.alias.as_deref(), spec.group.as_deref())?;
        let target = match resolved {
            Registered::New(target) => target,
            Registered::Existing(target) => {
                tracing::warn!(
                    target: "sqlstmt",
                    alias = target.alias(),
                    table = target.table().name(),
                    "join to already registered table ignored"
                );
                return Ok(target);
            }
        };
        if spec.join_type == JoinType::RightOuter && !self.dialect.supports_right_outer_join() {
            return Err(StmtError::unsupported(format!(
                "RIGHT OUTER JOIN to {} ({})",
                spec.table.name(),
                self.dialect.name()
            )));
        }
        self.registry.insert(target.clone(), Some(spec.join_type));

        let mut condition = match (&spec.source_key, &spec.target_key) {
            (Some(sk), Some(tk)) => {
                Some(SqlExpr::mapping(&source, sk).eq(&SqlExpr::mapping(&target, tk)))
            }
            _ => None,
        };
        if let Some(disc) = target.table().discriminator() {
            if !spec.discriminators.is_empty() {
                let column = SqlExpr::column(&target, disc);
                let any = BoolExpr::any(
                    spec.discriminators
                        .iter()
                        .map(|v| column.eq_literal(v.clone()))
                        .collect(),
                )
                .paren();
                condition = Some(match condition {
                    Some(cond) => cond.and(any),
                    None => any,
                });
            }
        }

        if self.dialect.supports_ansi_join_syntax() {
            if !self.is_placeable(&source) {
                self.requires_reorder = true;
            }
            self.joins.push(Join {
                join_type: spec.join_type,
                target: target.clone(),
                source: Some(source),
                condition,
            });
        } else {
            self.joins.push(Join {
                join_type: JoinType::NonAnsi,
                target: target.clone(),
                source: Some(source),
                condition: None,
            });
            if let Some(cond) = condition {
                self.where_and(cond, false);
            }
        }
        self.invalidate();
        Ok(target)
    }

    /// Cross join a table, on this statement and every union branch.
    pub fn cross_join(
        &mut self,
        table: Arc<Table>,
        alias: Option<&str>,
        group: Option<&str>,
    ) -> StmtResult<TableRef> {
        let target = match self.resolve_target(&table, alias, group)? {
            Registered::New(target) => {
                self.registry.insert(target.clone(), Some(JoinType::Cross));
                self.joins.push(Join {
                    join_type: JoinType::Cross,
                    target: target.clone(),
                    source: None,
                    condition: None,
                });
                self.invalidate();
                target
            }
            Registered::Existing(target) => target,
        };
        for union in &mut self.unions {
            union.cross_join(table.clone(), Some(target.alias()), Some(target.group()))?;
        }
        Ok(target)
    }

    /// Remove the cross join to `alias`, on this statement and every union branch.
    ///
    /// Returns the removed alias, or `None` when no cross join targets it.
    pub fn remove_cross_join(&mut self, alias: &str) -> Option<String> {
        for union in &mut self.unions {
            union.remove_cross_join(alias);
        }
        let pos = self
            .joins
            .iter()
            .position(|j| j.join_type == JoinType::Cross && j.target.alias() == alias)?;
        let removed = self.joins.remove(pos);
        self.registry.remove(removed.target.alias());
        self.requires_reorder = true;
        self.invalidate();
        Some(removed.target.alias().to_string())
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn number_of_joins(&self) -> usize {
        self.joins.len()
    }

    /// The join targeting the table registered under `alias`.
    pub fn join_for(&self, alias: &str) -> Option<&Join> {
        self.joins.iter().find(|j| j.target.alias() == alias)
    }

    pub fn join_type_for(&self, alias: &str) -> Option<JoinType> {
        self.join_for(alias).map(Join::join_type)
    }

    /// Order the joins so each one follows the table it joins from.
    ///
    /// Only runs when a join was added out of order or a cross join was removed.
    pub fn reorder_joins(&mut self) -> StmtResult<()> {
        if !self.requires_reorder {
            return Ok(());
        }
        let mut known: Vec<Join> = Vec::with_capacity(self.joins.len());
        let mut pending = std::mem::take(&mut self.joins);
        while !pending.is_empty() {
            let before = pending.len();
            let mut remaining = Vec::new();
            for join in pending {
                let placeable = join.join_type.is_order_independent()
                    || match &join.source {
                        None => true,
                        Some(src) => {
                            !self.is_local_join_source(src) || known.iter().any(|k| k.target == *src)
                        }
                    };
                if placeable {
                    known.push(join);
                } else {
                    remaining.push(join);
                }
            }
            if remaining.len() == before {
                let names: Vec<String> = remaining
                    .iter()
                    .map(|j| {
                        let from = j.source.as_ref().map(TableRef::alias).unwrap_or("?");
                        format!("{} -> {}", from, j.target.alias())
                    })
                    .collect();
                known.extend(remaining);
                self.joins = known;
                return Err(StmtError::CircularJoins(names.join(", ")));
            }
            pending = remaining;
        }
        self.joins = known;
        self.requires_reorder = false;
        Ok(())
    }

    /// Whether a join from `source` has to follow another join of this statement.
    ///
    /// The primary table and tables of an enclosing statement are always in scope.
    fn is_local_join_source(&self, source: &TableRef) -> bool {
        *source != self.primary && self.registry.get(source.alias()) == Some(source)
    }

    /// Whether a join from `source` can be appended without reordering.
    fn is_placeable(&self, source: &TableRef) -> bool {
        !self.is_local_join_source(source) || self.joins.iter().any(|j| j.target == *source)
    }

    /// Resolve the alias and group a joined table would get, without registering it.
    fn resolve_target(
        &self,
        table: &Arc<Table>,
        alias: Option<&str>,
        group: Option<&str>,
    ) -> StmtResult<Registered> {
        let group = group
            .map(str::to_string)
            .unwrap_or_else(|| self.registry.next_group_name());
        let alias = match alias {
            Some(alias) => alias.to_string(),
            None => {
                let cx = NamingContext::new(&self.registry, self.subquery_depth());
                self.namer.alias_for_table(&cx, table, &group)
            }
        };
        if let Some(existing) = self.registry.get(&alias) {
            if existing.table().name() == table.name() {
                return Ok(Registered::Existing(existing.clone()));
            }
            return Err(StmtError::DuplicateAlias {
                alias,
                table: existing.table().name().to_string(),
            });
        }
        Ok(Registered::New(TableRef::new(table.clone(), alias, group)))
    }

    /// Append an already-built join, registering its target.
    pub(crate) fn push_join(&mut self, join: Join) {
        self.registry.insert(join.target.clone(), Some(join.join_type));
        if let Some(src) = &join.source {
            if !join.join_type.is_order_independent() && !self.is_placeable(src) {
                self.requires_reorder = true;
            }
        }
        self.joins.push(join);
        self.invalidate();
    }
}

enum Registered {
    New(TableRef),
    Existing(TableRef),
}
