use super::lock::{self, LockShape};
use super::order::order_by_clause;
use super::paginate::{self, Pagination};
use super::{Framing, Statement};
use crate::error::StmtResult;
use crate::expr::BoolExpr;

impl Statement {
    /// Render the SELECT text, reusing the cached text when nothing changed.
    pub fn select_sql(&mut self) -> StmtResult<String> {
        if let Some(sql) = self.cached(Framing::Select) {
            return Ok(sql);
        }
        self.reorder_joins()?;
        let sql = self.build_select()?;
        self.cache = Some((Framing::Select, sql.clone()));
        Ok(sql)
    }

    /// Render the UPDATE text.
    ///
    /// Joins are rewritten into `WHERE EXISTS (...)`, see [`delete_sql`](Self::delete_sql).
    pub fn update_sql(&mut self) -> StmtResult<String> {
        if let Some(sql) = self.cached(Framing::Update) {
            return Ok(sql);
        }
        self.reorder_joins()?;
        let set_clause = self
            .updates
            .iter()
            .map(|(column, value)| {
                let target = if column.is_single_column() {
                    column
                        .text()
                        .split_once('.')
                        .map_or(column.text(), |(_, name)| name)
                } else {
                    column.text()
                };
                format!("{} = {}", target, value.text())
            })
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = self
            .dialect
            .update_statement(&self.primary, &format!("SET {set_clause}"));
        if let Some(filter) = self.single_table_filter()? {
            sql.push_str(" WHERE ");
            sql.push_str(&filter.to_sql());
        }
        self.cache = Some((Framing::Update, sql.clone()));
        Ok(sql)
    }

    /// Render the DELETE text.
    ///
    /// When tables are joined the statement becomes single-table: the first
    /// joined table moves into an `EXISTS` subquery carrying its join condition,
    /// the original WHERE clause and every remaining join.
    pub fn delete_sql(&mut self) -> StmtResult<String> {
        if let Some(sql) = self.cached(Framing::Delete) {
            return Ok(sql);
        }
        self.reorder_joins()?;
        let mut sql = self.dialect.delete_statement(&self.primary);
        if let Some(filter) = self.single_table_filter()? {
            sql.push_str(" WHERE ");
            sql.push_str(&filter.to_sql());
        }
        self.cache = Some((Framing::Delete, sql.clone()));
        Ok(sql)
    }

    /// Log the rendered statement and its table groups at debug level.
    pub fn log_statement(&mut self) -> StmtResult<()> {
        let sql = if self.has_updates() {
            self.update_sql()?
        } else {
            self.select_sql()?
        };
        tracing::debug!(target: "sqlstmt.sql", sql = %sql, "statement");
        for group in self.registry.groups() {
            tracing::debug!(target: "sqlstmt.sql", group = %group, "table group");
        }
        Ok(())
    }

    fn build_select(&mut self) -> StmtResult<String> {
        let lock_requested = self.options.lock_for_update;
        let order_keys = self.prepare_ordering();

        let dialect = self.dialect.clone();
        let pagination = paginate::strategy(dialect.as_ref(), self.range);

        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }

        if self.selected.is_empty() {
            match pagination {
                Pagination::SingleNested(rownum) => {
                    sql.push_str(&format!("{}.*, {rownum} rn", self.primary.alias()));
                }
                _ => sql.push('*'),
            }
        } else {
            let all_aliased = matches!(pagination, Pagination::DoubleNested(_));
            let mut auto_alias = 0;
            let mut columns = Vec::with_capacity(self.selected.len() + 1);
            for item in &self.selected {
                let column = match item.alias() {
                    Some(alias) => format!("{} AS {}", item.sql(), alias),
                    None if all_aliased => {
                        auto_alias += 1;
                        format!("{} AS DN_{}", item.sql(), auto_alias - 1)
                    }
                    None => item.sql().to_string(),
                };
                columns.push(column);
            }
            if let Pagination::SingleNested(rownum) = pagination {
                columns.push(format!("{rownum} rn"));
            }
            sql.push_str(&columns.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&self.primary.to_string());
        if let Some(hint) = lock::from_hint(dialect.as_ref(), lock_requested) {
            sql.push_str(" WITH ");
            sql.push_str(hint);
        }
        let join_hint = lock::join_hint(dialect.as_ref(), lock_requested);
        for join in &self.joins {
            sql.push_str(&join.to_sql(dialect.as_ref(), join_hint));
        }

        if let Some(filter) = &self.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(&filter.to_sql());
        }

        if self.aggregated {
            if let Some(group_by) = self.group_by_clause() {
                sql.push_str(" GROUP BY ");
                sql.push_str(&group_by);
            }
        }

        if let Some(having) = &self.having {
            sql.push_str(" HAVING ");
            sql.push_str(&having.to_sql());
        }

        if !self.unions.is_empty() {
            let keyword = if dialect.use_union_all() { " UNION ALL " } else { " UNION " };
            for union in &mut self.unions {
                sql.push_str(keyword);
                sql.push_str(&union.select_sql()?);
            }
        }

        let order_by = order_by_clause(dialect.as_ref(), &order_keys);
        if let Some(order_by) = &order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }

        if pagination == Pagination::Trailing {
            let clause =
                dialect.range_clause(self.range.offset, self.range.count, order_by.is_some());
            if let Some(clause) = clause.filter(|c| !c.is_empty()) {
                sql.push(' ');
                sql.push_str(&clause);
            }
        }

        let shape = LockShape {
            distinct: self.distinct,
            grouping: !self.grouping.is_empty(),
            having: self.having.is_some(),
            ordering: self.ordering.is_some(),
            joins: !self.joins.is_empty(),
        };
        if let Some(clause) = lock::for_update_clause(
            dialect.as_ref(),
            shape,
            lock_requested,
            self.options.for_update_nowait,
        ) {
            sql.push(' ');
            sql.push_str(&clause);
        }

        Ok(match pagination {
            Pagination::DoubleNested(rownum) => {
                paginate::wrap_double_nested(&sql, rownum, self.range)
            }
            Pagination::SingleNested(_) => {
                paginate::wrap_single_nested(&sql, &self.selected, self.range)
            }
            Pagination::Unrestricted | Pagination::Trailing => sql,
        })
    }

    /// GROUP BY items: grouping expressions, deduplicated, then any primary
    /// selected item missing from them when the dialect requires it.
    ///
    /// `None` without grouping expressions, even for aggregated statements.
    fn group_by_clause(&self) -> Option<String> {
        if self.grouping.is_empty() {
            return None;
        }
        let mut items: Vec<&str> = Vec::new();
        for expr in &self.grouping {
            if !items.contains(&expr.text()) {
                items.push(expr.text());
            }
        }
        if self.dialect.group_by_requires_all_select_primaries() {
            for item in self.selected.iter().filter(|i| i.is_primary()) {
                if !items.contains(&item.sql()) {
                    items.push(item.sql());
                }
            }
        }
        (!items.is_empty()).then(|| items.join(", "))
    }

    /// WHERE clause of an UPDATE/DELETE, moving joined tables into `EXISTS`.
    fn single_table_filter(&self) -> StmtResult<Option<BoolExpr>> {
        let Some((first, rest)) = self.joins.split_first() else {
            return Ok(self.where_clause.clone());
        };

        let mut sub = self
            .subquery(first.target().table().clone())
            .alias(first.target().alias())
            .group(first.target().group())
            .build()?;
        if let Some(cond) = first.condition() {
            sub.where_and(cond.clone(), false);
        }
        if let Some(filter) = &self.where_clause {
            sub.where_and(filter.clone(), false);
        }
        for join in rest {
            sub.push_join(join.clone());
        }
        Ok(Some(BoolExpr::exists(sub.select_sql()?)))
    }
}
