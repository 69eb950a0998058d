use super::Statement;
use crate::dialect::Dialect;
use crate::error::{StmtError, StmtResult};
use crate::expr::SqlExpr;

/// Where NULLs sort relative to other values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrdering {
    NullsFirst,
    NullsLast,
}

impl NullOrdering {
    fn keyword(self) -> &'static str {
        match self {
            NullOrdering::NullsFirst => "NULLS FIRST",
            NullOrdering::NullsLast => "NULLS LAST",
        }
    }
}

/// ORDER BY expressions with their directions and null orderings.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSpec {
    expressions: Vec<SqlExpr>,
    descending: Vec<bool>,
    nulls: Option<Vec<Option<NullOrdering>>>,
}

impl OrderSpec {
    pub fn expressions(&self) -> &[SqlExpr] {
        &self.expressions
    }

    pub fn descending(&self) -> &[bool] {
        &self.descending
    }

    fn nulls_at(&self, i: usize) -> Option<NullOrdering> {
        self.nulls.as_ref().and_then(|n| n.get(i).copied().flatten())
    }
}

/// How ordering keys reach the ORDER BY clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderMode {
    /// `ORDER BY 2, 3` on select-list positions.
    Positional,
    /// Ordering columns selected under `NUCORDER{i}` aliases.
    Aliased,
    /// Expressions rendered in place.
    Direct,
}

/// One rendered ORDER BY component.
#[derive(Debug, Clone)]
pub(crate) struct OrderKey {
    name: String,
    expr: SqlExpr,
    descending: bool,
    nulls: Option<NullOrdering>,
    positional: bool,
}

impl Statement {
    /// Set the ordering. Lengths of all supplied sequences must match.
    ///
    /// An empty expression list clears the ordering.
    pub fn set_ordering(
        &mut self,
        expressions: Vec<SqlExpr>,
        descending: Vec<bool>,
        nulls: Option<Vec<Option<NullOrdering>>>,
    ) -> StmtResult<()> {
        let nulls_len = nulls.as_ref().map_or(expressions.len(), Vec::len);
        if expressions.len() != descending.len() || expressions.len() != nulls_len {
            return Err(StmtError::OrderingLengthMismatch {
                expressions: expressions.len(),
                directions: descending.len(),
                nulls: nulls_len,
            });
        }
        if expressions.iter().any(SqlExpr::is_empty) {
            return Err(StmtError::MissingArgument("ordering expression"));
        }
        self.ordering = if expressions.is_empty() {
            None
        } else {
            Some(OrderSpec {
                expressions,
                descending,
                nulls,
            })
        };
        self.invalidate();
        Ok(())
    }

    pub fn clear_ordering(&mut self) {
        self.ordering = None;
        self.invalidate();
    }

    pub fn ordering(&self) -> Option<&OrderSpec> {
        self.ordering.as_ref()
    }

    fn order_mode(&self) -> OrderMode {
        if self.is_subquery() {
            OrderMode::Direct
        } else if self.dialect.order_by_using_select_index() {
            OrderMode::Positional
        } else if self.dialect.include_order_by_columns_in_select() && !self.aggregated {
            OrderMode::Aliased
        } else {
            OrderMode::Direct
        }
    }

    /// Add the columns ordering needs to the select list and return the ORDER BY keys.
    ///
    /// Injected columns are also selected on every union branch.
    pub(crate) fn prepare_ordering(&mut self) -> Vec<OrderKey> {
        let Some(spec) = self.ordering.clone() else {
            return Vec::new();
        };
        let mode = self.order_mode();
        let aggregated = self.aggregated;
        let mut keys = Vec::new();

        for (i, expr) in spec.expressions.iter().enumerate() {
            let descending = spec.descending[i];
            let nulls = spec.nulls_at(i);
            let key = |name: String, expr: &SqlExpr, positional: bool| OrderKey {
                name,
                expr: expr.clone(),
                descending,
                nulls,
                positional,
            };

            if expr.is_result_alias() && mode != OrderMode::Positional {
                keys.push(key(expr.text().to_string(), expr, false));
                continue;
            }
            match mode {
                OrderMode::Positional => {
                    for c in expr.components() {
                        let pos = self.select_item_everywhere(c.text(), None, !aggregated);
                        keys.push(key(pos.to_string(), c, true));
                    }
                }
                OrderMode::Aliased => {
                    let multi = expr.arity() > 1;
                    for (j, c) in expr.components().enumerate() {
                        let alias = if multi {
                            format!("NUCORDER{i}_{j}")
                        } else {
                            format!("NUCORDER{i}")
                        };
                        let pos = self.select_item_everywhere(c.text(), Some(alias), true);
                        // An already selected column keeps its own alias, or none.
                        let name = self.selected[pos - 1]
                            .alias()
                            .unwrap_or(c.text())
                            .to_string();
                        keys.push(key(name, c, false));
                    }
                }
                OrderMode::Direct => {
                    for c in expr.components() {
                        keys.push(key(c.text().to_string(), c, false));
                    }
                }
            }
        }
        keys
    }
}

/// Render ORDER BY components, emulating null ordering where the dialect allows.
pub(crate) fn order_by_clause(dialect: &dyn Dialect, keys: &[OrderKey]) -> Option<String> {
    if keys.is_empty() {
        return None;
    }
    let parts: Vec<String> = keys
        .iter()
        .map(|k| order_component(dialect, k))
        .collect();
    Some(parts.join(", "))
}

fn order_component(dialect: &dyn Dialect, key: &OrderKey) -> String {
    let native = dialect.supports_nulls_directive();
    if key.nulls.is_some()
        && !native
        && !dialect.nulls_ordering_using_isnull()
        && !dialect.nulls_ordering_using_column_is_null()
    {
        tracing::warn!(
            target: "sqlstmt",
            dialect = dialect.name(),
            key = %key.name,
            "null ordering requested but not supported by dialect, ignoring"
        );
    }

    let name = if key.positional {
        key.name.clone()
    } else {
        dialect.order_string(&key.name, &key.expr)
    };
    let mut sql = String::new();
    if key.nulls == Some(NullOrdering::NullsLast)
        && !native
        && !key.positional
        && key.expr.is_single_column()
    {
        if dialect.nulls_ordering_using_isnull() {
            sql.push_str(&format!("ISNULL({name}), "));
        } else if dialect.nulls_ordering_using_column_is_null() {
            sql.push_str(&format!("{name} IS NULL, "));
        }
    }
    sql.push_str(&name);
    if key.descending {
        sql.push_str(" DESC");
    }
    if let Some(nulls) = key.nulls {
        if native {
            sql.push(' ');
            sql.push_str(nulls.keyword());
        }
    }
    sql
}
