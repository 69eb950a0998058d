use super::Statement;
use crate::error::{StmtError, StmtResult};
use crate::expr::SqlExpr;
use crate::table::{Column, Mapping, TableRef};

/// One entry of the select list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedItem {
    sql: String,
    alias: Option<String>,
    primary: bool,
}

impl SelectedItem {
    pub(crate) fn new(sql: impl Into<String>, alias: Option<String>, primary: bool) -> Self {
        Self {
            sql: sql.into(),
            alias,
            primary,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Whether the item is a directly addressable column rather than a derived value.
    pub fn is_primary(&self) -> bool {
        self.primary
    }
}

impl Statement {
    /// Select an expression and return its 1-based positions, one per column.
    ///
    /// Multi-column expressions are aliased `{alias}{i}`.
    pub fn select(
        &mut self,
        expr: &SqlExpr,
        alias: Option<&str>,
        apply_to_unions: bool,
    ) -> StmtResult<Vec<usize>> {
        if expr.is_empty() {
            return Err(StmtError::MissingArgument("expression"));
        }
        if apply_to_unions {
            for union in &mut self.unions {
                union.select(expr, alias, true)?;
            }
        }

        if expr.is_aggregate() {
            self.aggregated = true;
        }
        let primary = !expr.is_aggregate() && expr.has_source_table();
        let positions = if expr.arity() == 1 {
            vec![self.select_item(expr.text(), alias.map(str::to_string), primary)]
        } else {
            expr.components()
                .enumerate()
                .map(|(i, c)| {
                    let alias = alias.map(|a| format!("{a}{i}"));
                    self.select_item(c.text(), alias, primary)
                })
                .collect()
        };
        self.invalidate();
        Ok(positions)
    }

    /// Select every column of `mapping` and return their 1-based positions.
    ///
    /// `table` defaults to the primary table and must own the mapping.
    /// Multi-column mappings are aliased `{alias}_{i}`.
    pub fn select_mapping(
        &mut self,
        table: Option<&TableRef>,
        mapping: &Mapping,
        alias: Option<&str>,
        apply_to_unions: bool,
    ) -> StmtResult<Vec<usize>> {
        if mapping.is_empty() {
            return Err(StmtError::MissingArgument("mapping"));
        }
        let table = table.cloned().unwrap_or_else(|| self.primary.clone());
        if mapping.table() != table.table().name() {
            return Err(StmtError::table_mismatch(table.table().name(), mapping.table()));
        }
        if apply_to_unions {
            for union in &mut self.unions {
                union.select_mapping(Some(&table), mapping, alias, true)?;
            }
        }

        let multi = mapping.arity() > 1;
        let positions = mapping
            .columns()
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let alias = match alias {
                    Some(a) if multi => Some(format!("{a}_{i}")),
                    Some(a) => Some(a.to_string()),
                    None => None,
                };
                let sql = format!("{}.{}", table.alias(), column);
                self.select_item(&sql, alias, true)
            })
            .collect();
        Ok(positions)
    }

    /// Select a single column and return its 1-based position.
    pub fn select_column(
        &mut self,
        table: Option<&TableRef>,
        column: &Column,
        alias: Option<&str>,
        apply_to_unions: bool,
    ) -> StmtResult<usize> {
        if column.name().is_empty() {
            return Err(StmtError::MissingArgument("column"));
        }
        let mapping = Mapping::from(column.clone());
        self.select_mapping(table, &mapping, alias, apply_to_unions)?
            .into_iter()
            .next()
            .ok_or(StmtError::MissingArgument("column"))
    }

    pub fn selected_items(&self) -> &[SelectedItem] {
        &self.selected
    }

    pub fn number_of_selects(&self) -> usize {
        self.selected.len()
    }

    /// Add an item unless the same SQL is already selected; return its 1-based position.
    pub(crate) fn select_item(&mut self, sql: &str, alias: Option<String>, primary: bool) -> usize {
        if let Some(pos) = self
            .selected
            .iter()
            .position(|i| i.sql == sql && i.alias == alias)
        {
            return pos + 1;
        }
        if let Some(pos) = self.selected.iter().position(|i| i.sql == sql) {
            return pos + 1;
        }
        self.selected.push(SelectedItem::new(sql, alias, primary));
        self.invalidate();
        self.selected.len()
    }

    /// [`select_item`](Self::select_item) on this statement and every union branch.
    pub(crate) fn select_item_everywhere(
        &mut self,
        sql: &str,
        alias: Option<String>,
        primary: bool,
    ) -> usize {
        for union in &mut self.unions {
            union.select_item_everywhere(sql, alias.clone(), primary);
        }
        self.select_item(sql, alias, primary)
    }
}
