//! Dialect capabilities consulted while rendering statements.
//!
//! The builder never branches on a database name; it asks the [`Dialect`]
//! whether a construct is supported and for the text fragments that differ
//! between products. [`Capabilities`] is a data-driven implementation that can
//! be built from a preset or deserialized from TOML.

use std::fmt;

use serde::Deserialize;

use crate::error::{StmtError, StmtResult};
use crate::expr::SqlExpr;
use crate::table::TableRef;

/// Capability checks and syntax fragments for one database product.
pub trait Dialect: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// `FROM a JOIN b ON ...` rather than comma-joined tables.
    fn supports_ansi_join_syntax(&self) -> bool;
    /// `CROSS JOIN`
    fn supports_ansi_cross_join_syntax(&self) -> bool;
    /// Render cross joins as `INNER JOIN t ON 1=1`.
    fn cross_join_as_inner(&self) -> bool;
    fn supports_right_outer_join(&self) -> bool;
    fn supports_union_syntax(&self) -> bool;
    /// Combine branches with `UNION ALL` rather than `UNION`.
    fn use_union_all(&self) -> bool;

    /// `ORDER BY 1, 2` addressing select-list positions.
    fn order_by_using_select_index(&self) -> bool;
    /// Ordering expressions must also appear in the select list.
    fn include_order_by_columns_in_select(&self) -> bool;
    /// Native `NULLS FIRST` / `NULLS LAST`.
    fn supports_nulls_directive(&self) -> bool;
    /// Emulate nulls-last with a leading `ISNULL(x)` key.
    fn nulls_ordering_using_isnull(&self) -> bool;
    /// Emulate nulls-last with a leading `x IS NULL` key.
    fn nulls_ordering_using_column_is_null(&self) -> bool;
    /// Every primary selected column must appear in `GROUP BY`.
    fn group_by_requires_all_select_primaries(&self) -> bool;

    /// Locking via a trailing `FOR UPDATE` clause.
    fn lock_with_select_for_update(&self) -> bool;
    /// Locking via a `WITH (...)` hint after the primary table.
    fn lock_placed_after_from(&self) -> bool;
    /// Locking via a `WITH (...)` hint on every joined table.
    fn lock_placed_within_join(&self) -> bool;
    fn lock_with_distinct(&self) -> bool;
    fn lock_with_grouping(&self) -> bool;
    fn lock_with_having(&self) -> bool;
    fn lock_with_ordering(&self) -> bool;
    fn lock_with_multiple_tables(&self) -> bool;
    fn supports_for_update_nowait(&self) -> bool;

    /// Row-number expression selected inline as `rn`, filtered from a single wrapping query.
    fn row_number_column(&self) -> Option<&str>;
    /// Row-number expression applied from a doubly nested wrapping query.
    fn nested_row_number_column(&self) -> Option<&str>;
    /// Trailing pagination clause, without a leading space.
    fn range_clause(&self, offset: Option<u64>, count: Option<u64>, has_order_by: bool)
    -> Option<String>;

    /// Text appended after the statement to lock the selected rows.
    fn select_for_update_text(&self) -> &str;
    /// Hint placed after `WITH` when locking is expressed on tables.
    fn lock_option_text(&self) -> &str;

    /// `UPDATE` skeleton around the primary table and its rendered `SET` list.
    fn update_statement(&self, table: &TableRef, set_clause: &str) -> String {
        format!("UPDATE {} {}", table, set_clause)
    }

    /// `DELETE` skeleton around the primary table.
    fn delete_statement(&self, table: &TableRef) -> String {
        format!("DELETE FROM {}", table)
    }

    /// Text used in `ORDER BY` for a named ordering key.
    fn order_string(&self, name: &str, _expr: &SqlExpr) -> String {
        name.to_string()
    }
}

/// How a dialect renders a trailing pagination clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeStyle {
    /// No trailing clause; pagination uses a row-number rewrite or is unavailable.
    None,
    /// `LIMIT c OFFSET o`
    #[default]
    LimitOffset,
    /// `OFFSET o ROWS FETCH NEXT c ROWS ONLY`
    OffsetFetch,
    /// `OFFSET ... FETCH` that is only valid after an `ORDER BY`.
    OffsetFetchRequiresOrder,
}

/// Lock-related capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LockCapabilities {
    pub select_for_update: bool,
    pub placed_after_from: bool,
    pub placed_within_join: bool,
    pub with_distinct: bool,
    pub with_grouping: bool,
    pub with_having: bool,
    pub with_ordering: bool,
    pub with_multiple_tables: bool,
    pub nowait: bool,
    pub for_update_text: String,
    pub option_text: String,
}

impl Default for LockCapabilities {
    fn default() -> Self {
        Self {
            select_for_update: true,
            placed_after_from: false,
            placed_within_join: false,
            with_distinct: false,
            with_grouping: false,
            with_having: false,
            with_ordering: true,
            with_multiple_tables: true,
            nowait: false,
            for_update_text: "FOR UPDATE".to_string(),
            option_text: String::new(),
        }
    }
}

/// Data-driven [`Dialect`].
///
/// Missing keys in TOML fall back to the `ansi` preset.
///
/// ```toml
/// name = "acme"
/// right_outer_join = false
/// range = "offset_fetch"
///
/// [lock]
/// nowait = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub name: String,
    pub ansi_join_syntax: bool,
    pub ansi_cross_join_syntax: bool,
    pub cross_join_as_inner: bool,
    pub right_outer_join: bool,
    pub union_syntax: bool,
    pub union_all: bool,
    pub order_by_select_index: bool,
    pub include_order_by_columns_in_select: bool,
    pub nulls_directive: bool,
    pub nulls_using_isnull: bool,
    pub nulls_using_column_is_null: bool,
    pub group_by_requires_all_select_primaries: bool,
    pub row_number_column: Option<String>,
    pub nested_row_number_column: Option<String>,
    pub range: RangeStyle,
    pub lock: LockCapabilities,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::ansi()
    }
}

impl Capabilities {
    /// Standard SQL with `LIMIT`/`OFFSET` pagination.
    pub fn ansi() -> Self {
        Self {
            name: "ansi".to_string(),
            ansi_join_syntax: true,
            ansi_cross_join_syntax: true,
            cross_join_as_inner: false,
            right_outer_join: true,
            union_syntax: true,
            union_all: true,
            order_by_select_index: false,
            include_order_by_columns_in_select: false,
            nulls_directive: false,
            nulls_using_isnull: false,
            nulls_using_column_is_null: false,
            group_by_requires_all_select_primaries: false,
            row_number_column: None,
            nested_row_number_column: None,
            range: RangeStyle::LimitOffset,
            lock: LockCapabilities::default(),
        }
    }

    pub fn postgresql() -> Self {
        Self {
            name: "postgresql".to_string(),
            nulls_directive: true,
            include_order_by_columns_in_select: true,
            group_by_requires_all_select_primaries: true,
            lock: LockCapabilities {
                nowait: true,
                ..LockCapabilities::default()
            },
            ..Self::ansi()
        }
    }

    pub fn mysql() -> Self {
        Self {
            name: "mysql".to_string(),
            ansi_cross_join_syntax: false,
            cross_join_as_inner: true,
            nulls_using_isnull: true,
            lock: LockCapabilities {
                with_distinct: true,
                with_grouping: true,
                with_having: true,
                ..LockCapabilities::default()
            },
            ..Self::ansi()
        }
    }

    /// Pagination through a doubly nested `ROWNUM` query.
    pub fn oracle() -> Self {
        Self {
            name: "oracle".to_string(),
            nulls_directive: true,
            group_by_requires_all_select_primaries: true,
            nested_row_number_column: Some("ROWNUM".to_string()),
            range: RangeStyle::None,
            lock: LockCapabilities {
                with_ordering: true,
                with_multiple_tables: true,
                nowait: true,
                ..LockCapabilities::default()
            },
            ..Self::ansi()
        }
    }

    /// Pagination through an inline `ROW_NUMBER()` column.
    pub fn db2() -> Self {
        Self {
            name: "db2".to_string(),
            order_by_select_index: false,
            include_order_by_columns_in_select: true,
            nulls_using_column_is_null: true,
            row_number_column: Some("ROW_NUMBER() OVER()".to_string()),
            range: RangeStyle::None,
            ..Self::ansi()
        }
    }

    /// Table hints for locking and `OFFSET ... FETCH` after `ORDER BY`.
    pub fn sqlserver() -> Self {
        Self {
            name: "sqlserver".to_string(),
            include_order_by_columns_in_select: true,
            nulls_using_column_is_null: true,
            range: RangeStyle::OffsetFetchRequiresOrder,
            lock: LockCapabilities {
                select_for_update: false,
                placed_after_from: true,
                placed_within_join: true,
                with_ordering: true,
                with_multiple_tables: true,
                for_update_text: String::new(),
                option_text: "(UPDLOCK, ROWLOCK)".to_string(),
                ..LockCapabilities::default()
            },
            ..Self::ansi()
        }
    }

    /// Comma-joined tables with join conditions in `WHERE`, positional ordering.
    pub fn legacy() -> Self {
        Self {
            name: "legacy".to_string(),
            ansi_join_syntax: false,
            ansi_cross_join_syntax: false,
            right_outer_join: false,
            union_all: false,
            order_by_select_index: true,
            range: RangeStyle::None,
            lock: LockCapabilities {
                with_multiple_tables: false,
                with_ordering: false,
                ..LockCapabilities::default()
            },
            ..Self::ansi()
        }
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> StmtResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ansi" => Ok(Self::ansi()),
            "postgresql" | "postgres" => Ok(Self::postgresql()),
            "mysql" => Ok(Self::mysql()),
            "oracle" => Ok(Self::oracle()),
            "db2" => Ok(Self::db2()),
            "sqlserver" | "mssql" => Ok(Self::sqlserver()),
            "legacy" => Ok(Self::legacy()),
            other => Err(StmtError::config(format!("unknown dialect preset '{other}'"))),
        }
    }

    /// Parse capabilities from TOML text.
    pub fn from_toml_str(raw: &str) -> StmtResult<Self> {
        Ok(toml::from_str(raw)?)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl Dialect for Capabilities {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_ansi_join_syntax(&self) -> bool {
        self.ansi_join_syntax
    }

    fn supports_ansi_cross_join_syntax(&self) -> bool {
        self.ansi_cross_join_syntax
    }

    fn cross_join_as_inner(&self) -> bool {
        self.cross_join_as_inner
    }

    fn supports_right_outer_join(&self) -> bool {
        self.right_outer_join
    }

    fn supports_union_syntax(&self) -> bool {
        self.union_syntax
    }

    fn use_union_all(&self) -> bool {
        self.union_all
    }

    fn order_by_using_select_index(&self) -> bool {
        self.order_by_select_index
    }

    fn include_order_by_columns_in_select(&self) -> bool {
        self.include_order_by_columns_in_select
    }

    fn supports_nulls_directive(&self) -> bool {
        self.nulls_directive
    }

    fn nulls_ordering_using_isnull(&self) -> bool {
        self.nulls_using_isnull
    }

    fn nulls_ordering_using_column_is_null(&self) -> bool {
        self.nulls_using_column_is_null
    }

    fn group_by_requires_all_select_primaries(&self) -> bool {
        self.group_by_requires_all_select_primaries
    }

    fn lock_with_select_for_update(&self) -> bool {
        self.lock.select_for_update
    }

    fn lock_placed_after_from(&self) -> bool {
        self.lock.placed_after_from
    }

    fn lock_placed_within_join(&self) -> bool {
        self.lock.placed_within_join
    }

    fn lock_with_distinct(&self) -> bool {
        self.lock.with_distinct
    }

    fn lock_with_grouping(&self) -> bool {
        self.lock.with_grouping
    }

    fn lock_with_having(&self) -> bool {
        self.lock.with_having
    }

    fn lock_with_ordering(&self) -> bool {
        self.lock.with_ordering
    }

    fn lock_with_multiple_tables(&self) -> bool {
        self.lock.with_multiple_tables
    }

    fn supports_for_update_nowait(&self) -> bool {
        self.lock.nowait
    }

    fn row_number_column(&self) -> Option<&str> {
        non_empty(&self.row_number_column)
    }

    fn nested_row_number_column(&self) -> Option<&str> {
        non_empty(&self.nested_row_number_column)
    }

    fn range_clause(
        &self,
        offset: Option<u64>,
        count: Option<u64>,
        has_order_by: bool,
    ) -> Option<String> {
        let offset = offset.filter(|o| *o > 0);
        if offset.is_none() && count.is_none() {
            return None;
        }
        match self.range {
            RangeStyle::None => None,
            RangeStyle::LimitOffset => {
                let mut parts = Vec::new();
                if let Some(c) = count {
                    parts.push(format!("LIMIT {c}"));
                }
                if let Some(o) = offset {
                    parts.push(format!("OFFSET {o}"));
                }
                Some(parts.join(" "))
            }
            RangeStyle::OffsetFetch => {
                let mut parts = Vec::new();
                if let Some(o) = offset {
                    parts.push(format!("OFFSET {o} ROWS"));
                }
                if let Some(c) = count {
                    let first = if offset.is_some() { "NEXT" } else { "FIRST" };
                    parts.push(format!("FETCH {first} {c} ROWS ONLY"));
                }
                Some(parts.join(" "))
            }
            RangeStyle::OffsetFetchRequiresOrder => {
                let mut sql = String::new();
                if !has_order_by {
                    sql.push_str("ORDER BY (SELECT NULL) ");
                }
                sql.push_str(&format!("OFFSET {} ROWS", offset.unwrap_or(0)));
                if let Some(c) = count {
                    sql.push_str(&format!(" FETCH NEXT {c} ROWS ONLY"));
                }
                Some(sql)
            }
        }
    }

    fn select_for_update_text(&self) -> &str {
        &self.lock.for_update_text
    }

    fn lock_option_text(&self) -> &str {
        &self.lock.option_text
    }
}
