//! Row-range strategies.
//!
//! A dialect paginates in exactly one way: a trailing clause it renders itself,
//! a doubly nested query filtering an outer row number, or a single wrapping
//! query filtering a row-number column selected inline.

use crate::dialect::Dialect;

use super::SelectedItem;

/// Offset and count of the rows to return. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Range {
    pub offset: Option<u64>,
    pub count: Option<u64>,
}

impl Range {
    /// Whether any restriction applies.
    pub fn is_restricted(&self) -> bool {
        self.offset.is_some_and(|o| o > 0) || self.count.is_some()
    }

    fn offset_or_zero(&self) -> u64 {
        self.offset.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pagination<'a> {
    /// No restriction requested.
    Unrestricted,
    /// Dialect-rendered suffix such as `LIMIT`/`OFFSET`.
    Trailing,
    /// `SELECT * FROM (SELECT subq.*, <rownum> rn FROM (...) subq) WHERE rn ...`
    DoubleNested(&'a str),
    /// `SELECT subq.a, ... FROM (SELECT a, ..., <rownum> rn ...) subq WHERE subq.rn ...`
    SingleNested(&'a str),
}

pub(crate) fn strategy(dialect: &dyn Dialect, range: Range) -> Pagination<'_> {
    if !range.is_restricted() {
        Pagination::Unrestricted
    } else if let Some(rownum) = dialect.nested_row_number_column() {
        Pagination::DoubleNested(rownum)
    } else if let Some(rownum) = dialect.row_number_column() {
        Pagination::SingleNested(rownum)
    } else {
        Pagination::Trailing
    }
}

/// Wrap `sql` twice, numbering rows in the middle query and filtering outside.
pub(crate) fn wrap_double_nested(sql: &str, rownum: &str, range: Range) -> String {
    let offset = range.offset_or_zero();
    let filter = if offset > 0 {
        match range.count {
            Some(count) => format!("rn > {offset} AND rn <= {}", offset.saturating_add(count)),
            None => format!("rn > {offset}"),
        }
    } else {
        format!("rn <= {}", range.count.unwrap_or(0))
    };
    format!("SELECT * FROM (SELECT subq.*, {rownum} rn FROM ({sql}) subq) WHERE {filter}")
}

/// Name of a selected item as seen from a wrapping query.
///
/// The alias when present, else the SQL with any table qualifier stripped.
pub(crate) fn outer_column_name(item: &SelectedItem) -> &str {
    match item.alias() {
        Some(alias) => alias,
        None => match item.sql().find('.') {
            Some(dot) if dot > 0 => &item.sql()[dot + 1..],
            _ => item.sql(),
        },
    }
}

/// Wrap `sql` once, re-selecting each item through `subq` and filtering on `subq.rn`.
///
/// With no selected items every column of the wrapped query is returned.
pub(crate) fn wrap_single_nested(sql: &str, items: &[SelectedItem], range: Range) -> String {
    let columns = if items.is_empty() {
        "subq.*".to_string()
    } else {
        items
            .iter()
            .map(|i| format!("subq.{}", outer_column_name(i)))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let offset = range.offset_or_zero();
    let mut filters = Vec::new();
    if offset > 0 {
        filters.push(format!("subq.rn > {offset}"));
    }
    if let Some(count) = range.count {
        filters.push(format!("subq.rn <= {}", offset.saturating_add(count)));
    }

    let mut wrapped = format!("SELECT {columns} FROM ({sql}) subq");
    if !filters.is_empty() {
        wrapped.push_str(" WHERE ");
        wrapped.push_str(&filters.join(" AND "));
    }
    wrapped
}
