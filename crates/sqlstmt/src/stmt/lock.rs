//! Row locking for `SELECT`.
//!
//! Locking never fails a statement. When the dialect cannot lock the rows of a
//! statement with the clauses present, the lock is dropped and a warning names
//! every clause that prevented it.

use crate::dialect::Dialect;

/// The clauses of a statement that interact with row locking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct LockShape {
    pub distinct: bool,
    pub grouping: bool,
    pub having: bool,
    pub ordering: bool,
    pub joins: bool,
}

/// Clauses the dialect cannot combine with `FOR UPDATE`.
pub(crate) fn blockers(dialect: &dyn Dialect, shape: LockShape) -> Vec<&'static str> {
    let checks = [
        (shape.distinct && !dialect.lock_with_distinct(), "DISTINCT"),
        (shape.grouping && !dialect.lock_with_grouping(), "GROUP BY"),
        (shape.having && !dialect.lock_with_having(), "HAVING"),
        (shape.ordering && !dialect.lock_with_ordering(), "ORDER BY"),
        (shape.joins && !dialect.lock_with_multiple_tables(), "multiple tables"),
    ];
    checks
        .into_iter()
        .filter_map(|(blocked, clause)| blocked.then_some(clause))
        .collect()
}

/// Table hint placed after the primary table, e.g. `WITH (UPDLOCK, ROWLOCK)`.
pub(crate) fn from_hint(dialect: &dyn Dialect, lock: bool) -> Option<&str> {
    (lock && dialect.lock_placed_after_from()).then(|| dialect.lock_option_text())
}

/// Table hint placed on every joined table.
pub(crate) fn join_hint(dialect: &dyn Dialect, lock: bool) -> Option<&str> {
    (lock && dialect.lock_placed_within_join()).then(|| dialect.lock_option_text())
}

/// Trailing `FOR UPDATE [NOWAIT]` clause, or `None` when locking does not apply.
pub(crate) fn for_update_clause(
    dialect: &dyn Dialect,
    shape: LockShape,
    lock: bool,
    nowait: bool,
) -> Option<String> {
    if !lock {
        return None;
    }
    if !dialect.lock_with_select_for_update() {
        if !dialect.lock_placed_after_from() && !dialect.lock_placed_within_join() {
            tracing::warn!(
                target: "sqlstmt",
                dialect = dialect.name(),
                "row locking requested but the dialect has no locking mechanism"
            );
        }
        return None;
    }

    let blocked = blockers(dialect, shape);
    if !blocked.is_empty() {
        tracing::warn!(
            target: "sqlstmt",
            dialect = dialect.name(),
            blocked_by = %blocked.join(", "),
            "row locking skipped: dialect cannot lock with these clauses"
        );
        return None;
    }

    let mut clause = dialect.select_for_update_text().to_string();
    if nowait && dialect.supports_for_update_nowait() {
        clause.push_str(" NOWAIT");
    }
    Some(clause)
}
