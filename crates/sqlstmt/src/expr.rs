//! SQL fragments consumed by the statement builder.
//!
//! `SqlExpr` is a value-producing fragment (a column, a mapped group of columns,
//! an aggregate, a literal) and `BoolExpr` is a predicate used in `WHERE`,
//! `HAVING` and join conditions. Both render to plain SQL text; parameter
//! binding happens outside this crate.

use std::fmt;

use crate::table::{Mapping, TableRef};

/// A literal value inlined into SQL text.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl Literal {
    /// Render the literal as SQL text. Strings are single-quoted with `'` doubled.
    pub fn to_sql(&self) -> String {
        match self {
            Literal::Null => "NULL".to_string(),
            Literal::Bool(true) => "TRUE".to_string(),
            Literal::Bool(false) => "FALSE".to_string(),
            Literal::Int(v) => v.to_string(),
            Literal::Str(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Str(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Str(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Int(value.into())
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

/// Where an expression's value comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Origin {
    /// One or more physical columns of a registered table.
    Column { table: String, alias: String },
    /// An aggregate function call.
    Aggregate,
    /// A reference to a result column already selected under this alias.
    ResultAlias,
    /// Anything else: literals, raw fragments, computed values.
    Derived,
}

/// A value-producing SQL fragment.
///
/// Mapped fields may span several columns; such an expression has an arity
/// above one and renders as a comma-separated list of its sub-expressions.
#[derive(Clone, Debug, PartialEq)]
pub struct SqlExpr {
    text: String,
    parts: Vec<SqlExpr>,
    origin: Origin,
}

impl SqlExpr {
    fn single(text: String, origin: Origin) -> Self {
        Self {
            text,
            parts: Vec::new(),
            origin,
        }
    }

    /// A single column of a registered table, qualified with the table alias.
    pub fn column(table: &TableRef, column: &str) -> Self {
        Self::single(
            format!("{}.{}", table.alias(), column),
            Origin::Column {
                table: table.table().name().to_string(),
                alias: table.alias().to_string(),
            },
        )
    }

    /// Every column of a mapping, qualified with the table alias.
    pub fn mapping(table: &TableRef, mapping: &Mapping) -> Self {
        let mut parts: Vec<SqlExpr> = mapping
            .columns()
            .iter()
            .map(|c| Self::column(table, c))
            .collect();
        if parts.len() == 1 {
            return parts.remove(0);
        }
        let text = parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            text,
            parts,
            origin: Origin::Column {
                table: table.table().name().to_string(),
                alias: table.alias().to_string(),
            },
        }
    }

    /// An aggregate call such as `COUNT(A0.id)` or `MAX(A0.age)`.
    pub fn aggregate(function: &str, arg: &SqlExpr) -> Self {
        Self::single(format!("{}({})", function, arg.text), Origin::Aggregate)
    }

    /// `COUNT(*)`
    pub fn count_all() -> Self {
        Self::single("COUNT(*)".to_string(), Origin::Aggregate)
    }

    /// A literal value.
    pub fn literal(value: impl Into<Literal>) -> Self {
        Self::single(value.into().to_sql(), Origin::Derived)
    }

    /// A raw SQL fragment with no known source table.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::single(sql.into(), Origin::Derived)
    }

    /// A reference to an already-selected result column.
    pub fn result_alias(alias: impl Into<String>) -> Self {
        Self::single(alias.into(), Origin::ResultAlias)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Number of columns this expression spans.
    pub fn arity(&self) -> usize {
        if self.parts.is_empty() { 1 } else { self.parts.len() }
    }

    /// The `index`-th column of a multi-column expression, or the expression itself.
    pub fn sub_expression(&self, index: usize) -> Option<&SqlExpr> {
        if self.parts.is_empty() {
            (index == 0).then_some(self)
        } else {
            self.parts.get(index)
        }
    }

    /// Iterate over the single-column components.
    pub fn components(&self) -> impl Iterator<Item = &SqlExpr> {
        (0..self.arity()).filter_map(move |i| self.sub_expression(i))
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn is_aggregate(&self) -> bool {
        self.origin == Origin::Aggregate
    }

    pub fn is_result_alias(&self) -> bool {
        self.origin == Origin::ResultAlias
    }

    /// Whether the expression reads columns of a registered table.
    pub fn has_source_table(&self) -> bool {
        matches!(self.origin, Origin::Column { .. })
    }

    /// Whether the expression is exactly one physical column.
    pub fn is_single_column(&self) -> bool {
        self.has_source_table() && self.parts.is_empty()
    }

    /// Alias of the table the expression reads from, if any.
    pub fn source_alias(&self) -> Option<&str> {
        match &self.origin {
            Origin::Column { alias, .. } => Some(alias),
            _ => None,
        }
    }

    /// Component-wise equality, ANDed across the columns of both sides.
    ///
    /// Callers check arity first; surplus columns on either side are ignored.
    pub fn eq(&self, other: &SqlExpr) -> BoolExpr {
        let conds: Vec<BoolExpr> = self
            .components()
            .zip(other.components())
            .map(|(l, r)| BoolExpr::Raw(format!("{} = {}", l.text, r.text)))
            .collect();
        BoolExpr::all(conds)
    }

    /// `expr = literal` on every column.
    pub fn eq_literal(&self, value: impl Into<Literal>) -> BoolExpr {
        self.compare("=", value)
    }

    /// `expr <op> literal` on every column.
    pub fn compare(&self, op: &str, value: impl Into<Literal>) -> BoolExpr {
        let lit = value.into().to_sql();
        let conds: Vec<BoolExpr> = self
            .components()
            .map(|c| BoolExpr::Raw(format!("{} {} {}", c.text, op, lit)))
            .collect();
        BoolExpr::all(conds)
    }

    /// `expr IS NULL`
    pub fn is_null(&self) -> BoolExpr {
        BoolExpr::Raw(format!("{} IS NULL", self.text))
    }
}

impl fmt::Display for SqlExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Boolean expression used for WHERE/HAVING clauses and join conditions.
#[derive(Clone, Debug, PartialEq)]
pub enum BoolExpr {
    /// AND group: all conditions must be true.
    And(Vec<BoolExpr>),

    /// OR group: at least one condition must be true.
    Or(Vec<BoolExpr>),

    /// Explicitly parenthesized expression.
    Paren(Box<BoolExpr>),

    /// `EXISTS (subquery)`
    Exists(String),

    /// Raw SQL predicate.
    Raw(String),

    /// Always true. Renders as `1=1`.
    True,

    /// Always false. Renders as `1=0`.
    False,
}

impl BoolExpr {
    /// Create a raw predicate.
    pub fn raw(sql: impl Into<String>) -> Self {
        BoolExpr::Raw(sql.into())
    }

    /// AND together a list of conditions. A single condition is returned unchanged.
    pub fn all(mut conds: Vec<BoolExpr>) -> Self {
        match conds.len() {
            0 => BoolExpr::True,
            1 => conds.remove(0),
            _ => BoolExpr::And(conds),
        }
    }

    /// OR together a list of conditions. A single condition is returned unchanged.
    pub fn any(mut conds: Vec<BoolExpr>) -> Self {
        match conds.len() {
            0 => BoolExpr::False,
            1 => conds.remove(0),
            _ => BoolExpr::Or(conds),
        }
    }

    /// `self AND other`, flattening nested AND groups.
    pub fn and(self, other: BoolExpr) -> Self {
        match self {
            BoolExpr::And(mut exprs) => {
                exprs.push(other);
                BoolExpr::And(exprs)
            }
            expr => BoolExpr::And(vec![expr, other]),
        }
    }

    /// `self OR other`, flattening nested OR groups.
    pub fn or(self, other: BoolExpr) -> Self {
        match self {
            BoolExpr::Or(mut exprs) => {
                exprs.push(other);
                BoolExpr::Or(exprs)
            }
            expr => BoolExpr::Or(vec![expr, other]),
        }
    }

    /// Wrap in parentheses.
    pub fn paren(self) -> Self {
        BoolExpr::Paren(Box::new(self))
    }

    /// `EXISTS (sql)`
    pub fn exists(subquery: impl Into<String>) -> Self {
        BoolExpr::Exists(subquery.into())
    }

    pub fn is_true(&self) -> bool {
        matches!(self, BoolExpr::True)
    }

    /// Render to SQL text.
    pub fn to_sql(&self) -> String {
        match self {
            BoolExpr::And(exprs) => exprs
                .iter()
                .map(|e| match e {
                    BoolExpr::Or(_) => format!("({})", e.to_sql()),
                    _ => e.to_sql(),
                })
                .collect::<Vec<_>>()
                .join(" AND "),
            BoolExpr::Or(exprs) => exprs
                .iter()
                .map(|e| match e {
                    BoolExpr::And(_) => format!("({})", e.to_sql()),
                    _ => e.to_sql(),
                })
                .collect::<Vec<_>>()
                .join(" OR "),
            BoolExpr::Paren(inner) => format!("({})", inner.to_sql()),
            BoolExpr::Exists(sql) => format!("EXISTS ({})", sql),
            BoolExpr::Raw(sql) => sql.clone(),
            BoolExpr::True => "1=1".to_string(),
            BoolExpr::False => "1=0".to_string(),
        }
    }
}

impl fmt::Display for BoolExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
