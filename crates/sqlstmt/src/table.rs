//! Relational tables, their column mappings and aliased references.

use std::fmt;
use std::sync::Arc;

/// A relational table as seen by the statement builder.
///
/// # Example
///
/// ```ignore
/// let person = Table::new("person")
///     .with_columns(["id", "name", "kind"])
///     .with_primary_key(["id"])
///     .with_discriminator("kind");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    primary_key: Vec<String>,
    discriminator: Option<String>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            discriminator: None,
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn with_primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the column whose value distinguishes subtypes stored in this table.
    pub fn with_discriminator(mut self, column: impl Into<String>) -> Self {
        self.discriminator = Some(column.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn discriminator(&self) -> Option<&str> {
        self.discriminator.as_deref()
    }

    /// A single column owned by this table.
    pub fn column(&self, name: impl Into<String>) -> Column {
        Column {
            table: self.name.clone(),
            name: name.into(),
        }
    }

    /// A group of columns owned by this table, in the given order.
    pub fn mapping<I, S>(&self, columns: I) -> Mapping
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Mapping {
            table: self.name.clone(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Mapping of the primary key columns.
    pub fn primary_key(&self) -> Mapping {
        self.mapping(self.primary_key.iter().cloned())
    }
}

/// A column and the name of the table owning it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    table: String,
    name: String,
}

impl Column {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The columns a field is stored in, and the name of the table owning them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mapping {
    table: String,
    columns: Vec<String>,
}

impl Mapping {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl From<Column> for Mapping {
    fn from(column: Column) -> Self {
        Mapping {
            table: column.table,
            columns: vec![column.name],
        }
    }
}

/// A table registered in a statement under an alias, inside a table group.
#[derive(Clone, Debug)]
pub struct TableRef {
    table: Arc<Table>,
    alias: String,
    group: String,
}

impl TableRef {
    pub fn new(table: Arc<Table>, alias: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            table,
            alias: alias.into(),
            group: group.into(),
        }
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn group(&self) -> &str {
        &self.group
    }
}

impl PartialEq for TableRef {
    fn eq(&self, other: &Self) -> bool {
        self.alias == other.alias && self.table.name == other.table.name
    }
}

impl Eq for TableRef {}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.table.name, self.alias)
    }
}
