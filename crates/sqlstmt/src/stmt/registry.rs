use std::fmt;

use super::{JoinType, Statement};
use crate::table::TableRef;

/// Named, ordered collection of tables representing facets of one logical row.
///
/// The first member is the group's anchor. Groups created by a join remember
/// the join type that introduced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableGroup {
    name: String,
    join_type: Option<JoinType>,
    tables: Vec<TableRef>,
}

impl TableGroup {
    fn new(name: &str, join_type: Option<JoinType>) -> Self {
        Self {
            name: name.to_string(),
            join_type,
            tables: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn join_type(&self) -> Option<JoinType> {
        self.join_type
    }

    pub fn tables(&self) -> &[TableRef] {
        &self.tables
    }

    pub fn anchor(&self) -> Option<&TableRef> {
        self.tables.first()
    }
}

impl fmt::Display for TableGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables: Vec<String> = self.tables.iter().map(ToString::to_string).collect();
        match self.join_type {
            Some(jt) => write!(f, "{} [{}] ({:?})", self.name, tables.join(", "), jt),
            None => write!(f, "{} [{}]", self.name, tables.join(", ")),
        }
    }
}

/// Tables registered in a statement, in registration order, and their groups.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: Vec<TableRef>,
    groups: Vec<TableGroup>,
}

impl TableRegistry {
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn tables(&self) -> &[TableRef] {
        &self.tables
    }

    pub fn groups(&self) -> &[TableGroup] {
        &self.groups
    }

    /// Table registered under `alias`.
    pub fn get(&self, alias: &str) -> Option<&TableRef> {
        self.tables.iter().find(|t| t.alias() == alias)
    }

    pub fn group(&self, name: &str) -> Option<&TableGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Table with the given name inside the named group.
    pub fn find_in_group(&self, table: &str, group: &str) -> Option<&TableRef> {
        self.group(group)?
            .tables
            .iter()
            .find(|t| t.table().name() == table)
    }

    /// First table with the given name in any group.
    pub fn find_any(&self, table: &str) -> Option<&TableRef> {
        self.groups
            .iter()
            .flat_map(|g| g.tables.iter())
            .find(|t| t.table().name() == table)
    }

    /// Name for a group created without an explicit name, skipping names in use.
    pub(crate) fn next_group_name(&self) -> String {
        (self.groups.len()..)
            .map(|n| format!("Group{n}"))
            .find(|name| self.group(name).is_none())
            .unwrap_or_default()
    }

    /// Register a table into its group, creating the group if needed.
    pub(crate) fn insert(&mut self, table: TableRef, join_type: Option<JoinType>) {
        match self.groups.iter_mut().find(|g| g.name == table.group()) {
            Some(group) => group.tables.push(table.clone()),
            None => {
                let mut group = TableGroup::new(table.group(), join_type);
                group.tables.push(table.clone());
                self.groups.push(group);
            }
        }
        self.tables.push(table);
    }

    /// Unregister a table. Its group is kept even when it becomes empty.
    pub(crate) fn remove(&mut self, alias: &str) -> Option<TableRef> {
        let pos = self.tables.iter().position(|t| t.alias() == alias)?;
        let removed = self.tables.remove(pos);
        if let Some(group) = self.groups.iter_mut().find(|g| g.name == removed.group()) {
            group.tables.retain(|t| t.alias() != alias);
        }
        Some(removed)
    }
}

impl Statement {
    pub fn primary_table(&self) -> &TableRef {
        &self.primary
    }

    /// Table registered under `alias`.
    pub fn table(&self, alias: &str) -> Option<&TableRef> {
        self.registry.get(alias)
    }

    /// Table with the given name inside the named group.
    pub fn table_in_group(&self, table: &str, group: &str) -> Option<&TableRef> {
        self.registry.find_in_group(table, group)
    }

    /// First table with the given name in any group.
    pub fn table_for(&self, table: &str) -> Option<&TableRef> {
        self.registry.find_any(table)
    }

    pub fn table_groups(&self) -> &[TableGroup] {
        self.registry.groups()
    }

    pub fn table_group(&self, name: &str) -> Option<&TableGroup> {
        self.registry.group(name)
    }

    pub fn number_of_table_groups(&self) -> usize {
        self.registry.groups().len()
    }

    /// Number of registered tables, including the primary table.
    pub fn number_of_tables(&self) -> usize {
        self.registry.len()
    }
}
