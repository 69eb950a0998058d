//! Table alias naming strategies.
//!
//! A statement picks its [`AliasNamer`] once, by strategy name, through
//! [`resolve`]. Namers are created lazily the first time a name is requested
//! and then shared process-wide. Built-in strategies are registered with
//! `inventory`:
//!
//! - `alpha-scheme`: one letter sequence per table group plus the table's index
//!   in the group (`A0`, `A1`, `B0`, ..., `Z0`, `AA0`).
//! - `t-scheme`: `T` plus the number of tables already in the statement
//!   (`T0`, `T1`, ...).
//!
//! Both append `_SUB` once per subquery nesting level, so a subquery never
//! shadows an alias of its enclosing statement.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::error::{StmtError, StmtResult};
use crate::stmt::TableRegistry;
use crate::table::Table;

/// Name of the strategy used when none is configured.
pub const DEFAULT_NAMING_STRATEGY: &str = "alpha-scheme";

/// Assigns aliases to tables registered in a statement.
///
/// Implementations must be deterministic: the same sequence of registrations
/// in the same statement shape yields the same aliases.
pub trait AliasNamer: fmt::Debug + Send + Sync {
    fn alias_for_table(&self, cx: &NamingContext<'_>, table: &Table, group: &str) -> String;
}

/// Read-only view of the statement a table is being registered into.
#[derive(Debug, Clone, Copy)]
pub struct NamingContext<'a> {
    registry: &'a TableRegistry,
    depth: usize,
}

impl<'a> NamingContext<'a> {
    pub(crate) fn new(registry: &'a TableRegistry, depth: usize) -> Self {
        Self { registry, depth }
    }

    /// Number of table groups in the statement.
    pub fn group_count(&self) -> usize {
        self.registry.groups().len()
    }

    /// Position of the named group, if it already exists.
    pub fn group_position(&self, group: &str) -> Option<usize> {
        self.registry.groups().iter().position(|g| g.name() == group)
    }

    /// Number of tables already in the named group.
    pub fn tables_in_group(&self, group: &str) -> usize {
        self.registry
            .group(group)
            .map(|g| g.tables().len())
            .unwrap_or(0)
    }

    /// Number of tables already registered in the statement.
    pub fn table_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_alias_taken(&self, alias: &str) -> bool {
        self.registry.get(alias).is_some()
    }

    /// 0 for a top-level statement, 1 for a subquery of it, and so on.
    pub fn subquery_depth(&self) -> usize {
        self.depth
    }

    fn suffix(&self) -> String {
        "_SUB".repeat(self.depth)
    }
}

/// Letter sequence per group plus the table's index within the group.
#[derive(Debug, Default)]
pub struct AlphaNamer;

/// Bijective base-26: 0 -> A, 25 -> Z, 26 -> AA.
fn group_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

impl AliasNamer for AlphaNamer {
    fn alias_for_table(&self, cx: &NamingContext<'_>, _table: &Table, group: &str) -> String {
        let letters = group_letters(cx.group_position(group).unwrap_or(cx.group_count()));
        let suffix = cx.suffix();
        let mut number = cx.tables_in_group(group);
        loop {
            let alias = format!("{letters}{number}{suffix}");
            if !cx.is_alias_taken(&alias) {
                return alias;
            }
            number += 1;
        }
    }
}

/// `T` plus a statement-wide table counter.
#[derive(Debug, Default)]
pub struct TNamer;

impl AliasNamer for TNamer {
    fn alias_for_table(&self, cx: &NamingContext<'_>, _table: &Table, _group: &str) -> String {
        let suffix = cx.suffix();
        let mut number = cx.table_count();
        loop {
            let alias = format!("T{number}{suffix}");
            if !cx.is_alias_taken(&alias) {
                return alias;
            }
            number += 1;
        }
    }
}

/// Registration entry for a naming strategy discovered at link time.
pub struct NamerRegistration {
    /// Strategy key, as used in `StatementOptions::naming_strategy`.
    pub name: &'static str,
    /// Constructor, called at most once per process.
    pub create: fn() -> Arc<dyn AliasNamer>,
}

inventory::collect!(NamerRegistration);

fn alpha_scheme() -> Arc<dyn AliasNamer> {
    Arc::new(AlphaNamer)
}

fn t_scheme() -> Arc<dyn AliasNamer> {
    Arc::new(TNamer)
}

inventory::submit! {
    NamerRegistration { name: "alpha-scheme", create: alpha_scheme }
}

inventory::submit! {
    NamerRegistration { name: "t-scheme", create: t_scheme }
}

type NamerMap = HashMap<String, Arc<dyn AliasNamer>>;

fn namers() -> &'static Mutex<NamerMap> {
    static NAMERS: OnceLock<Mutex<NamerMap>> = OnceLock::new();
    NAMERS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Resolve the namer for a strategy key, creating it on first use.
///
/// Creation happens while the registry lock is held, so each key is
/// constructed at most once.
pub fn resolve(name: &str) -> StmtResult<Arc<dyn AliasNamer>> {
    let mut namers = namers().lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(namer) = namers.get(name) {
        return Ok(namer.clone());
    }

    let registration = inventory::iter::<NamerRegistration>
        .into_iter()
        .find(|reg| reg.name == name)
        .ok_or_else(|| StmtError::UnknownNamingStrategy(name.to_string()))?;
    let namer = (registration.create)();
    namers.insert(name.to_string(), namer.clone());
    Ok(namer)
}

/// Publish a namer under a strategy key.
///
/// Returns `false` and leaves the registry unchanged if the key already
/// resolved to a namer.
pub fn register(name: impl Into<String>, namer: Arc<dyn AliasNamer>) -> bool {
    let mut namers = namers().lock().unwrap_or_else(PoisonError::into_inner);
    let name = name.into();
    if namers.contains_key(&name) {
        return false;
    }
    namers.insert(name, namer);
    true
}
