use super::Statement;
use crate::error::{StmtError, StmtResult};

impl Statement {
    /// Attach `other` as a UNION branch.
    ///
    /// Fails immediately when the dialect has no UNION syntax.
    pub fn union(&mut self, other: Statement) -> StmtResult<()> {
        if !self.dialect.supports_union_syntax() {
            return Err(StmtError::unsupported(format!(
                "UNION ({})",
                self.dialect.name()
            )));
        }
        self.unions.push(other);
        self.invalidate();
        Ok(())
    }

    /// Number of union branches, counted recursively.
    pub fn number_of_unions(&self) -> usize {
        self.unions
            .iter()
            .map(|u| 1 + u.number_of_unions())
            .sum()
    }

    pub fn unions(&self) -> &[Statement] {
        &self.unions
    }

    /// Mutable access to the union branches.
    ///
    /// The cached text of this statement is cleared, since it embeds theirs.
    pub fn unions_mut(&mut self) -> &mut [Statement] {
        self.invalidate();
        &mut self.unions
    }

    /// Whether every union branch selects from the same table as this statement.
    pub fn all_unions_for_same_primary_table(&self) -> bool {
        let name = self.primary.table().name();
        self.unions
            .iter()
            .all(|u| u.primary.table().name() == name)
    }
}
