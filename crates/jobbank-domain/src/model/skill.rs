//! Skill - A capability an applicant can be noted for
//!
//! Skill is an Entity: its identity is the store-assigned id, not its name.
//! Applicants reference skills, so a skill in use cannot be deleted.

use super::entity::{CatalogEntity, EntityId, EntityKind, RowVersion};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skill {
    /// Unique identifier (Entity identity)
    id: EntityId,
    /// Display name, e.g. "Forklift Operation"
    name: String,
    /// Concurrency token
    row_version: RowVersion,
}

impl CatalogEntity for Skill {
    const KIND: EntityKind = EntityKind::Skill;

    fn restore(id: EntityId, name: String, row_version: RowVersion) -> Self {
        Self {
            id,
            name,
            row_version,
        }
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn row_version(&self) -> RowVersion {
        self.row_version
    }
}
