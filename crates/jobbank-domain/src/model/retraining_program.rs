//! Retraining Program - A course an applicant can be enrolled in

use super::entity::{CatalogEntity, EntityId, EntityKind, RowVersion};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrainingProgram {
    id: EntityId,
    name: String,
    row_version: RowVersion,
}

impl CatalogEntity for RetrainingProgram {
    const KIND: EntityKind = EntityKind::RetrainingProgram;

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
