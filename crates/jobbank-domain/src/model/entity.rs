//! Catalog entities - the shared shape of reference data
//!
//! Skills and Retraining Programs are both "a name with an identity".
//! Everything that differs between them lives on [`EntityKind`].

/// Store-assigned identifier of a catalog entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(i64);

impl EntityId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Parse an identifier from a route segment.
    ///
    /// Anything that is not a positive integer is treated as "no id".
    pub fn parse(segment: &str) -> Option<Self> {
        segment
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .map(Self)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for EntityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Optimistic concurrency token, bumped on every successful update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowVersion(i64);

impl RowVersion {
    pub fn new(version: i64) -> Self {
        Self(version)
    }

    /// Version of a freshly inserted row
    pub fn initial() -> Self {
        Self(1)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<i64>().ok().map(Self)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for RowVersion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kinds of reference data managed here
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Skill,
    RetrainingProgram,
}

impl EntityKind {
    /// Human-readable singular name
    pub fn display_name(&self) -> &'static str {
        match self {
            EntityKind::Skill => "Skill",
            EntityKind::RetrainingProgram => "Retraining Program",
        }
    }

    /// Route segment of the collection (`/Skills`, `/RetrainingPrograms`)
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Skill => "Skills",
            EntityKind::RetrainingProgram => "RetrainingPrograms",
        }
    }

    /// Backing table in the relational store
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Skill => "skills",
            EntityKind::RetrainingProgram => "retraining_programs",
        }
    }

    /// Shown when a delete is blocked by rows that still reference the entity
    pub fn in_use_message(&self) -> &'static str {
        match self {
            EntityKind::Skill => {
                "Unable to delete Skill. Remember, you cannot delete a Skill noted for any Applicants."
            }
            EntityKind::RetrainingProgram => {
                "Unable to delete Retraining Program. Remember, you cannot delete a Retraining Program that has Applicants enrolled."
            }
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A persisted reference-data record.
///
/// Stores rehydrate rows through [`CatalogEntity::restore`]; nothing else
/// should construct an entity with an identifier.
pub trait CatalogEntity: Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn restore(id: EntityId, name: String, row_version: RowVersion) -> Self;

    fn id(&self) -> EntityId;

    fn name(&self) -> &str;

    fn row_version(&self) -> RowVersion;
}

/// A validation failure tied to a form field.
///
/// `field` is `None` for errors about the submission as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Option<&'static str>,
    pub message: String,
}

impl FieldError {
    pub fn on(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field: Some(field),
            message: message.into(),
        }
    }

    pub fn model(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

/// Form key of the name field
pub const NAME_FIELD: &str = "Name";

/// The mutable fields of a catalog entity, exactly as submitted.
///
/// The identifier is deliberately absent: it can never be rebound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityForm {
    pub name: String,
}

impl EntityForm {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Prefill a form from a stored entity
    pub fn from_entity<E: CatalogEntity>(entity: &E) -> Self {
        Self::new(entity.name())
    }

    pub fn validate(&self) -> Result<EntityDraft, Vec<FieldError>> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(vec![FieldError::on(
                NAME_FIELD,
                "You cannot leave the name blank.",
            )]);
        }

        Ok(EntityDraft {
            name: name.to_string(),
        })
    }
}

/// Validated input, ready to be written. Only [`EntityForm::validate`]
/// produces one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDraft {
    name: String,
}

impl EntityDraft {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_parse() {
        assert_eq!(EntityId::parse("42"), Some(EntityId::new(42)));
        assert_eq!(EntityId::parse(" 7 "), Some(EntityId::new(7)));
        assert_eq!(EntityId::parse("0"), None);
        assert_eq!(EntityId::parse("-3"), None);
        assert_eq!(EntityId::parse("abc"), None);
        assert_eq!(EntityId::parse(""), None);
    }

    #[test]
    fn test_row_version_sequence() {
        let v = RowVersion::initial();
        assert_eq!(v.value(), 1);
        assert_eq!(v.next().value(), 2);
        assert_eq!(RowVersion::parse("5"), Some(RowVersion::new(5)));
        assert_eq!(RowVersion::parse("x"), None);
    }

    #[test]
    fn test_validate_trims_name() {
        let draft = EntityForm::new("  Welding  ").validate().unwrap();
        assert_eq!(draft.name(), "Welding");
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let errors = EntityForm::new("   ").validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, Some(NAME_FIELD));
    }

    #[test]
    fn test_kind_routes_and_tables() {
        assert_eq!(EntityKind::Skill.collection(), "Skills");
        assert_eq!(EntityKind::RetrainingProgram.table(), "retraining_programs");
        assert!(EntityKind::Skill.in_use_message().contains("Applicants"));
    }
}
