//! Entity Store - Abstract persistence for catalog entities
//!
//! One store per entity type. How rows are kept (SQLite, memory) is not
//! our concern here; what matters is the error contract:
//!
//! - `update` and `remove` re-check existence first and report `NotFound`
//! - a stale row version is a `ConcurrencyConflict`, never a generic error
//! - a delete blocked by dependent rows is `ReferentialIntegrity`

use core::future::Future;
use core::marker::PhantomData;

use crate::model::entity::{CatalogEntity, EntityDraft, EntityId, EntityKind, RowVersion};
use crate::pagination::PageSource;

/// Errors that can occur during repository operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The row does not exist (or no longer exists)
    NotFound { kind: EntityKind, id: EntityId },
    /// The row changed or vanished since it was read
    ConcurrencyConflict { kind: EntityKind, id: EntityId },
    /// Other rows still reference this one
    ReferentialIntegrity { kind: EntityKind, id: EntityId },
    /// Constraint or connectivity failure
    PersistenceError { message: String },
}

impl RepositoryError {
    pub fn persistence(message: impl Into<String>) -> Self {
        RepositoryError::PersistenceError {
            message: message.into(),
        }
    }
}

impl core::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RepositoryError::NotFound { kind, id } => {
                write!(f, "{} not found: {}", kind, id)
            }
            RepositoryError::ConcurrencyConflict { kind, id } => {
                write!(f, "Concurrent modification for {}: {}", kind, id)
            }
            RepositoryError::ReferentialIntegrity { kind, id } => {
                write!(f, "{} {} is referenced by other records", kind, id)
            }
            RepositoryError::PersistenceError { message } => {
                write!(f, "Persistence error: {}", message)
            }
        }
    }
}

impl std::error::Error for RepositoryError {}

/// Ordering for [`EntityStore::list`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Insertion order
    #[default]
    ById,
    /// Case-insensitive by name, id as tie-breaker
    ByName,
}

/// Entity Store Trait
///
/// This is a PORT in hexagonal architecture. Futures are `Send` so the
/// HTTP layer can drive them on a multi-threaded runtime.
pub trait EntityStore<E: CatalogEntity>: Send + Sync {
    /// Enumerate every entity
    fn list(&self, order: SortOrder) -> impl Future<Output = Result<Vec<E>, RepositoryError>> + Send;

    /// Count every entity
    fn count(&self) -> impl Future<Output = Result<u64, RepositoryError>> + Send;

    /// A name-ordered slice, used by pagination
    fn list_page(
        &self,
        skip: u64,
        take: u64,
    ) -> impl Future<Output = Result<Vec<E>, RepositoryError>> + Send;

    /// Find an entity by ID
    fn find_by_id(&self, id: EntityId) -> impl Future<Output = Result<Option<E>, RepositoryError>> + Send;

    /// Insert a new entity; the store assigns the id
    fn insert(&self, draft: &EntityDraft) -> impl Future<Output = Result<E, RepositoryError>> + Send;

    /// Overwrite the mutable fields if `expected` still matches the stored version
    fn update(
        &self,
        id: EntityId,
        expected: RowVersion,
        draft: &EntityDraft,
    ) -> impl Future<Output = Result<E, RepositoryError>> + Send;

    /// Delete an entity
    fn remove(&self, id: EntityId) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Check if an entity exists
    fn exists(&self, id: EntityId) -> impl Future<Output = Result<bool, RepositoryError>> + Send {
        let found = self.find_by_id(id);
        async move { Ok(found.await?.is_some()) }
    }
}

/// A store viewed as a name-ordered [`PageSource`]
pub struct ByName<'a, S, E> {
    store: &'a S,
    _entity: PhantomData<fn() -> E>,
}

impl<'a, S, E> ByName<'a, S, E> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }
}

impl<S, E> PageSource for ByName<'_, S, E>
where
    S: EntityStore<E>,
    E: CatalogEntity,
{
    type Item = E;
    type Error = RepositoryError;

    fn count(&self) -> impl Future<Output = Result<u64, RepositoryError>> + Send {
        self.store.count()
    }

    fn fetch(&self, skip: u64, take: u64) -> impl Future<Output = Result<Vec<E>, RepositoryError>> + Send {
        self.store.list_page(skip, take)
    }
}
