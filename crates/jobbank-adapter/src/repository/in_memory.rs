//! In-Memory Repository Implementation
//!
//! Simple in-memory implementation of `EntityStore`, with the same
//! contract as the SQLite store: row versions, case-insensitive unique
//! names, and dependent references that block deletes.
//! Useful for testing and development.

use std::collections::{BTreeMap, HashMap};
use std::future::{ready, Future};
use std::marker::PhantomData;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use jobbank_domain::{
    CatalogEntity, EntityDraft, EntityId, EntityStore, RepositoryError, RowVersion, SortOrder,
};

#[derive(Debug, Clone)]
struct Row {
    name: String,
    version: RowVersion,
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<EntityId, Row>,
    last_id: i64,
    /// Number of dependent rows pointing at each entity
    references: HashMap<EntityId, usize>,
}

impl Table {
    fn name_taken(&self, name: &str, except: Option<EntityId>) -> bool {
        self.rows
            .iter()
            .any(|(id, row)| Some(*id) != except && row.name.eq_ignore_ascii_case(name))
    }
}

/// In-memory entity store
///
/// Thread-safe implementation using RwLock. Clones share the same table.
#[derive(Debug)]
pub struct InMemoryEntityStore<E> {
    table: Arc<RwLock<Table>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for InMemoryEntityStore<E> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            _entity: PhantomData,
        }
    }
}

impl<E> Default for InMemoryEntityStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> InMemoryEntityStore<E> {
    pub fn new() -> Self {
        Self {
            table: Arc::new(RwLock::new(Table::default())),
            _entity: PhantomData,
        }
    }

    /// A store pre-filled with the given names, ids starting at 1
    pub fn with_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let store = Self::new();
        {
            let mut table = store.table.write().unwrap_or_else(|e| e.into_inner());
            for name in names {
                table.last_id += 1;
                let id = EntityId::new(table.last_id);
                table.rows.insert(
                    id,
                    Row {
                        name: name.to_string(),
                        version: RowVersion::initial(),
                    },
                );
            }
        }
        store
    }

    /// Record a dependent row (an applicant) referencing `id`
    pub fn add_reference(&self, id: EntityId) -> Result<(), RepositoryError> {
        let mut table = self.write()?;
        if !table.rows.contains_key(&id) {
            return Err(RepositoryError::persistence(format!(
                "FOREIGN KEY constraint failed: no row {}",
                id
            )));
        }
        *table.references.entry(id).or_default() += 1;
        Ok(())
    }

    /// Drop one dependent reference to `id`
    pub fn remove_reference(&self, id: EntityId) -> Result<(), RepositoryError> {
        let mut table = self.write()?;
        if let Some(count) = table.references.get_mut(&id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                table.references.remove(&id);
            }
        }
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Table>, RepositoryError> {
        self.table
            .read()
            .map_err(|_| RepositoryError::persistence("Failed to acquire read lock"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Table>, RepositoryError> {
        self.table
            .write()
            .map_err(|_| RepositoryError::persistence("Failed to acquire write lock"))
    }
}

impl<E: CatalogEntity> InMemoryEntityStore<E> {
    fn sorted(&self, order: SortOrder) -> Result<Vec<E>, RepositoryError> {
        let table = self.read()?;
        let mut entities: Vec<E> = table
            .rows
            .iter()
            .map(|(id, row)| E::restore(*id, row.name.clone(), row.version))
            .collect();

        if order == SortOrder::ByName {
            entities.sort_by(|a, b| {
                a.name()
                    .to_ascii_lowercase()
                    .cmp(&b.name().to_ascii_lowercase())
                    .then(a.id().cmp(&b.id()))
            });
        }
        Ok(entities)
    }

    fn insert_sync(&self, draft: &EntityDraft) -> Result<E, RepositoryError> {
        let mut table = self.write()?;
        if table.name_taken(draft.name(), None) {
            return Err(RepositoryError::persistence(format!(
                "UNIQUE constraint failed: {}.name",
                E::KIND.table()
            )));
        }

        table.last_id += 1;
        let id = EntityId::new(table.last_id);
        let version = RowVersion::initial();
        table.rows.insert(
            id,
            Row {
                name: draft.name().to_string(),
                version,
            },
        );
        Ok(E::restore(id, draft.name().to_string(), version))
    }

    fn update_sync(
        &self,
        id: EntityId,
        expected: RowVersion,
        draft: &EntityDraft,
    ) -> Result<E, RepositoryError> {
        let mut table = self.write()?;
        let current = table
            .rows
            .get(&id)
            .map(|row| row.version)
            .ok_or(RepositoryError::NotFound { kind: E::KIND, id })?;

        if current != expected {
            return Err(RepositoryError::ConcurrencyConflict { kind: E::KIND, id });
        }
        if table.name_taken(draft.name(), Some(id)) {
            return Err(RepositoryError::persistence(format!(
                "UNIQUE constraint failed: {}.name",
                E::KIND.table()
            )));
        }

        let version = current.next();
        table.rows.insert(
            id,
            Row {
                name: draft.name().to_string(),
                version,
            },
        );
        Ok(E::restore(id, draft.name().to_string(), version))
    }

    fn remove_sync(&self, id: EntityId) -> Result<(), RepositoryError> {
        let mut table = self.write()?;
        if !table.rows.contains_key(&id) {
            return Err(RepositoryError::NotFound { kind: E::KIND, id });
        }
        if table.references.contains_key(&id) {
            return Err(RepositoryError::ReferentialIntegrity { kind: E::KIND, id });
        }
        table.rows.remove(&id);
        Ok(())
    }
}

impl<E: CatalogEntity> EntityStore<E> for InMemoryEntityStore<E> {
    fn list(&self, order: SortOrder) -> impl Future<Output = Result<Vec<E>, RepositoryError>> + Send {
        ready(self.sorted(order))
    }

    fn count(&self) -> impl Future<Output = Result<u64, RepositoryError>> + Send {
        ready(self.read().map(|table| table.rows.len() as u64))
    }

    fn list_page(
        &self,
        skip: u64,
        take: u64,
    ) -> impl Future<Output = Result<Vec<E>, RepositoryError>> + Send {
        let page = self.sorted(SortOrder::ByName).map(|entities| {
            entities
                .into_iter()
                .skip(skip as usize)
                .take(take as usize)
                .collect()
        });
        ready(page)
    }

    fn find_by_id(&self, id: EntityId) -> impl Future<Output = Result<Option<E>, RepositoryError>> + Send {
        let found = self.read().map(|table| {
            table
                .rows
                .get(&id)
                .map(|row| E::restore(id, row.name.clone(), row.version))
        });
        ready(found)
    }

    fn insert(&self, draft: &EntityDraft) -> impl Future<Output = Result<E, RepositoryError>> + Send {
        ready(self.insert_sync(draft))
    }

    fn update(
        &self,
        id: EntityId,
        expected: RowVersion,
        draft: &EntityDraft,
    ) -> impl Future<Output = Result<E, RepositoryError>> + Send {
        ready(self.update_sync(id, expected, draft))
    }

    fn remove(&self, id: EntityId) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        ready(self.remove_sync(id))
    }
}
