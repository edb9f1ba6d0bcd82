//! EntityController - the list/details/create/edit/delete workflow
//!
//! One controller per entity type, all sharing this contract:
//!
//! ```text
//! request ──► authorize ──► load / validate ──► EntityStore ──► outcome
//!                │                │                  │
//!             Forbidden        NotFound        ConcurrencyConflict
//!                             Invalid form     ReferentialIntegrity
//! ```
//!
//! Nothing touches the store before the guard has passed.

use std::marker::PhantomData;
use std::sync::Arc;

use jobbank_domain::{
    paginate, ByName, CatalogEntity, EntityForm, EntityId, EntityKind, EntityStore, FieldError,
    PageRequest, RepositoryError, RowVersion,
};
use tracing::{error, info, warn};

use crate::authorization::{AccessPolicy, Action, Caller};
use crate::error::{ActionError, Result};
use crate::preferences::{resolve_page_size, PreferenceStore};
use crate::view::{DeleteView, EntityView, FormView, ListView};

/// Shown when the store rejects a write for a reason the user can retry
pub const SAVE_FAILED_MESSAGE: &str =
    "Unable to save changes. Try again, and if the problem persists see your system administrator.";

/// Query parameters of the list action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Result of a create or edit submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    /// Written; go back to the list
    Saved { location: String },
    /// Redisplay the form with errors and the submitted values
    Invalid(FormView),
}

/// Result of a delete confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { location: String },
    /// Redisplay the confirmation page with the reason
    Blocked(DeleteView),
}

pub struct EntityController<E, S> {
    store: Arc<S>,
    policy: Arc<AccessPolicy>,
    _entity: PhantomData<fn() -> E>,
}

impl<E, S> Clone for EntityController<E, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: Arc::clone(&self.policy),
            _entity: PhantomData,
        }
    }
}

impl<E, S> EntityController<E, S>
where
    E: CatalogEntity,
    S: EntityStore<E>,
{
    pub fn new(store: S, policy: AccessPolicy) -> Self {
        Self::from_shared(Arc::new(store), Arc::new(policy))
    }

    pub fn from_shared(store: Arc<S>, policy: Arc<AccessPolicy>) -> Self {
        Self {
            store,
            policy,
            _entity: PhantomData,
        }
    }

    pub fn kind(&self) -> EntityKind {
        E::KIND
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Where successful submissions redirect to
    pub fn list_location(&self) -> String {
        format!("/{}", E::KIND.collection())
    }

    fn authorize(&self, caller: &Caller, action: Action) -> Result<()> {
        self.policy.authorize(caller, E::KIND, action)
    }

    async fn load(&self, id: Option<EntityId>) -> Result<E> {
        let id = id.ok_or(ActionError::not_found(E::KIND, None))?;

        self.store
            .find_by_id(id)
            .await
            .map_err(|err| ActionError::from_read(E::KIND, err))?
            .ok_or(ActionError::not_found(E::KIND, Some(id)))
    }

    // ========== List & Details ==========

    pub async fn list(
        &self,
        caller: &Caller,
        query: ListQuery,
        prefs: &mut impl PreferenceStore,
    ) -> Result<ListView> {
        self.authorize(caller, Action::List)?;

        let size = resolve_page_size(query.page_size, prefs);
        let request = PageRequest::new(query.page, size);

        let page = paginate(&ByName::new(&*self.store), request)
            .await
            .map_err(|err| ActionError::from_read(E::KIND, err))?;

        Ok(ListView::from_page(page))
    }

    pub async fn details(&self, caller: &Caller, id: Option<EntityId>) -> Result<EntityView> {
        self.authorize(caller, Action::Details)?;

        let entity = self.load(id).await?;
        Ok(EntityView::from_entity(&entity))
    }

    // ========== Create ==========

    pub fn create_form(&self, caller: &Caller) -> Result<FormView> {
        self.authorize(caller, Action::Create)?;
        Ok(FormView::blank(E::KIND))
    }

    pub async fn create(&self, caller: &Caller, form: EntityForm) -> Result<FormOutcome> {
        self.authorize(caller, Action::Create)?;

        let view = FormView::blank(E::KIND);
        let draft = match form.validate() {
            Ok(draft) => draft,
            Err(errors) => return Ok(FormOutcome::Invalid(view.with_submission(&form, errors))),
        };

        match self.store.insert(&draft).await {
            Ok(entity) => {
                info!(kind = %E::KIND, id = %entity.id(), name = entity.name(), "created");
                Ok(FormOutcome::Saved {
                    location: self.list_location(),
                })
            }
            Err(err) => {
                warn!(kind = %E::KIND, error = %err, "create rejected by store");
                Ok(FormOutcome::Invalid(
                    view.with_submission(&form, vec![FieldError::model(SAVE_FAILED_MESSAGE)]),
                ))
            }
        }
    }

    // ========== Edit ==========

    pub async fn edit_form(&self, caller: &Caller, id: Option<EntityId>) -> Result<FormView> {
        self.authorize(caller, Action::Edit)?;

        let entity = self.load(id).await?;
        Ok(FormView::for_entity(&entity))
    }

    /// Apply an edit. `version` is the row version the user was looking at;
    /// without one, the version just read is used.
    pub async fn edit(
        &self,
        caller: &Caller,
        id: Option<EntityId>,
        form: EntityForm,
        version: Option<RowVersion>,
    ) -> Result<FormOutcome> {
        self.authorize(caller, Action::Edit)?;

        let existing = self.load(id).await?;
        let id = existing.id();
        let expected = version.unwrap_or(existing.row_version());

        let mut view = FormView::for_entity(&existing);
        view.row_version = Some(expected.value());

        let draft = match form.validate() {
            Ok(draft) => draft,
            Err(errors) => return Ok(FormOutcome::Invalid(view.with_submission(&form, errors))),
        };

        match self.store.update(id, expected, &draft).await {
            Ok(updated) => {
                info!(
                    kind = %E::KIND,
                    id = %id,
                    version = %updated.row_version(),
                    "updated"
                );
                Ok(FormOutcome::Saved {
                    location: self.list_location(),
                })
            }
            Err(RepositoryError::NotFound { .. }) => Err(ActionError::not_found(E::KIND, Some(id))),
            Err(RepositoryError::ConcurrencyConflict { .. }) => {
                let still_there = self
                    .store
                    .exists(id)
                    .await
                    .map_err(|err| ActionError::from_read(E::KIND, err))?;

                if !still_there {
                    return Err(ActionError::not_found(E::KIND, Some(id)));
                }

                error!(kind = %E::KIND, id = %id, expected = %expected, "conflicting edit");
                Err(ActionError::ConcurrencyConflict { kind: E::KIND, id })
            }
            Err(err) => {
                warn!(kind = %E::KIND, id = %id, error = %err, "update rejected by store");
                Ok(FormOutcome::Invalid(
                    view.with_submission(&form, vec![FieldError::model(SAVE_FAILED_MESSAGE)]),
                ))
            }
        }
    }

    // ========== Delete ==========

    pub async fn delete_form(&self, caller: &Caller, id: Option<EntityId>) -> Result<DeleteView> {
        self.authorize(caller, Action::Delete)?;

        let entity = self.load(id).await?;
        Ok(DeleteView::for_entity(&entity))
    }

    pub async fn delete(&self, caller: &Caller, id: Option<EntityId>) -> Result<DeleteOutcome> {
        self.authorize(caller, Action::Delete)?;

        let existing = self.load(id).await?;
        let id = existing.id();

        match self.store.remove(id).await {
            Ok(()) => {
                info!(kind = %E::KIND, id = %id, "deleted");
                Ok(DeleteOutcome::Deleted {
                    location: self.list_location(),
                })
            }
            Err(RepositoryError::ReferentialIntegrity { .. }) => {
                warn!(kind = %E::KIND, id = %id, "delete blocked by dependent records");
                Ok(DeleteOutcome::Blocked(
                    DeleteView::for_entity(&existing).with_error(E::KIND.in_use_message()),
                ))
            }
            // Gone between the read and the delete
            Err(RepositoryError::NotFound { .. } | RepositoryError::ConcurrencyConflict { .. }) => {
                Err(ActionError::not_found(E::KIND, Some(id)))
            }
            Err(err) => {
                warn!(kind = %E::KIND, id = %id, error = %err, "delete rejected by store");
                Ok(DeleteOutcome::Blocked(
                    DeleteView::for_entity(&existing).with_error(SAVE_FAILED_MESSAGE),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::tests::MapPreferences;
    use crate::preferences::PAGE_SIZE_KEY;
    use jobbank_domain::{EntityDraft, Role, Skill, SortOrder};
    use std::collections::{BTreeMap, HashSet};
    use std::future::Future;
    use std::sync::Mutex;

    #[derive(Default)]
    struct State {
        rows: BTreeMap<i64, (String, i64)>,
        next_id: i64,
        referenced: HashSet<i64>,
        calls: usize,
        writes: usize,
        fail_writes: bool,
        vanish_on_update: bool,
        vanish_on_remove: bool,
    }

    /// In-memory skill store with knobs for the failure paths
    #[derive(Default)]
    struct TestStore {
        state: Mutex<State>,
    }

    impl TestStore {
        fn seeded(names: &[&str]) -> Self {
            let store = Self::default();
            {
                let mut state = store.state.lock().unwrap();
                for name in names {
                    state.next_id += 1;
                    let id = state.next_id;
                    state.rows.insert(id, (name.to_string(), 1));
                }
            }
            store
        }

        fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
            f(&mut self.state.lock().unwrap())
        }

        fn calls(&self) -> usize {
            self.with(|s| s.calls)
        }

        fn writes(&self) -> usize {
            self.with(|s| s.writes)
        }

        fn name_of(&self, id: i64) -> Option<String> {
            self.with(|s| s.rows.get(&id).map(|(name, _)| name.clone()))
        }
    }

    fn skill(id: i64, row: &(String, i64)) -> Skill {
        Skill::restore(EntityId::new(id), row.0.clone(), RowVersion::new(row.1))
    }

    fn not_found(id: EntityId) -> RepositoryError {
        RepositoryError::NotFound {
            kind: EntityKind::Skill,
            id,
        }
    }

    impl EntityStore<Skill> for TestStore {
        fn list(&self, _order: SortOrder) -> impl Future<Output = std::result::Result<Vec<Skill>, RepositoryError>> + Send {
            let rows = self.with(|s| {
                s.calls += 1;
                let mut rows: Vec<Skill> = s.rows.iter().map(|(id, row)| skill(*id, row)).collect();
                rows.sort_by_key(|r| r.name().to_lowercase());
                rows
            });
            async move { Ok(rows) }
        }

        fn count(&self) -> impl Future<Output = std::result::Result<u64, RepositoryError>> + Send {
            let n = self.with(|s| {
                s.calls += 1;
                s.rows.len() as u64
            });
            async move { Ok(n) }
        }

        fn list_page(
            &self,
            skip: u64,
            take: u64,
        ) -> impl Future<Output = std::result::Result<Vec<Skill>, RepositoryError>> + Send {
            let rows = self.with(|s| {
                s.calls += 1;
                let mut rows: Vec<Skill> = s.rows.iter().map(|(id, row)| skill(*id, row)).collect();
                rows.sort_by_key(|r| r.name().to_lowercase());
                rows.into_iter().skip(skip as usize).take(take as usize).collect::<Vec<_>>()
            });
            async move { Ok(rows) }
        }

        fn find_by_id(
            &self,
            id: EntityId,
        ) -> impl Future<Output = std::result::Result<Option<Skill>, RepositoryError>> + Send {
            let found = self.with(|s| {
                s.calls += 1;
                s.rows.get(&id.value()).map(|row| skill(id.value(), row))
            });
            async move { Ok(found) }
        }

        fn insert(
            &self,
            draft: &EntityDraft,
        ) -> impl Future<Output = std::result::Result<Skill, RepositoryError>> + Send {
            let result = self.with(|s| {
                s.calls += 1;
                if s.fail_writes {
                    return Err(RepositoryError::persistence("disk full"));
                }
                s.next_id += 1;
                s.writes += 1;
                let row = (draft.name().to_string(), 1);
                let created = skill(s.next_id, &row);
                s.rows.insert(s.next_id, row);
                Ok(created)
            });
            async move { result }
        }

        fn update(
            &self,
            id: EntityId,
            expected: RowVersion,
            draft: &EntityDraft,
        ) -> impl Future<Output = std::result::Result<Skill, RepositoryError>> + Send {
            let result = self.with(|s| {
                s.calls += 1;
                if s.vanish_on_update {
                    s.rows.remove(&id.value());
                    return Err(RepositoryError::ConcurrencyConflict {
                        kind: EntityKind::Skill,
                        id,
                    });
                }
                if s.fail_writes {
                    return Err(RepositoryError::persistence("UNIQUE constraint failed"));
                }
                let row = s.rows.get_mut(&id.value()).ok_or(not_found(id))?;
                if row.1 != expected.value() {
                    return Err(RepositoryError::ConcurrencyConflict {
                        kind: EntityKind::Skill,
                        id,
                    });
                }
                *row = (draft.name().to_string(), row.1 + 1);
                s.writes += 1;
                Ok(skill(id.value(), &s.rows[&id.value()]))
            });
            async move { result }
        }

        fn remove(&self, id: EntityId) -> impl Future<Output = std::result::Result<(), RepositoryError>> + Send {
            let result = self.with(|s| {
                s.calls += 1;
                if !s.rows.contains_key(&id.value()) {
                    return Err(not_found(id));
                }
                if s.vanish_on_remove {
                    s.rows.remove(&id.value());
                    return Err(RepositoryError::ConcurrencyConflict {
                        kind: EntityKind::Skill,
                        id,
                    });
                }
                if s.fail_writes {
                    return Err(RepositoryError::persistence("database is locked"));
                }
                if s.referenced.contains(&id.value()) {
                    return Err(RepositoryError::ReferentialIntegrity {
                        kind: EntityKind::Skill,
                        id,
                    });
                }
                s.rows.remove(&id.value());
                s.writes += 1;
                Ok(())
            });
            async move { result }
        }
    }

    fn controller(store: TestStore) -> EntityController<Skill, TestStore> {
        EntityController::new(store, AccessPolicy::default())
    }

    fn admin() -> Caller {
        Caller::new("ana", [Role::Admin])
    }

    fn id(n: i64) -> Option<EntityId> {
        Some(EntityId::new(n))
    }

    #[tokio::test]
    async fn test_create_adds_exactly_one() {
        let ctl = controller(TestStore::seeded(&["Baking", "Welding"]));
        let mut prefs = MapPreferences::default();

        let before = ctl.list(&admin(), ListQuery::default(), &mut prefs).await.unwrap();
        let outcome = ctl.create(&admin(), EntityForm::new("Carpentry")).await.unwrap();
        let after = ctl.list(&admin(), ListQuery::default(), &mut prefs).await.unwrap();

        assert_eq!(
            outcome,
            FormOutcome::Saved {
                location: "/Skills".into()
            }
        );
        assert_eq!(after.total_count, before.total_count + 1);
        assert_eq!(
            after.items.iter().filter(|i| i.name == "Carpentry").count(),
            1
        );
    }

    #[tokio::test]
    async fn test_create_blank_name_redisplays() {
        let ctl = controller(TestStore::default());

        let outcome = ctl.create(&admin(), EntityForm::new("  ")).await.unwrap();

        let FormOutcome::Invalid(view) = outcome else {
            panic!("expected redisplay");
        };
        assert_eq!(view.name, "  ");
        assert_eq!(view.errors[0].field, Some("Name"));
        assert_eq!(ctl.store().writes(), 0);
    }

    #[tokio::test]
    async fn test_create_store_rejection_redisplays() {
        let store = TestStore::default();
        store.with(|s| s.fail_writes = true);
        let ctl = controller(store);

        let outcome = ctl.create(&admin(), EntityForm::new("Welding")).await.unwrap();

        let FormOutcome::Invalid(view) = outcome else {
            panic!("expected redisplay");
        };
        assert_eq!(view.name, "Welding");
        assert_eq!(view.errors[0].field, None);
        assert_eq!(view.errors[0].message, SAVE_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_edit_missing_entity_is_not_found() {
        let ctl = controller(TestStore::seeded(&["Baking"]));

        let err = ctl
            .edit(&admin(), id(99), EntityForm::new("Anything"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::NotFound { .. }));

        let err = ctl
            .edit(&admin(), None, EntityForm::new("Anything"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::NotFound { id: None, .. }));

        assert_eq!(ctl.store().writes(), 0);
    }

    #[tokio::test]
    async fn test_edit_renames_and_bumps_version() {
        let ctl = controller(TestStore::seeded(&["Baking"]));

        let form = ctl.edit_form(&admin(), id(1)).await.unwrap();
        assert_eq!(form.row_version, Some(1));

        let outcome = ctl
            .edit(&admin(), id(1), EntityForm::new("Pastry"), Some(RowVersion::new(1)))
            .await
            .unwrap();

        assert!(matches!(outcome, FormOutcome::Saved { .. }));
        let details = ctl.details(&admin(), id(1)).await.unwrap();
        assert_eq!(details.name, "Pastry");
        assert_eq!(details.row_version, 2);
    }

    #[tokio::test]
    async fn test_second_of_two_edits_conflicts() {
        let ctl = controller(TestStore::seeded(&["Baking"]));
        let seen = RowVersion::new(1);

        ctl.edit(&admin(), id(1), EntityForm::new("Pastry"), Some(seen))
            .await
            .unwrap();
        let err = ctl
            .edit(&admin(), id(1), EntityForm::new("Bread"), Some(seen))
            .await
            .unwrap_err();

        assert!(matches!(err, ActionError::ConcurrencyConflict { .. }));
        assert_eq!(ctl.store().name_of(1).as_deref(), Some("Pastry"));
    }

    #[tokio::test]
    async fn test_edit_of_row_deleted_meanwhile_is_not_found() {
        let store = TestStore::seeded(&["Baking"]);
        store.with(|s| s.vanish_on_update = true);
        let ctl = controller(store);

        let err = ctl
            .edit(&admin(), id(1), EntityForm::new("Pastry"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ActionError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_edit_store_rejection_keeps_input() {
        let store = TestStore::seeded(&["Baking"]);
        store.with(|s| s.fail_writes = true);
        let ctl = controller(store);

        let outcome = ctl
            .edit(&admin(), id(1), EntityForm::new("Welding"), None)
            .await
            .unwrap();

        let FormOutcome::Invalid(view) = outcome else {
            panic!("expected redisplay");
        };
        assert_eq!(view.id, Some(1));
        assert_eq!(view.name, "Welding");
        assert_eq!(view.errors[0].message, SAVE_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_delete_referenced_entity_is_blocked() {
        let store = TestStore::seeded(&["Baking"]);
        store.with(|s| {
            s.referenced.insert(1);
        });
        let ctl = controller(store);

        let outcome = ctl.delete(&admin(), id(1)).await.unwrap();

        let DeleteOutcome::Blocked(view) = outcome else {
            panic!("expected blocked delete");
        };
        assert_eq!(view.error.as_deref(), Some(EntityKind::Skill.in_use_message()));
        assert_eq!(ctl.store().name_of(1).as_deref(), Some("Baking"));
        assert_eq!(ctl.store().writes(), 0);
    }

    #[tokio::test]
    async fn test_delete_store_rejection_offers_retry() {
        let store = TestStore::seeded(&["Baking"]);
        store.with(|s| s.fail_writes = true);
        let ctl = controller(store);

        let outcome = ctl.delete(&admin(), id(1)).await.unwrap();

        let DeleteOutcome::Blocked(view) = outcome else {
            panic!("expected blocked delete");
        };
        assert_eq!(view.error.as_deref(), Some(SAVE_FAILED_MESSAGE));
        assert_eq!(view.entity.name, "Baking");
        assert_eq!(ctl.store().name_of(1).as_deref(), Some("Baking"));
    }

    #[tokio::test]
    async fn test_delete_of_row_removed_meanwhile_is_not_found() {
        let store = TestStore::seeded(&["Baking"]);
        store.with(|s| s.vanish_on_remove = true);
        let ctl = controller(store);

        let err = ctl.delete(&admin(), id(1)).await.unwrap_err();

        assert!(matches!(err, ActionError::NotFound { id: Some(_), .. }));
        assert_eq!(ctl.store().name_of(1), None);
    }

    #[tokio::test]
    async fn test_delete_removes_entity() {
        let ctl = controller(TestStore::seeded(&["Baking"]));

        let confirm = ctl.delete_form(&admin(), id(1)).await.unwrap();
        assert_eq!(confirm.entity.name, "Baking");

        let outcome = ctl.delete(&admin(), id(1)).await.unwrap();
        assert!(matches!(outcome, DeleteOutcome::Deleted { .. }));
        assert!(matches!(
            ctl.details(&admin(), id(1)).await,
            Err(ActionError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_forbidden_before_any_store_access() {
        let ctl = controller(TestStore::seeded(&["Baking"]));
        let staff = Caller::new("stu", [Role::Staff]);
        let mut prefs = MapPreferences::default();

        assert!(ctl.list(&staff, ListQuery::default(), &mut prefs).await.is_err());
        assert!(ctl.details(&staff, id(1)).await.is_err());
        assert!(ctl.create_form(&staff).is_err());
        assert!(ctl.create(&staff, EntityForm::new("X")).await.is_err());
        assert!(ctl.edit_form(&staff, id(1)).await.is_err());
        assert!(ctl.edit(&staff, id(1), EntityForm::new("X"), None).await.is_err());
        assert!(ctl.delete_form(&staff, id(1)).await.is_err());
        let err = ctl.delete(&staff, id(1)).await.unwrap_err();

        assert!(matches!(err, ActionError::Forbidden { .. }));
        assert_eq!(ctl.store().calls(), 0);
        assert!(prefs.values.is_empty());
    }

    #[tokio::test]
    async fn test_list_pages_and_remembers_size() {
        let names = ["A", "B", "C", "D", "E", "F", "G"];
        let ctl = controller(TestStore::seeded(&names));
        let mut prefs = MapPreferences::default();

        let first = ctl
            .list(&admin(), ListQuery { page: None, page_size: Some(3) }, &mut prefs)
            .await
            .unwrap();
        assert_eq!(first.items.len(), 3);
        assert!(first.has_next_page);
        assert!(!first.has_previous_page);
        assert_eq!(prefs.values[PAGE_SIZE_KEY].0, "3");

        let clamped = ctl
            .list(&admin(), ListQuery { page: Some(10), page_size: None }, &mut prefs)
            .await
            .unwrap();
        assert_eq!(clamped.page_index, 3);
        assert_eq!(clamped.items.len(), 1);
        assert_eq!(clamped.items[0].name, "G");
        assert!(!clamped.has_next_page);
        assert!(clamped.has_previous_page);
    }

    #[tokio::test]
    async fn test_details_without_id_is_not_found() {
        let ctl = controller(TestStore::seeded(&["Baking"]));

        let err = ctl.details(&admin(), None).await.unwrap_err();
        assert!(matches!(err, ActionError::NotFound { id: None, .. }));
        assert_eq!(ctl.store().calls(), 0);
    }
}
