//! SQLite Repository Implementation
//!
//! One table per entity kind, each with `id`, `name` and `row_version`.
//! Dependent tables (applicants, applicant skills) hold the foreign keys
//! that make deletes fail with `ReferentialIntegrity`.

use std::future::Future;
use std::marker::PhantomData;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use jobbank_domain::{
    CatalogEntity, EntityDraft, EntityId, EntityStore, RepositoryError, RetrainingProgram,
    RowVersion, Skill, SortOrder,
};

/// Errors raised while opening or migrating the database
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("failed to open database: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("failed to migrate database: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Connection pool plus the embedded schema
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) the database at `url`
    pub async fn connect(url: &str) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str(url)?
            .foreign_keys(true)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        info!(url = %url, "Opened database");
        Ok(Self { pool })
    }

    /// A private in-memory database, kept alive on a single connection
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Apply pending migrations from `migrations/`
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        debug!("Database schema is up to date");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn skills(&self) -> SqliteEntityStore<Skill> {
        SqliteEntityStore::new(self.pool.clone())
    }

    pub fn retraining_programs(&self) -> SqliteEntityStore<RetrainingProgram> {
        SqliteEntityStore::new(self.pool.clone())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EntityRow {
    id: i64,
    name: String,
    row_version: i64,
}

impl EntityRow {
    fn into_entity<E: CatalogEntity>(self) -> E {
        E::restore(
            EntityId::new(self.id),
            self.name,
            RowVersion::new(self.row_version),
        )
    }
}

fn store_error(err: sqlx::Error) -> RepositoryError {
    RepositoryError::persistence(err.to_string())
}

/// SQLite-backed entity store
pub struct SqliteEntityStore<E> {
    pool: SqlitePool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for SqliteEntityStore<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: CatalogEntity> SqliteEntityStore<E> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    fn table() -> &'static str {
        E::KIND.table()
    }

    async fn fetch_one_by_id(&self, id: EntityId) -> Result<Option<E>, RepositoryError> {
        let sql = format!(
            "SELECT id, name, row_version FROM {} WHERE id = ?",
            Self::table()
        );
        let row = sqlx::query_as::<_, EntityRow>(&sql)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.map(EntityRow::into_entity))
    }
}

impl<E: CatalogEntity> EntityStore<E> for SqliteEntityStore<E> {
    fn list(&self, order: SortOrder) -> impl Future<Output = Result<Vec<E>, RepositoryError>> + Send {
        async move {
            let order_by = match order {
                SortOrder::ById => "id",
                SortOrder::ByName => "name COLLATE NOCASE, id",
            };
            let sql = format!(
                "SELECT id, name, row_version FROM {} ORDER BY {}",
                Self::table(),
                order_by
            );
            let rows = sqlx::query_as::<_, EntityRow>(&sql)
                .fetch_all(&self.pool)
                .await
                .map_err(store_error)?;
            Ok(rows.into_iter().map(EntityRow::into_entity).collect())
        }
    }

    fn count(&self) -> impl Future<Output = Result<u64, RepositoryError>> + Send {
        async move {
            let sql = format!("SELECT COUNT(*) FROM {}", Self::table());
            let count: i64 = sqlx::query_scalar(&sql)
                .fetch_one(&self.pool)
                .await
                .map_err(store_error)?;
            Ok(count.max(0) as u64)
        }
    }

    fn list_page(
        &self,
        skip: u64,
        take: u64,
    ) -> impl Future<Output = Result<Vec<E>, RepositoryError>> + Send {
        async move {
            let sql = format!(
                "SELECT id, name, row_version FROM {} ORDER BY name COLLATE NOCASE, id LIMIT ? OFFSET ?",
                Self::table()
            );
            let rows = sqlx::query_as::<_, EntityRow>(&sql)
                .bind(i64::try_from(take).unwrap_or(i64::MAX))
                .bind(i64::try_from(skip).unwrap_or(i64::MAX))
                .fetch_all(&self.pool)
                .await
                .map_err(store_error)?;
            Ok(rows.into_iter().map(EntityRow::into_entity).collect())
        }
    }

    fn find_by_id(&self, id: EntityId) -> impl Future<Output = Result<Option<E>, RepositoryError>> + Send {
        self.fetch_one_by_id(id)
    }

    fn insert(&self, draft: &EntityDraft) -> impl Future<Output = Result<E, RepositoryError>> + Send {
        let name = draft.name().to_string();
        async move {
            let sql = format!(
                "INSERT INTO {} (name, row_version) VALUES (?, ?) RETURNING id, name, row_version",
                Self::table()
            );
            let row = sqlx::query_as::<_, EntityRow>(&sql)
                .bind(name)
                .bind(RowVersion::initial().value())
                .fetch_one(&self.pool)
                .await
                .map_err(store_error)?;
            debug!(kind = %E::KIND, id = row.id, "Inserted row");
            Ok(row.into_entity())
        }
    }

    fn update(
        &self,
        id: EntityId,
        expected: RowVersion,
        draft: &EntityDraft,
    ) -> impl Future<Output = Result<E, RepositoryError>> + Send {
        let name = draft.name().to_string();
        async move {
            if self.fetch_one_by_id(id).await?.is_none() {
                return Err(RepositoryError::NotFound { kind: E::KIND, id });
            }

            let sql = format!(
                "UPDATE {} SET name = ?, row_version = row_version + 1 \
                 WHERE id = ? AND row_version = ? RETURNING id, name, row_version",
                Self::table()
            );
            let row = sqlx::query_as::<_, EntityRow>(&sql)
                .bind(name)
                .bind(id.value())
                .bind(expected.value())
                .fetch_optional(&self.pool)
                .await
                .map_err(store_error)?;

            match row {
                Some(row) => {
                    debug!(kind = %E::KIND, id = row.id, version = row.row_version, "Updated row");
                    Ok(row.into_entity())
                }
                None => Err(RepositoryError::ConcurrencyConflict { kind: E::KIND, id }),
            }
        }
    }

    fn remove(&self, id: EntityId) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        async move {
            if self.fetch_one_by_id(id).await?.is_none() {
                return Err(RepositoryError::NotFound { kind: E::KIND, id });
            }

            let sql = format!("DELETE FROM {} WHERE id = ?", Self::table());
            let result = sqlx::query(&sql)
                .bind(id.value())
                .execute(&self.pool)
                .await
                .map_err(|err| match &err {
                    sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                        RepositoryError::ReferentialIntegrity { kind: E::KIND, id }
                    }
                    _ => store_error(err),
                })?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::ConcurrencyConflict { kind: E::KIND, id });
            }
            debug!(kind = %E::KIND, id = %id, "Deleted row");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobbank_domain::EntityForm;

    async fn database() -> Database {
        let db = Database::in_memory().await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn draft(name: &str) -> EntityDraft {
        EntityForm::new(name).validate().unwrap()
    }

    async fn enroll_applicant(db: &Database, program: EntityId) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO applicants (first_name, last_name, retraining_program_id) \
             VALUES ('Ada', 'Lovelace', ?) RETURNING id",
        )
        .bind(program.value())
        .fetch_one(db.pool())
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let db = database().await;
        let skills = db.skills();

        let skill = skills.insert(&draft("Welding")).await.unwrap();
        assert_eq!(skill.name(), "Welding");
        assert_eq!(skill.row_version(), RowVersion::initial());

        let found = skills.find_by_id(skill.id()).await.unwrap().unwrap();
        assert_eq!(found, skill);
        assert!(skills.find_by_id(EntityId::new(999)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_page_orders_by_name() {
        let db = database().await;
        let skills = db.skills();
        for name in ["welding", "Baking", "carpentry", "Drywall"] {
            skills.insert(&draft(name)).await.unwrap();
        }

        assert_eq!(skills.count().await.unwrap(), 4);

        let page: Vec<String> = skills
            .list_page(1, 2)
            .await
            .unwrap()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(page, vec!["carpentry", "Drywall"]);

        let by_id = skills.list(SortOrder::ById).await.unwrap();
        assert_eq!(by_id[0].name(), "welding");
    }

    #[tokio::test]
    async fn test_duplicate_name_is_persistence_error() {
        let db = database().await;
        let programs = db.retraining_programs();
        programs.insert(&draft("Forklift")).await.unwrap();

        let err = programs.insert(&draft("FORKLIFT")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::PersistenceError { .. }));
    }

    #[tokio::test]
    async fn test_update_bumps_version_and_detects_conflicts() {
        let db = database().await;
        let skills = db.skills();
        let skill = skills.insert(&draft("Welding")).await.unwrap();

        let updated = skills
            .update(skill.id(), skill.row_version(), &draft("Arc Welding"))
            .await
            .unwrap();
        assert_eq!(updated.name(), "Arc Welding");
        assert_eq!(updated.row_version(), RowVersion::new(2));

        let stale = skills
            .update(skill.id(), skill.row_version(), &draft("Stale"))
            .await
            .unwrap_err();
        assert!(matches!(stale, RepositoryError::ConcurrencyConflict { .. }));

        let missing = skills
            .update(EntityId::new(42), RowVersion::initial(), &draft("Ghost"))
            .await
            .unwrap_err();
        assert!(matches!(missing, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_remove_blocked_by_enrolled_applicants() {
        let db = database().await;
        let programs = db.retraining_programs();
        let program = programs.insert(&draft("Forklift")).await.unwrap();
        let applicant = enroll_applicant(&db, program.id()).await;

        let err = programs.remove(program.id()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ReferentialIntegrity { .. }));

        sqlx::query("DELETE FROM applicants WHERE id = ?")
            .bind(applicant)
            .execute(db.pool())
            .await
            .unwrap();
        programs.remove(program.id()).await.unwrap();

        let gone = programs.remove(program.id()).await.unwrap_err();
        assert!(matches!(gone, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_remove_skill_noted_for_applicant() {
        let db = database().await;
        let program = db.retraining_programs().insert(&draft("Forklift")).await.unwrap();
        let skills = db.skills();
        let skill = skills.insert(&draft("Welding")).await.unwrap();
        let applicant = enroll_applicant(&db, program.id()).await;

        sqlx::query("INSERT INTO applicant_skills (applicant_id, skill_id) VALUES (?, ?)")
            .bind(applicant)
            .bind(skill.id().value())
            .execute(db.pool())
            .await
            .unwrap();

        let err = skills.remove(skill.id()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ReferentialIntegrity { .. }));
        assert!(skills.exists(skill.id()).await.unwrap());
    }
}
