use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use uuid::Uuid;

use crate::models::item::LabelItem;
use crate::models::user::{Role, UserRecord};

pub mod items;
pub mod users;

pub use items::PgItemStore;
pub use users::PgIdentityStore;

/// Initialize PostgreSQL connection pool
pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| sqlx::Error::Migrate(Box::new(e)))
}

/// Per-item label state, keyed by item id.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn insert(&self, item: &LabelItem) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<LabelItem>, StoreError>;

    /// Full scan of items with fewer than `threshold` labels.
    async fn below_threshold(&self, threshold: i32) -> Result<Vec<LabelItem>, StoreError>;

    /// Atomically append `label`, bump the count and stamp `at`.
    /// Returns `None` when no item has this id.
    async fn append_label(
        &self,
        id: Uuid,
        label: &str,
        at: DateTime<Utc>,
        threshold: i32,
    ) -> Result<Option<LabelItem>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// User records, keyed by email.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn get(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Insert unless the email is taken. Returns false on a duplicate.
    async fn insert_new(&self, user: &UserRecord) -> Result<bool, StoreError>;

    async fn list_by_role(&self, role: Role) -> Result<Vec<UserRecord>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}
