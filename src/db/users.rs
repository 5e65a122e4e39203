use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::{IdentityStore, StoreError};
use crate::models::user::{Role, UserRecord};

/// Identity store on the `users` table.
#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<UserRecord, StoreError> {
    let role: String = row.try_get("role")?;
    let role = role
        .parse::<Role>()
        .map_err(|_| StoreError::Corrupt(format!("unknown role '{}'", role)))?;

    Ok(UserRecord {
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        password_hash: row.try_get("password_hash")?,
        role,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn get(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT email, name, password_hash, role, is_active, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert_new(&self, user: &UserRecord) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, name, password_hash, role, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.to_string())
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<UserRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT email, name, password_hash, role, is_active, created_at
            FROM users
            WHERE role = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(role.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }
}
