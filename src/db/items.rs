use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{ItemStore, StoreError};
use crate::models::item::{ItemStatus, LabelItem, Priority};

const ITEM_COLUMNS: &str = "id, blob_key, original_name, file_size, mime_type, status, \
     label_count, labels, priority, last_labeled_at, created_at, updated_at";

/// Item store on the `label_items` table.
#[derive(Clone)]
pub struct PgItemStore {
    pool: PgPool,
}

impl PgItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn item_from_row(row: &PgRow) -> Result<LabelItem, StoreError> {
    let status: String = row.try_get("status")?;
    let priority: Option<String> = row.try_get("priority")?;

    Ok(LabelItem {
        id: row.try_get("id")?,
        blob_key: row.try_get("blob_key")?,
        original_name: row.try_get("original_name")?,
        file_size: row.try_get("file_size")?,
        mime_type: row.try_get("mime_type")?,
        status: status.parse::<ItemStatus>().unwrap_or_default(),
        label_count: row.try_get("label_count")?,
        labels: row.try_get("labels")?,
        priority: Priority::from_stored(priority.as_deref()),
        last_labeled_at: row.try_get("last_labeled_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn insert(&self, item: &LabelItem) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO label_items
                (id, blob_key, original_name, file_size, mime_type, status,
                 label_count, labels, priority, last_labeled_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(item.id)
        .bind(&item.blob_key)
        .bind(&item.original_name)
        .bind(item.file_size)
        .bind(&item.mime_type)
        .bind(item.status.to_string())
        .bind(item.label_count)
        .bind(&item.labels)
        .bind(item.priority.to_string())
        .bind(item.last_labeled_at)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<LabelItem>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM label_items WHERE id = $1", ITEM_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(item_from_row).transpose()
    }

    async fn below_threshold(&self, threshold: i32) -> Result<Vec<LabelItem>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM label_items WHERE label_count < $1",
            ITEM_COLUMNS
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(item_from_row).collect()
    }

    async fn append_label(
        &self,
        id: Uuid,
        label: &str,
        at: DateTime<Utc>,
        threshold: i32,
    ) -> Result<Option<LabelItem>, StoreError> {
        // Single-row UPDATE: concurrent submissions serialize on the row lock.
        let row = sqlx::query(&format!(
            r#"
            UPDATE label_items
            SET labels = array_append(labels, $2),
                label_count = label_count + 1,
                status = CASE
                    WHEN label_count + 1 >= $4 THEN '{labeled}'
                    ELSE '{in_progress}'
                END,
                last_labeled_at = $3,
                updated_at = $3
            WHERE id = $1
            RETURNING {columns}
            "#,
            labeled = ItemStatus::Labeled,
            in_progress = ItemStatus::InProgress,
            columns = ITEM_COLUMNS,
        ))
        .bind(id)
        .bind(label)
        .bind(at)
        .bind(threshold)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(item_from_row).transpose()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
