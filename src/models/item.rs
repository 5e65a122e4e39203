use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Priority tier of an audio clip. Higher tiers preempt lower ones during selection.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, EnumString, Display, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Read a stored priority. Absent or unrecognized values fall back to medium.
    pub fn from_stored(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

/// Labeling progress of an item. Informational; selection never reads it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Unlabeled,
    InProgress,
    Labeled,
}

/// Upload metadata captured when a clip is registered.
#[derive(Debug, Clone)]
pub struct UploadMeta {
    pub original_name: String,
    pub file_size: i64,
    pub mime_type: String,
}

/// A unit of audio awaiting one or more human labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelItem {
    pub id: Uuid,
    pub blob_key: String,
    pub original_name: String,
    pub file_size: i64,
    pub mime_type: String,
    pub status: ItemStatus,
    pub label_count: i32,
    pub labels: Vec<String>,
    pub priority: Priority,
    pub last_labeled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LabelItem {
    /// Build a freshly uploaded item: no labels, status unlabeled.
    pub fn register(
        blob_key: impl Into<String>,
        priority: Priority,
        meta: UploadMeta,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            blob_key: blob_key.into(),
            original_name: meta.original_name,
            file_size: meta.file_size,
            mime_type: meta.mime_type,
            status: ItemStatus::Unlabeled,
            label_count: 0,
            labels: Vec::new(),
            priority,
            last_labeled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply one accepted label submission.
    ///
    /// The threshold only drives `status`; an item already at or past it
    /// still takes the label.
    pub fn record_label(&mut self, label: impl Into<String>, at: DateTime<Utc>, threshold: i32) {
        self.labels.push(label.into());
        self.label_count += 1;
        self.last_labeled_at = Some(at);
        self.updated_at = at;
        self.status = status_after(self.label_count, threshold);
    }

    /// Last path segment of the blob key, used as a display name.
    pub fn filename(&self) -> &str {
        self.blob_key
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("audio")
    }
}

/// Status an item carries once it holds `label_count` labels.
pub fn status_after(label_count: i32, threshold: i32) -> ItemStatus {
    if label_count >= threshold {
        ItemStatus::Labeled
    } else if label_count > 0 {
        ItemStatus::InProgress
    } else {
        ItemStatus::Unlabeled
    }
}

/// Key under which an uploaded clip is stored.
pub fn blob_key_for(priority: Priority, original_name: &str, now: DateTime<Utc>) -> String {
    format!("audio/{}/{}-{}", priority, now.timestamp_millis(), original_name)
}
