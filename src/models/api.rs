use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::models::item::{ItemStatus, LabelItem, Priority};
use crate::models::user::PublicUser;

/// POST /api/auth/login body.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[garde(length(min = 1, max = 320))]
    pub email: String,

    #[serde(default)]
    #[garde(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

/// POST /api/audio/create-labeler body.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLabelerRequest {
    #[serde(default)]
    #[garde(length(min = 1, max = 200))]
    pub name: String,

    #[serde(default)]
    #[garde(email)]
    pub email: String,

    #[serde(default)]
    #[garde(length(min = 1, max = 72))]
    pub password: String,
}

/// Response carrying a single user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub message: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct LabelersResponse {
    pub success: bool,
    pub labelers: Vec<PublicUser>,
}

/// POST /api/audio/labeled-items body.
///
/// The stored label is `type_severity` when both parts are given, else `label`.
#[derive(Debug, Deserialize)]
pub struct SubmitLabelRequest {
    #[serde(default)]
    pub id: String,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub severity: Option<String>,
}

impl SubmitLabelRequest {
    pub fn resolved_label(&self) -> Option<String> {
        let present = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        match (present(&self.kind), present(&self.severity)) {
            (Some(kind), Some(severity)) => Some(format!("{}_{}", kind, severity)),
            _ => present(&self.label),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitLabelResponse {
    pub success: bool,
    pub message: String,
    pub label_count: i32,
}

/// An item handed to a labeler, with a temporary access URL.
#[derive(Debug, Serialize, Deserialize)]
pub struct ServedItem {
    pub id: String,
    pub audio_url: String,
    pub label_count: i32,
    pub status: ItemStatus,
    pub priority: Priority,
    pub filename: String,
}

impl ServedItem {
    pub fn new(item: &LabelItem, audio_url: String) -> Self {
        Self {
            id: item.id.to_string(),
            audio_url,
            label_count: item.label_count,
            status: item.status,
            priority: item.priority,
            filename: item.filename().to_string(),
        }
    }
}

/// GET /api/audio/label-items response: zero or one item.
#[derive(Debug, Serialize, Deserialize)]
pub struct LabelItemsResponse {
    pub items: Vec<ServedItem>,
}

#[derive(Debug, Serialize)]
pub struct UploadedFile {
    pub id: String,
    pub original_name: String,
    pub key: String,
    pub status: ItemStatus,
    pub priority: Priority,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub files: Vec<UploadedFile>,
}
