use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin,
    Labeler,
}

/// Identity-store record, keyed by email.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new_labeler(name: String, email: String, password_hash: String) -> Self {
        Self {
            email,
            name,
            password_hash,
            role: Role::Labeler,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// A user as returned to clients. Never carries credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&UserRecord> for PublicUser {
    fn from(user: &UserRecord) -> Self {
        Self {
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            is_active: user.is_active,
            created_at: Some(user.created_at),
        }
    }
}

/// Who is making a request, as established at login and carried in the bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Admin { email: String },
    Labeler { email: String },
}

impl Identity {
    pub fn from_parts(email: String, role: Role) -> Self {
        match role {
            Role::Admin => Identity::Admin { email },
            Role::Labeler => Identity::Labeler { email },
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Identity::Admin { email } | Identity::Labeler { email } => email,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Identity::Admin { .. } => Role::Admin,
            Identity::Labeler { .. } => Role::Labeler,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Identity::Admin { .. })
    }
}
