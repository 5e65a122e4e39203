use chrono::Duration;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:5000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Redis connection string. Item leases are off without it.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// How long a served item stays hidden from other labelers. 0 disables leases.
    #[serde(default)]
    pub lease_secs: u64,

    /// Bucket holding the audio clips
    pub s3_bucket: String,

    /// AWS region name, or the signing region for a custom endpoint
    #[serde(default = "default_s3_region")]
    pub s3_region: String,

    /// Custom S3-compatible endpoint (R2, MinIO)
    #[serde(default)]
    pub s3_endpoint: Option<String>,

    pub s3_access_key: String,

    pub s3_secret_key: String,

    #[serde(default)]
    pub s3_path_style: bool,

    /// HS256 signing secret for bearer tokens
    pub jwt_secret: String,

    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,

    pub admin_email: String,

    pub admin_password: String,

    /// Label count at which an item stops being served
    #[serde(default = "default_label_threshold")]
    pub label_threshold: i32,

    /// Skip items labeled this recently. 0 disables the cooldown.
    #[serde(default)]
    pub label_cooldown_secs: i64,

    #[serde(default = "default_presign_expiry_secs")]
    pub presign_expiry_secs: u32,

    /// Per-file upload limit
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,

    /// Whole-request upload limit
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_s3_region() -> String {
    "us-east-1".to_string()
}

fn default_token_ttl_hours() -> i64 {
    24
}

fn default_label_threshold() -> i32 {
    3
}

fn default_presign_expiry_secs() -> u32 {
    3600
}

fn default_max_file_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_max_upload_bytes() -> usize {
    200 * 1024 * 1024
}

fn default_bcrypt_cost() -> u32 {
    12
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn labeling(&self) -> LabelingPolicy {
        LabelingPolicy {
            threshold: self.label_threshold,
            cooldown: (self.label_cooldown_secs > 0)
                .then(|| Duration::seconds(self.label_cooldown_secs)),
            presign_expiry_secs: self.presign_expiry_secs,
            max_file_bytes: self.max_file_bytes,
            max_upload_bytes: self.max_upload_bytes,
            bcrypt_cost: self.bcrypt_cost,
        }
    }

    pub fn admin(&self) -> AdminCredentials {
        AdminCredentials {
            email: self.admin_email.clone(),
            password: self.admin_password.clone(),
        }
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::hours(self.token_ttl_hours)
    }

    /// Redis URL when leases are enabled.
    pub fn lease_redis_url(&self) -> Option<&str> {
        self.redis_url
            .as_deref()
            .filter(|url| !url.is_empty() && self.lease_secs > 0)
    }
}

/// Knobs for serving and recording labels.
#[derive(Debug, Clone)]
pub struct LabelingPolicy {
    pub threshold: i32,
    pub cooldown: Option<Duration>,
    pub presign_expiry_secs: u32,
    pub max_file_bytes: usize,
    pub max_upload_bytes: usize,
    pub bcrypt_cost: u32,
}

impl Default for LabelingPolicy {
    fn default() -> Self {
        Self {
            threshold: default_label_threshold(),
            cooldown: None,
            presign_expiry_secs: default_presign_expiry_secs(),
            max_file_bytes: default_max_file_bytes(),
            max_upload_bytes: default_max_upload_bytes(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

/// The configured administrator account.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

impl AdminCredentials {
    pub fn matches(&self, email: &str, password: &str) -> bool {
        !self.email.is_empty() && self.email == email && self.password == password
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required() -> Vec<(String, String)> {
        [
            ("DATABASE_URL", "postgres://localhost/labels"),
            ("S3_BUCKET", "clips"),
            ("S3_ACCESS_KEY", "ak"),
            ("S3_SECRET_KEY", "sk"),
            ("JWT_SECRET", "secret"),
            ("ADMIN_EMAIL", "admin@example.com"),
            ("ADMIN_PASSWORD", "pw"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_defaults() {
        let config: AppConfig = envy::from_iter(required()).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert_eq!(config.label_threshold, 3);
        assert_eq!(config.presign_expiry_secs, 3600);
        assert_eq!(config.token_ttl(), Duration::hours(24));

        let policy = config.labeling();
        assert!(policy.cooldown.is_none());
        assert_eq!(policy.max_file_bytes, 10 * 1024 * 1024);
        assert!(config.lease_redis_url().is_none());
    }

    #[test]
    fn test_cooldown_and_leases() {
        let mut vars = required();
        vars.push(("LABEL_COOLDOWN_SECS".to_string(), "600".to_string()));
        vars.push(("REDIS_URL".to_string(), "redis://127.0.0.1/".to_string()));
        vars.push(("LEASE_SECS".to_string(), "120".to_string()));
        let config: AppConfig = envy::from_iter(vars).unwrap();

        assert_eq!(config.labeling().cooldown, Some(Duration::minutes(10)));
        assert_eq!(config.lease_redis_url(), Some("redis://127.0.0.1/"));
    }

    #[test]
    fn test_missing_required() {
        let result: Result<AppConfig, _> = envy::from_iter(Vec::<(String, String)>::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_admin_match() {
        let admin = AdminCredentials {
            email: "admin@example.com".to_string(),
            password: "pw".to_string(),
        };
        assert!(admin.matches("admin@example.com", "pw"));
        assert!(!admin.matches("admin@example.com", "nope"));
        assert!(!admin.matches("other@example.com", "pw"));
    }
}
