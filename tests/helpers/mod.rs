//! Test helpers: in-memory collaborators and request builders for driving the router.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use audio_label_hw::app_state::AppState;
use audio_label_hw::config::{AdminCredentials, LabelingPolicy};
use audio_label_hw::db::{IdentityStore, ItemStore, StoreError};
use audio_label_hw::models::item::{LabelItem, Priority, UploadMeta};
use audio_label_hw::models::user::{Identity, Role, UserRecord};
use audio_label_hw::routes;
use audio_label_hw::services::auth::TokenService;
use audio_label_hw::services::lease::{LeaseError, LeaseStore};
use audio_label_hw::services::selector;
use audio_label_hw::services::storage::{BlobStore, StorageError};

pub const JWT_SECRET: &str = "test-secret";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-pass";
pub const BOUNDARY: &str = "----audio-label-test-boundary";

/// Item store backed by a map. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryItemStore {
    items: Arc<Mutex<HashMap<Uuid, LabelItem>>>,
}

impl MemoryItemStore {
    pub fn put(&self, item: LabelItem) {
        self.items.lock().unwrap().insert(item.id, item);
    }

    pub fn find(&self, id: Uuid) -> Option<LabelItem> {
        self.items.lock().unwrap().get(&id).cloned()
    }

    pub fn all(&self) -> Vec<LabelItem> {
        self.items.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn insert(&self, item: &LabelItem) -> Result<(), StoreError> {
        self.put(item.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<LabelItem>, StoreError> {
        Ok(self.find(id))
    }

    async fn below_threshold(&self, threshold: i32) -> Result<Vec<LabelItem>, StoreError> {
        let items = self.all();
        Ok(selector::below_threshold(&items, threshold)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn append_label(
        &self,
        id: Uuid,
        label: &str,
        at: DateTime<Utc>,
        threshold: i32,
    ) -> Result<Option<LabelItem>, StoreError> {
        let mut items = self.items.lock().unwrap();
        Ok(items.get_mut(&id).map(|item| {
            item.record_label(label, at, threshold);
            item.clone()
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Identity store backed by a map keyed by email.
#[derive(Clone, Default)]
pub struct MemoryIdentityStore {
    users: Arc<Mutex<HashMap<String, UserRecord>>>,
}

impl MemoryIdentityStore {
    pub fn put(&self, user: UserRecord) {
        self.users.lock().unwrap().insert(user.email.clone(), user);
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn get(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.lock().unwrap().get(email).cloned())
    }

    async fn insert_new(&self, user: &UserRecord) -> Result<bool, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.email) {
            return Ok(false);
        }
        users.insert(user.email.clone(), user.clone());
        Ok(true)
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect())
    }
}

/// Blob store that keeps bytes in memory and hands out fake presigned URLs.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryBlobStore {
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn keys(&self) -> Vec<String> {
        self.blobs.lock().unwrap().keys().cloned().collect()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Config("bucket unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, data: &[u8], _content_type: &str) -> Result<String, StorageError> {
        self.check()?;
        self.blobs.lock().unwrap().insert(key.to_string(), data.to_vec());
        Ok(key.to_string())
    }

    async fn presign(&self, key: &str, expiry_secs: u32) -> Result<String, StorageError> {
        self.check()?;
        Ok(format!("https://blobs.test/{}?X-Amz-Expires={}", key, expiry_secs))
    }
}

/// Lease store backed by a set. Clones share the same set.
#[derive(Clone, Default)]
pub struct MemoryLeaseStore {
    held: Arc<Mutex<HashSet<Uuid>>>,
    /// Taken by another labeler after the lookup, so only `acquire` sees them.
    contested: Arc<Mutex<HashSet<Uuid>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryLeaseStore {
    pub fn hold(&self, id: Uuid) {
        self.held.lock().unwrap().insert(id);
    }

    pub fn is_held(&self, id: Uuid) -> bool {
        self.held.lock().unwrap().contains(&id)
    }

    pub fn contest(&self, id: Uuid) {
        self.contested.lock().unwrap().insert(id);
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), LeaseError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LeaseError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection refused",
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl LeaseStore for MemoryLeaseStore {
    async fn leased(&self, ids: &[Uuid]) -> Result<HashSet<Uuid>, LeaseError> {
        self.check()?;
        let held = self.held.lock().unwrap();
        Ok(ids.iter().filter(|id| held.contains(*id)).copied().collect())
    }

    async fn acquire(&self, id: Uuid) -> Result<bool, LeaseError> {
        self.check()?;
        if self.contested.lock().unwrap().contains(&id) {
            return Ok(false);
        }
        Ok(self.held.lock().unwrap().insert(id))
    }

    async fn release(&self, id: Uuid) -> Result<(), LeaseError> {
        self.check()?;
        self.held.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), LeaseError> {
        self.check()
    }
}

/// Router plus handles onto its in-memory collaborators.
pub struct TestApp {
    pub router: Router,
    pub items: MemoryItemStore,
    pub users: MemoryIdentityStore,
    pub blobs: MemoryBlobStore,
    pub leases: MemoryLeaseStore,
    pub tokens: TokenService,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_policy(LabelingPolicy {
            bcrypt_cost: 4,
            ..LabelingPolicy::default()
        })
    }

    pub fn with_policy(policy: LabelingPolicy) -> Self {
        Self::build(policy, false)
    }

    /// Test app with item leases switched on.
    pub fn with_leases() -> Self {
        Self::build(
            LabelingPolicy {
                bcrypt_cost: 4,
                ..LabelingPolicy::default()
            },
            true,
        )
    }

    fn build(policy: LabelingPolicy, leasing: bool) -> Self {
        let items = MemoryItemStore::default();
        let users = MemoryIdentityStore::default();
        let blobs = MemoryBlobStore::default();
        let leases = MemoryLeaseStore::default();

        let mut state = AppState::new(
            items.clone(),
            users.clone(),
            blobs.clone(),
            TokenService::new(JWT_SECRET, Duration::hours(24)),
            policy,
            AdminCredentials {
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
            },
        );
        if leasing {
            state = state.with_leases(leases.clone());
        }

        Self {
            router: routes::router(state),
            items,
            users,
            blobs,
            leases,
            tokens: TokenService::new(JWT_SECRET, Duration::hours(24)),
        }
    }

    pub fn admin_token(&self) -> String {
        self.tokens
            .issue(&Identity::Admin {
                email: ADMIN_EMAIL.to_string(),
            })
            .unwrap()
    }

    pub fn labeler_token(&self, email: &str) -> String {
        self.tokens
            .issue(&Identity::Labeler {
                email: email.to_string(),
            })
            .unwrap()
    }

    /// Send a request and decode the JSON body (Null when empty or not JSON).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(json_request(Method::GET, uri, token, None)).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(json_request(Method::POST, uri, token, Some(body))).await
    }
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// One part of a multipart form.
pub enum Part<'a> {
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

pub fn multipart_request(uri: &str, token: Option<&str>, parts: &[Part<'_>]) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}", name, value)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}

/// A stored item with the given priority and number of labels already recorded.
pub fn seeded_item(name: &str, priority: Priority, label_count: i32) -> LabelItem {
    let now = Utc::now();
    let mut item = LabelItem::register(
        format!("audio/{}/{}-{}", priority, now.timestamp_millis(), name),
        priority,
        UploadMeta {
            original_name: name.to_string(),
            file_size: 128,
            mime_type: "audio/wav".to_string(),
        },
        now,
    );
    for n in 0..label_count {
        item.record_label(format!("seed_{}", n), now, 3);
    }
    item
}
