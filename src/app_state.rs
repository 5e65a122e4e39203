use std::sync::Arc;

use crate::config::{AdminCredentials, LabelingPolicy};
use crate::db::{IdentityStore, ItemStore};
use crate::services::{auth::TokenService, lease::LeaseStore, storage::BlobStore};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub items: Arc<dyn ItemStore>,
    pub users: Arc<dyn IdentityStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub tokens: Arc<TokenService>,
    pub leases: Option<Arc<dyn LeaseStore>>,
    pub policy: Arc<LabelingPolicy>,
    pub admin: Arc<AdminCredentials>,
}

impl AppState {
    pub fn new(
        items: impl ItemStore + 'static,
        users: impl IdentityStore + 'static,
        blobs: impl BlobStore + 'static,
        tokens: TokenService,
        policy: LabelingPolicy,
        admin: AdminCredentials,
    ) -> Self {
        Self {
            items: Arc::new(items),
            users: Arc::new(users),
            blobs: Arc::new(blobs),
            tokens: Arc::new(tokens),
            leases: None,
            policy: Arc::new(policy),
            admin: Arc::new(admin),
        }
    }

    pub fn with_leases(mut self, leases: impl LeaseStore + 'static) -> Self {
        self.leases = Some(Arc::new(leases));
        self
    }
}
