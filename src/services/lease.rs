use std::collections::HashSet;

use async_trait::async_trait;
use redis::AsyncCommands;
use uuid::Uuid;

const LEASE_PREFIX: &str = "audio_label:lease:";

fn lease_key(id: Uuid) -> String {
    format!("{}{}", LEASE_PREFIX, id)
}

/// Short-lived reservations of served items.
///
/// A lease only hides an item from other selections; it never blocks a
/// label submission.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Subset of `ids` currently under lease.
    async fn leased(&self, ids: &[Uuid]) -> Result<HashSet<Uuid>, LeaseError>;

    /// Lease `id` for the configured TTL. Returns false if someone else holds it.
    async fn acquire(&self, id: Uuid) -> Result<bool, LeaseError>;

    /// Drop the lease on `id`, if any.
    async fn release(&self, id: Uuid) -> Result<(), LeaseError>;

    /// Check backend connectivity (for health checks).
    async fn health_check(&self) -> Result<(), LeaseError>;
}

/// Leases as Redis keys with a TTL, so abandoned ones expire on their own.
pub struct RedisLeaseStore {
    client: redis::Client,
    ttl_ms: u64,
}

impl RedisLeaseStore {
    pub fn new(redis_url: &str, ttl_secs: u64) -> Result<Self, LeaseError> {
        let client = redis::Client::open(redis_url).map_err(LeaseError::Redis)?;
        Ok(Self {
            client,
            ttl_ms: ttl_secs * 1000,
        })
    }
}

#[async_trait]
impl LeaseStore for RedisLeaseStore {
    async fn leased(&self, ids: &[Uuid]) -> Result<HashSet<Uuid>, LeaseError> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let mut conn = self.client.get_multiplexed_async_connection().await.map_err(LeaseError::Redis)?;
        let keys: Vec<String> = ids.iter().map(|id| lease_key(*id)).collect();
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await
            .map_err(LeaseError::Redis)?;

        Ok(ids
            .iter()
            .zip(values)
            .filter_map(|(id, v)| v.map(|_| *id))
            .collect())
    }

    async fn acquire(&self, id: Uuid) -> Result<bool, LeaseError> {
        let mut conn = self.client.get_multiplexed_async_connection().await.map_err(LeaseError::Redis)?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(lease_key(id))
            .arg(1)
            .arg("NX")
            .arg("PX")
            .arg(self.ttl_ms)
            .query_async(&mut conn)
            .await
            .map_err(LeaseError::Redis)?;
        Ok(reply.is_some())
    }

    async fn release(&self, id: Uuid) -> Result<(), LeaseError> {
        let mut conn = self.client.get_multiplexed_async_connection().await.map_err(LeaseError::Redis)?;
        conn.del::<_, ()>(lease_key(id))
            .await
            .map_err(LeaseError::Redis)?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), LeaseError> {
        let mut conn = self.client.get_multiplexed_async_connection().await.map_err(LeaseError::Redis)?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(LeaseError::Redis)?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LeaseError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lease_key_layout() {
        let id = Uuid::nil();
        assert_eq!(lease_key(id), "audio_label:lease:00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn test_rejects_bad_url() {
        assert!(RedisLeaseStore::new("not a url", 60).is_err());
    }
}
