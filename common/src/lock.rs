// Per-learner run serialization: in-process mutexes or Redis SET NX locks

use crate::db::RedisPool;
use crate::errors::StorageError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Lock trait for ensuring exclusive access to a resource
#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// Acquire a lock on the specified resource with a TTL
    async fn acquire(&self, resource: &str, ttl: Duration) -> Result<LockGuard, StorageError>;
}

/// Lock resource name for a learner's schedule runs
pub fn learner_resource(learner_id: Uuid) -> String {
    format!("planner:learner:{}", learner_id)
}

/// Lock guard that releases the lock when dropped
pub struct LockGuard {
    resource: String,
    ttl: Duration,
    acquired_at: Instant,
    refreshed_at: Instant,
    held: Held,
}

type Slots = Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>;

enum Held {
    Local {
        guard: OwnedMutexGuard<()>,
        slots: Slots,
    },
    Redis {
        pool: RedisPool,
        lock_value: String,
    },
}

impl LockGuard {
    fn new(resource: &str, ttl: Duration, held: Held) -> Self {
        let now = Instant::now();
        Self {
            resource: resource.to_string(),
            ttl,
            acquired_at: now,
            refreshed_at: now,
            held,
        }
    }

    /// Get the resource name this lock guards
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Get the time elapsed since lock acquisition
    pub fn elapsed(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    /// True once half the TTL has passed since the last refresh
    pub fn refresh_due(&self) -> bool {
        self.refreshed_at.elapsed() >= self.ttl / 2
    }

    /// Push the expiry out by a full TTL
    ///
    /// Fails with `LockUnavailable` when a Redis lock has already expired or
    /// been taken over, so the holder stops writing.
    #[instrument(skip(self), fields(resource = %self.resource))]
    pub async fn refresh(&mut self) -> Result<(), StorageError> {
        if let Held::Redis { pool, lock_value } = &self.held {
            refresh_lock(pool, &self.resource, lock_value, self.ttl).await?;
        }
        self.refreshed_at = Instant::now();
        Ok(())
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        match &self.held {
            Held::Local { guard, slots } => {
                // Map entry plus this guard means nobody else holds or waits
                if let Ok(mut slots) = slots.lock() {
                    if Arc::strong_count(OwnedMutexGuard::mutex(guard)) == 2 {
                        slots.remove(&self.resource);
                    }
                }
            }
            Held::Redis { pool, lock_value } => {
                let resource = self.resource.clone();
                let lock_value = lock_value.clone();
                let pool = pool.clone();

                tokio::spawn(async move {
                    if let Err(e) = release_lock(&pool, &resource, &lock_value).await {
                        warn!(
                            resource = %resource,
                            error = %e,
                            "Failed to release lock on drop"
                        );
                    }
                });
            }
        }
    }
}

/// In-process lock keyed by resource name
///
/// Serializes runs within one API instance. Waiting is bounded by the TTL.
/// Entries are removed once no guard holds or waits on them.
#[derive(Default)]
pub struct LocalLock {
    slots: Slots,
}

impl LocalLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, resource: &str) -> Result<Arc<tokio::sync::Mutex<()>>, StorageError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| StorageError::LockUnavailable(format!("{} (poisoned)", resource)))?;
        Ok(slots.entry(resource.to_string()).or_default().clone())
    }

    /// Drop the entry for `resource` if `slot` is its last outside reference
    fn prune(&self, resource: &str, slot: &Arc<tokio::sync::Mutex<()>>) {
        if let Ok(mut slots) = self.slots.lock() {
            if Arc::strong_count(slot) == 2 {
                slots.remove(resource);
            }
        }
    }
}

#[async_trait]
impl DistributedLock for LocalLock {
    #[instrument(skip(self), fields(resource = %resource, ttl_seconds = ?ttl.as_secs()))]
    async fn acquire(&self, resource: &str, ttl: Duration) -> Result<LockGuard, StorageError> {
        let slot = self.slot(resource)?;

        let guard = match timeout(ttl, slot.clone().lock_owned()).await {
            Ok(guard) => guard,
            Err(_) => {
                debug!(resource = %resource, "Timed out waiting for local lock");
                self.prune(resource, &slot);
                return Err(StorageError::LockUnavailable(resource.to_string()));
            }
        };

        debug!(resource = %resource, "Local lock acquired");
        Ok(LockGuard::new(
            resource,
            ttl,
            Held::Local {
                guard,
                slots: self.slots.clone(),
            },
        ))
    }
}

/// Redis lock for deployments running several API instances
pub struct RedLock {
    pool: RedisPool,
    retry_count: u32,
    retry_delay: Duration,
}

impl RedLock {
    /// Create a new RedLock instance
    pub fn new(pool: RedisPool) -> Self {
        Self {
            pool,
            retry_count: 3,
            retry_delay: Duration::from_millis(200),
        }
    }

    /// Create a RedLock with custom retry configuration
    pub fn with_retry(pool: RedisPool, retry_count: u32, retry_delay: Duration) -> Self {
        Self {
            pool,
            retry_count,
            retry_delay,
        }
    }

    /// Try to acquire the lock once
    async fn try_acquire_once(
        &self,
        resource: &str,
        ttl: Duration,
    ) -> Result<LockGuard, StorageError> {
        let mut conn = self.pool.get_connection();
        let key = format!("lock:{}", resource);
        let lock_value = Uuid::new_v4().to_string();

        // SET NX EX sets the key only if it is absent, with expiry
        let result: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(&lock_value)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs())
            .query_async(&mut conn)
            .await
            .map_err(|e| StorageError::RedisError(format!("Failed to acquire lock: {}", e)))?;

        if result.is_some() {
            debug!(
                resource = %resource,
                ttl_seconds = ttl.as_secs(),
                "Lock acquired"
            );

            Ok(LockGuard::new(
                resource,
                ttl,
                Held::Redis {
                    pool: self.pool.clone(),
                    lock_value,
                },
            ))
        } else {
            Err(StorageError::LockUnavailable(resource.to_string()))
        }
    }
}

#[async_trait]
impl DistributedLock for RedLock {
    /// Acquire the lock, retrying a few times while it is held elsewhere
    #[instrument(skip(self), fields(resource = %resource, ttl_seconds = ?ttl.as_secs()))]
    async fn acquire(&self, resource: &str, ttl: Duration) -> Result<LockGuard, StorageError> {
        let mut attempts = 0;

        loop {
            match self.try_acquire_once(resource, ttl).await {
                Ok(guard) => {
                    info!(
                        resource = %resource,
                        attempts = attempts + 1,
                        "Lock acquired successfully"
                    );
                    return Ok(guard);
                }
                Err(e) => {
                    attempts += 1;
                    if attempts >= self.retry_count {
                        warn!(
                            resource = %resource,
                            attempts,
                            "Failed to acquire lock after all retries"
                        );
                        return Err(e);
                    }

                    debug!(
                        resource = %resource,
                        attempt = attempts,
                        retry_delay_ms = self.retry_delay.as_millis(),
                        "Lock acquisition failed, retrying"
                    );

                    sleep(self.retry_delay).await;
                }
            }
        }
    }
}

/// Reset the key's expiry if it still holds our value
async fn refresh_lock(
    pool: &RedisPool,
    resource: &str,
    lock_value: &str,
    ttl: Duration,
) -> Result<(), StorageError> {
    let mut conn = pool.get_connection();
    let key = format!("lock:{}", resource);
    let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);

    let script = r#"
        if redis.call("get", KEYS[1]) == ARGV[1] then
            return redis.call("pexpire", KEYS[1], ARGV[2])
        else
            return 0
        end
    "#;

    let result: i32 = redis::Script::new(script)
        .key(&key)
        .arg(lock_value)
        .arg(ttl_ms)
        .invoke_async(&mut conn)
        .await
        .map_err(|e| StorageError::RedisError(format!("Failed to refresh lock: {}", e)))?;

    if result == 1 {
        debug!(resource = %resource, ttl_ms, "Lock refreshed");
        Ok(())
    } else {
        warn!(resource = %resource, "Lock expired or taken over before refresh");
        Err(StorageError::LockUnavailable(resource.to_string()))
    }
}

/// Release a lock by deleting the key if it still holds our value
async fn release_lock(
    pool: &RedisPool,
    resource: &str,
    lock_value: &str,
) -> Result<(), StorageError> {
    let mut conn = pool.get_connection();
    let key = format!("lock:{}", resource);

    let script = r#"
        if redis.call("get", KEYS[1]) == ARGV[1] then
            return redis.call("del", KEYS[1])
        else
            return 0
        end
    "#;

    let result: i32 = redis::Script::new(script)
        .key(&key)
        .arg(lock_value)
        .invoke_async(&mut conn)
        .await
        .map_err(|e| StorageError::RedisError(format!("Failed to release lock: {}", e)))?;

    if result == 1 {
        debug!(resource = %resource, "Lock released successfully");
    } else {
        warn!(resource = %resource, "Lock was not owned or already expired");
    }

    Ok(())
}
