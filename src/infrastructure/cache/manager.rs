//! Cache read/write orchestration for one record type.
//!
//! The read path (`get_or_set`):
//!
//! 1. Probe L1. Hit: done.
//! 2. Enter a single-flight group keyed by the cache key; concurrent probes
//!    coalesce onto one in-flight leader and share its outcome.
//! 3. The leader re-probes L1, then L2. An L2 tombstone means the record is
//!    known to be absent: return `NotFound` without touching the store.
//! 4. Otherwise call the fetch function. A value is serialized once and
//!    written to both tiers (L2 with jittered TTL); an empty result writes a
//!    short-lived tombstone; an error propagates and writes nothing.
//!
//! L2 writes run on a detached task with their own timeout, so a cancelled
//! caller cannot abort the write-back.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::Rng;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::OnceCell;

use super::{metrics, CacheProvider};
use crate::shared::error::AppError;

/// Marker stored in L2 for records known to be absent.
const NIL_MARKER: &[u8] = b"__nil__";

/// TTL of the absence marker.
const NIL_TTL_SECS: u64 = 30;

const REDIS_READ_TIMEOUT: Duration = Duration::from_millis(500);
const REDIS_WRITE_TIMEOUT: Duration = Duration::from_millis(500);

enum L2Lookup {
    Hit(Vec<u8>),
    Tombstone,
    Miss,
}

/// Cache manager for one record type under one key prefix.
pub struct CacheManager<T> {
    provider: Arc<CacheProvider>,
    prefix: &'static str,
    flights: DashMap<String, Arc<OnceCell<Option<T>>>>,
}

impl<T> CacheManager<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(provider: Arc<CacheProvider>, prefix: &'static str) -> Self {
        Self {
            provider,
            prefix,
            flights: DashMap::new(),
        }
    }

    /// Read through the tiers, falling back to `fetch` on a cold key.
    ///
    /// Returns `NotFound` when the record does not exist (negative results
    /// are cached with a tombstone).
    pub async fn get_or_set<F, Fut>(&self, id: &str, fetch: F) -> Result<T, AppError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Option<T>, AppError>> + Send,
    {
        if !self.provider.settings.enabled {
            return fetch()
                .await?
                .ok_or_else(|| AppError::NotFound(format!("{} {}", self.prefix, id)));
        }

        let start = Instant::now();
        let key = self.build_key(id);

        if let Some(value) = self.l1_get(&key) {
            metrics::record_hit_l1(self.prefix);
            metrics::observe_duration(self.prefix, "l1", start.elapsed().as_secs_f64());
            return Ok(value);
        }

        // Single-flight: the first task in becomes the leader, the rest
        // await the same cell and share the outcome.
        let cell = self
            .flights
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let outcome = cell
            .get_or_try_init(|| self.load(&key, fetch))
            .await
            .map(|shared| shared.clone());

        // Retire the flight so later readers start fresh (they will hit L1).
        self.flights.remove_if(&key, |_, v| Arc::ptr_eq(v, &cell));

        match outcome? {
            Some(value) => Ok(value),
            None => Err(AppError::NotFound(format!("{} {}", self.prefix, id))),
        }
    }

    /// Drop the key from both tiers. Mandatory after any mutation of the
    /// source entity.
    pub async fn invalidate(&self, id: &str) -> Result<(), AppError> {
        if !self.provider.settings.enabled {
            return Ok(());
        }

        let key = self.build_key(id);
        self.l1_del(&key);

        if let Some(mut conn) = self.provider.redis.clone() {
            tokio::time::timeout(REDIS_WRITE_TIMEOUT, conn.del::<_, ()>(&key))
                .await
                .map_err(|_| AppError::Internal("cache: invalidate timed out".into()))??;
        }

        Ok(())
    }

    /// Leader path: L1 double-check, L2, then the store fetch.
    async fn load<F, Fut>(&self, key: &str, fetch: F) -> Result<Option<T>, AppError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Option<T>, AppError>> + Send,
    {
        if let Some(value) = self.l1_get(key) {
            metrics::record_hit_l1(self.prefix);
            return Ok(Some(value));
        }

        let t_l2 = Instant::now();
        match self.l2_get(key).await {
            L2Lookup::Hit(blob) => {
                if let Ok(value) = bincode::deserialize::<T>(&blob) {
                    self.l1_set(key, Arc::new(blob));
                    metrics::record_hit_l2(self.prefix);
                    metrics::observe_duration(self.prefix, "l2", t_l2.elapsed().as_secs_f64());
                    return Ok(Some(value));
                }
                // Undecodable blob counts as a miss and gets overwritten.
            }
            L2Lookup::Tombstone => {
                metrics::record_hit_l2(self.prefix);
                return Ok(None);
            }
            L2Lookup::Miss => {}
        }

        let t_fetch = Instant::now();
        let fetched = fetch().await.map_err(|e| {
            metrics::record_error(self.prefix);
            e
        })?;
        metrics::record_miss(self.prefix);
        metrics::observe_duration(self.prefix, "fetch", t_fetch.elapsed().as_secs_f64());

        match fetched {
            Some(value) => {
                // Serialize once; both tiers store the same blob.
                if let Ok(blob) = bincode::serialize(&value) {
                    self.l2_set_detached(key.to_string(), blob.clone());
                    self.l1_set(key, Arc::new(blob));
                }
                Ok(Some(value))
            }
            None => {
                self.l2_set_nil_detached(key.to_string());
                Ok(None)
            }
        }
    }

    /// Key layout: `<namespace>:<schema_version>:<prefix>:<id>`. Bumping the
    /// schema version invalidates every key after a DTO format change.
    fn build_key(&self, id: &str) -> String {
        let cfg = &self.provider.settings;
        format!(
            "{}:{}:{}:{}",
            cfg.namespace, cfg.schema_version, self.prefix, id
        )
    }

    /// L2 TTL with jitter, decorrelating expirations after burst writes.
    fn calculate_ttl(&self) -> Duration {
        let base = Duration::from_secs(self.provider.settings.ttl_seconds);
        let jitter = self.provider.settings.ttl_jitter;
        if jitter <= 0.0 {
            return base;
        }
        let extra = base.mul_f64(rand::thread_rng().gen_range(0.0..1.0) * jitter);
        base + extra
    }

    // ---------- L1 ----------

    fn l1_get(&self, key: &str) -> Option<T> {
        let l1 = self.provider.l1.as_ref()?;
        let blob = l1.get(key)?;
        bincode::deserialize(&blob).ok()
    }

    fn l1_set(&self, key: &str, blob: Arc<Vec<u8>>) {
        if let Some(l1) = &self.provider.l1 {
            l1.insert(key.to_string(), blob);
        }
    }

    fn l1_del(&self, key: &str) {
        if let Some(l1) = &self.provider.l1 {
            l1.invalidate(key);
        }
    }

    // ---------- L2 ----------

    async fn l2_get(&self, key: &str) -> L2Lookup {
        let Some(conn) = self.provider.redis.clone() else {
            return L2Lookup::Miss;
        };
        let mut conn = conn;

        match tokio::time::timeout(REDIS_READ_TIMEOUT, conn.get::<_, Option<Vec<u8>>>(key)).await {
            Ok(Ok(Some(data))) => {
                if data == NIL_MARKER {
                    L2Lookup::Tombstone
                } else {
                    L2Lookup::Hit(data)
                }
            }
            Ok(Ok(None)) => L2Lookup::Miss,
            Ok(Err(e)) => {
                metrics::record_error(self.prefix);
                tracing::warn!(key = %key, error = %e, "cache: L2 read failed");
                L2Lookup::Miss
            }
            Err(_) => {
                metrics::record_error(self.prefix);
                tracing::warn!(key = %key, "cache: L2 read timed out");
                L2Lookup::Miss
            }
        }
    }

    /// Best-effort L2 write on a detached task; caller cancellation must not
    /// abort the write-back.
    fn l2_set_detached(&self, key: String, blob: Vec<u8>) {
        let Some(conn) = self.provider.redis.clone() else {
            return;
        };
        let ttl = self.calculate_ttl().as_secs();

        tokio::spawn(async move {
            let mut conn = conn;
            let write = conn.set_ex::<_, _, ()>(&key, blob.as_slice(), ttl);
            match tokio::time::timeout(REDIS_WRITE_TIMEOUT, write).await {
                Ok(Err(e)) => tracing::warn!(key = %key, error = %e, "cache: L2 write failed"),
                Err(_) => tracing::warn!(key = %key, "cache: L2 write timed out"),
                Ok(Ok(())) => {}
            }
        });
    }

    fn l2_set_nil_detached(&self, key: String) {
        let Some(conn) = self.provider.redis.clone() else {
            return;
        };

        tokio::spawn(async move {
            let mut conn = conn;
            let write = conn.set_ex::<_, _, ()>(&key, NIL_MARKER, NIL_TTL_SECS);
            if let Ok(Err(e)) = tokio::time::timeout(REDIS_WRITE_TIMEOUT, write).await {
                tracing::warn!(key = %key, error = %e, "cache: tombstone write failed");
            }
        });
    }
}
