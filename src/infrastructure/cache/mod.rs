//! Cache Tier
//!
//! Two tiers shield the store from read traffic on small, hot, mostly
//! immutable records:
//!
//! - **L1**: in-process [`moka`] cache, cost-bounded in bytes with
//!   frequency-based admission, short TTL.
//! - **L2**: shared Redis, per-key TTL with jitter, reachable from every
//!   process of the deployment.
//!
//! [`CacheManager`] drives the read path (single-flight, tombstones,
//! write-back); [`CacheProvider`] owns the connections.

pub mod manager;
pub mod metrics;

pub use manager::CacheManager;

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache as MokaCache;
use redis::aio::ConnectionManager;
use redis::Client;

use crate::config::{CacheSettings, RedisSettings};
use crate::shared::error::AppError;

/// Connections and settings shared by every [`CacheManager`].
pub struct CacheProvider {
    pub(crate) redis: Option<ConnectionManager>,
    pub(crate) l1: Option<MokaCache<String, Arc<Vec<u8>>>>,
    pub(crate) settings: CacheSettings,
}

impl CacheProvider {
    /// Connect the cache tiers.
    ///
    /// When Redis is unreachable and `redis.failover` is set, the provider
    /// degrades to L1 + fetch instead of failing startup.
    pub async fn connect(
        settings: &CacheSettings,
        redis_settings: &RedisSettings,
    ) -> Result<Self, AppError> {
        if !settings.enabled {
            return Ok(Self::disabled());
        }

        let redis = match Self::connect_redis(&redis_settings.url).await {
            Ok(conn) => {
                tracing::info!("cache: redis connection established");
                Some(conn)
            }
            Err(e) if redis_settings.failover => {
                tracing::warn!(error = %e, "cache: redis unavailable, degrading to L1 + fetch");
                None
            }
            Err(e) => return Err(AppError::Redis(e)),
        };

        let l1 = settings.l1_enabled.then(|| {
            MokaCache::builder()
                .max_capacity(settings.l1_max_bytes)
                .weigher(|key: &String, value: &Arc<Vec<u8>>| {
                    u32::try_from(key.len() + value.len()).unwrap_or(u32::MAX)
                })
                .time_to_live(Duration::from_secs(settings.l1_ttl_seconds))
                .build()
        });

        if settings.l1_metrics {
            if let Some(l1) = l1.clone() {
                tokio::spawn(sync_l1_metrics(l1));
            }
        }

        Ok(Self {
            redis,
            l1,
            settings: settings.clone(),
        })
    }

    /// A provider that passes every read straight to the fetch function.
    pub fn disabled() -> Self {
        Self {
            redis: None,
            l1: None,
            settings: CacheSettings {
                enabled: false,
                namespace: String::new(),
                schema_version: String::new(),
                ttl_seconds: 0,
                ttl_jitter: 0.0,
                l1_enabled: false,
                l1_max_bytes: 0,
                l1_ttl_seconds: 0,
                l1_metrics: false,
            },
        }
    }

    async fn connect_redis(url: &str) -> Result<ConnectionManager, redis::RedisError> {
        let client = Client::open(url)?;
        ConnectionManager::new(client).await
    }
}

/// Periodically export the L1 weighted size as a gauge.
async fn sync_l1_metrics(l1: MokaCache<String, Arc<Vec<u8>>>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(5));
    loop {
        ticker.tick().await;
        l1.run_pending_tasks();
        metrics::CACHE_L1_COST_BYTES.set(l1.weighted_size() as f64);
    }
}
