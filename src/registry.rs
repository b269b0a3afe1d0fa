//! Size-tiered registry of resource pools
//!
//! Requests are rounded up to a tier and every tier gets its own bounded
//! pool, created the first time the tier is asked for.

use crate::config::RegistryConfiguration;
use crate::errors::{BoxError, PoolError, PoolResult};
use crate::lease::Lease;
use crate::metrics::PoolStats;
use crate::pool::ResourcePool;

use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

type TierFactory<T> = dyn Fn(usize) -> Result<T, BoxError> + Send + Sync;
type TierReset<T> = dyn Fn(&mut T) -> Result<(), BoxError> + Send + Sync;

/// How requested sizes are rounded to tiers
///
/// Rounding always goes up, every size maps to exactly one tier, and a
/// larger size never lands in a smaller tier.
///
/// # Examples
///
/// ```
/// use esox_resourcepool::TierPolicy;
///
/// let fixed = TierPolicy::FixedWidth(64);
/// assert_eq!(fixed.classify(50), 64);
/// assert_eq!(fixed.classify(64), 64);
/// assert_eq!(fixed.classify(70), 128);
///
/// assert_eq!(TierPolicy::PowerOfTwo.classify(600), 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TierPolicy {
    /// Tiers are consecutive multiples of the width
    FixedWidth(usize),

    /// Tiers are powers of two
    PowerOfTwo,
}

impl Default for TierPolicy {
    fn default() -> Self {
        TierPolicy::FixedWidth(64)
    }
}

impl TierPolicy {
    /// Tier serving `size`
    ///
    /// Zero is served by the smallest tier. Sizes whose tier would overflow
    /// `usize` all share the `usize::MAX` tier.
    pub fn classify(&self, size: usize) -> usize {
        let size = size.max(1);
        match *self {
            TierPolicy::FixedWidth(width) => {
                let width = width.max(1);
                size.div_ceil(width).checked_mul(width).unwrap_or(usize::MAX)
            }
            TierPolicy::PowerOfTwo => size.checked_next_power_of_two().unwrap_or(usize::MAX),
        }
    }
}

/// Registry of bounded pools keyed by size tier
///
/// The factory receives the tier so resources can be sized to serve every
/// request that rounds to it. Pools are never removed once created, and no
/// new tier pool is created after `shutdown`.
///
/// # Examples
///
/// ```
/// use esox_resourcepool::{BoxError, PoolRegistry, RegistryConfiguration};
///
/// let registry = PoolRegistry::new(
///     RegistryConfiguration::new().with_max_pool_size(2),
///     |tier| Ok::<_, BoxError>(vec![0.0f64; tier]),
///     |workspace: &mut Vec<f64>| {
///         workspace.fill(0.0);
///         Ok::<_, BoxError>(())
///     },
/// )
/// .unwrap();
///
/// let small = registry.get_pool(50).unwrap();
/// let same = registry.get_pool(60).unwrap();
/// assert!(small.ptr_eq(&same));
///
/// let workspace = registry.acquire(70).unwrap();
/// assert_eq!(workspace.len(), 128);
/// ```
pub struct PoolRegistry<T: Send + 'static> {
    pools: DashMap<usize, ResourcePool<T>>,
    factory: Arc<TierFactory<T>>,
    reset: Arc<TierReset<T>>,
    config: RegistryConfiguration,
    closed: AtomicBool,
}

impl<T: Send + 'static> PoolRegistry<T> {
    /// Create an empty registry
    pub fn new<F, E, R, RE>(config: RegistryConfiguration, factory: F, reset: R) -> PoolResult<Self>
    where
        F: Fn(usize) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
        R: Fn(&mut T) -> Result<(), RE> + Send + Sync + 'static,
        RE: Into<BoxError>,
    {
        config.validate()?;
        Ok(Self {
            pools: DashMap::new(),
            factory: Arc::new(move |tier: usize| -> Result<T, BoxError> {
                factory(tier).map_err(Into::into)
            }),
            reset: Arc::new(move |value: &mut T| -> Result<(), BoxError> {
                reset(value).map_err(Into::into)
            }),
            config,
            closed: AtomicBool::new(false),
        })
    }

    /// Tier serving `size` under this registry's policy
    pub fn classify(&self, size: usize) -> usize {
        self.config.tier_policy.classify(size)
    }

    /// Pool serving `size`, created on first use of its tier
    ///
    /// Concurrent first requests for the same tier create a single pool.
    /// Fails with `PoolError::Closed` once the registry is shut down.
    pub fn get_pool(&self, size: usize) -> PoolResult<ResourcePool<T>> {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }

        let tier = self.classify(size);
        if let Some(pool) = self.pools.get(&tier) {
            return Ok(pool.value().clone());
        }

        // Checked again under the shard lock so shutdown sees every pool
        let pool = self.pools.entry(tier).or_try_insert_with(|| {
            if self.is_closed() {
                return Err(PoolError::Closed);
            }
            self.build_pool(tier)
        })?;
        Ok(pool.value().clone())
    }

    fn build_pool(&self, tier: usize) -> PoolResult<ResourcePool<T>> {
        let config = self.config.pool_configuration(tier);
        debug!(
            registry = %self.config.name,
            tier,
            capacity = config.max_pool_size,
            "creating tier pool"
        );

        let factory = Arc::clone(&self.factory);
        let reset = Arc::clone(&self.reset);
        ResourcePool::with_configuration(
            config,
            move || factory(tier),
            move |value: &mut T| reset(value),
        )
    }

    /// Lease a resource able to serve `size`, blocking while its tier is exhausted
    pub fn acquire(&self, size: usize) -> PoolResult<Lease<T>> {
        self.get_pool(size)?.acquire()
    }

    /// Lease a resource able to serve `size`, waiting at most `timeout`
    pub fn acquire_timeout(&self, size: usize, timeout: Duration) -> PoolResult<Lease<T>> {
        self.get_pool(size)?.acquire_timeout(timeout)
    }

    /// Lease a resource able to serve `size` without blocking
    pub fn try_acquire(&self, size: usize) -> PoolResult<Lease<T>> {
        self.get_pool(size)?.try_acquire()
    }

    /// Tiers with a pool, in ascending order
    pub fn tiers(&self) -> Vec<usize> {
        let mut tiers: Vec<usize> = self.pools.iter().map(|entry| *entry.key()).collect();
        tiers.sort_unstable();
        tiers
    }

    /// Stats snapshot of every tier pool, in ascending tier order
    pub fn stats(&self) -> Vec<(usize, PoolStats)> {
        let mut stats: Vec<_> = self
            .pools
            .iter()
            .map(|entry| (*entry.key(), entry.value().stats()))
            .collect();
        stats.sort_unstable_by_key(|(tier, _)| *tier);
        stats
    }

    /// Shut down every tier pool and refuse to create new ones
    ///
    /// Pools are shut down one after another and `timeout` applies to each
    /// of them, so the whole call may wait up to `timeout` times the number
    /// of tiers. Every pool is shut down even if an earlier one times out;
    /// the first error is returned.
    pub fn shutdown(&self, timeout: Option<Duration>) -> PoolResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        let pools: Vec<_> = self.pools.iter().map(|entry| entry.value().clone()).collect();
        let mut result = Ok(());
        for pool in pools {
            if let Err(err) = pool.shutdown(timeout)
                && result.is_ok()
            {
                result = Err(err);
            }
        }
        result
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn configuration(&self) -> &RegistryConfiguration {
        &self.config
    }
}

impl<T: Send + 'static> fmt::Debug for PoolRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolRegistry")
            .field("name", &self.config.name)
            .field("tiers", &self.tiers())
            .finish()
    }
}
