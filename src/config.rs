//! Pool and registry configuration options

use std::time::Duration;

use crate::errors::{PoolError, PoolResult};
use crate::registry::TierPolicy;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a single resource pool
///
/// # Examples
///
/// ```
/// use esox_resourcepool::PoolConfiguration;
/// use std::time::Duration;
///
/// let config = PoolConfiguration::new()
///     .with_max_pool_size(4)
///     .with_timeout(Duration::from_secs(5))
///     .with_warmup(2)
///     .with_name("fft-engines");
///
/// assert_eq!(config.max_pool_size, 4);
/// assert_eq!(config.acquire_timeout, Some(Duration::from_secs(5)));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoolConfiguration {
    /// Maximum number of resources that can be alive at once (idle or leased)
    pub max_pool_size: usize,

    /// How long `acquire` waits for a resource before giving up; `None` waits forever
    pub acquire_timeout: Option<Duration>,

    /// Number of resources constructed up front when the pool is created
    pub warmup_size: Option<usize>,

    /// Name used in log events and exported metrics
    pub name: String,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            max_pool_size: 100,
            acquire_timeout: None,
            warmup_size: None,
            name: "pool".to_string(),
        }
    }
}

impl PoolConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum pool size
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_resourcepool::PoolConfiguration;
    ///
    /// let config = PoolConfiguration::new().with_max_pool_size(8);
    /// assert_eq!(config.max_pool_size, 8);
    /// ```
    pub fn with_max_pool_size(mut self, size: usize) -> Self {
        self.max_pool_size = size;
        self
    }

    /// Set the acquire timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }

    /// Set warm-up size
    pub fn with_warmup(mut self, size: usize) -> Self {
        self.warmup_size = Some(size);
        self
    }

    /// Set the pool name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Check the configuration before a pool is built from it
    pub fn validate(&self) -> PoolResult<()> {
        if self.max_pool_size == 0 {
            return Err(PoolError::configuration(
                "max_pool_size must be greater than 0",
            ));
        }
        if let Some(warmup) = self.warmup_size
            && warmup > self.max_pool_size
        {
            return Err(PoolError::configuration(format!(
                "warmup_size ({}) must not exceed max_pool_size ({})",
                warmup, self.max_pool_size
            )));
        }
        Ok(())
    }
}

/// Configuration for a registry of size-tiered pools
///
/// # Examples
///
/// ```
/// use esox_resourcepool::{RegistryConfiguration, TierPolicy};
///
/// let config = RegistryConfiguration::new()
///     .with_tier_policy(TierPolicy::PowerOfTwo)
///     .with_max_pool_size(2);
///
/// assert_eq!(config.tier_policy, TierPolicy::PowerOfTwo);
/// assert_eq!(config.capacity_for(1024), 2);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegistryConfiguration {
    /// How requested sizes are rounded to tiers
    pub tier_policy: TierPolicy,

    /// Default capacity for every tier pool
    pub max_pool_size: usize,

    /// Per-tier capacity override, given the tier
    #[cfg_attr(feature = "serde", serde(skip))]
    pub tier_capacity: Option<fn(usize) -> usize>,

    /// Acquire timeout applied to every tier pool
    pub acquire_timeout: Option<Duration>,

    /// Prefix for the names of tier pools
    pub name: String,
}

impl Default for RegistryConfiguration {
    fn default() -> Self {
        Self {
            tier_policy: TierPolicy::default(),
            max_pool_size: 4,
            tier_capacity: None,
            acquire_timeout: None,
            name: "registry".to_string(),
        }
    }
}

impl RegistryConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tier rounding policy
    pub fn with_tier_policy(mut self, policy: TierPolicy) -> Self {
        self.tier_policy = policy;
        self
    }

    /// Set the default capacity of each tier pool
    pub fn with_max_pool_size(mut self, size: usize) -> Self {
        self.max_pool_size = size;
        self
    }

    /// Compute the capacity of each tier pool from its tier
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_resourcepool::RegistryConfiguration;
    ///
    /// // Large workspaces are expensive, keep fewer of them around
    /// let config = RegistryConfiguration::new()
    ///     .with_tier_capacity(|tier| if tier > 4096 { 1 } else { 8 });
    ///
    /// assert_eq!(config.capacity_for(64), 8);
    /// assert_eq!(config.capacity_for(8192), 1);
    /// ```
    pub fn with_tier_capacity(mut self, capacity: fn(usize) -> usize) -> Self {
        self.tier_capacity = Some(capacity);
        self
    }

    /// Set the acquire timeout of each tier pool
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }

    /// Set the registry name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Capacity of the pool serving `tier`
    pub fn capacity_for(&self, tier: usize) -> usize {
        match self.tier_capacity {
            Some(capacity) => capacity(tier),
            None => self.max_pool_size,
        }
    }

    /// Pool configuration for the pool serving `tier`
    pub(crate) fn pool_configuration(&self, tier: usize) -> PoolConfiguration {
        PoolConfiguration {
            max_pool_size: self.capacity_for(tier),
            acquire_timeout: self.acquire_timeout,
            warmup_size: None,
            name: format!("{}-{}", self.name, tier),
        }
    }

    /// Check the configuration before a registry is built from it
    pub fn validate(&self) -> PoolResult<()> {
        if let TierPolicy::FixedWidth(0) = self.tier_policy {
            return Err(PoolError::configuration("tier width must be greater than 0"));
        }
        if self.tier_capacity.is_none() && self.max_pool_size == 0 {
            return Err(PoolError::configuration(
                "max_pool_size must be greater than 0",
            ));
        }
        Ok(())
    }
}
