//! Health reporting for resource pools

use crate::metrics::PoolStats;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const HIGH_UTILIZATION: f64 = 0.9;

/// Health status of a resource pool
///
/// # Examples
///
/// ```
/// use esox_resourcepool::ResourcePool;
///
/// let pool = ResourcePool::infallible(3, || 0u8, |_| {}).unwrap();
/// pool.warmup(3).unwrap();
///
/// let health = pool.get_health_status();
/// assert!(health.is_healthy());
/// assert_eq!(health.available, 3);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HealthStatus {
    /// Whether the pool is healthy
    pub is_healthy: bool,

    /// Number of warnings detected
    pub warning_count: usize,

    /// Current pool utilization (0.0 to 1.0)
    pub utilization: f64,

    /// Idle resources count
    pub available: usize,

    /// Leased resources count
    pub in_use: usize,

    /// Callers blocked waiting for a resource
    pub waiters: usize,

    /// Total capacity
    pub capacity: usize,

    /// Warning messages
    pub warnings: Vec<String>,
}

impl HealthStatus {
    /// Derive a health status from a stats snapshot
    pub fn from_stats(stats: &PoolStats) -> Self {
        let utilization = stats.utilization();
        let mut warnings = Vec::new();
        let mut is_healthy = true;

        if stats.closed {
            warnings.push("Pool is closed".to_string());
            is_healthy = false;
        }

        if utilization > HIGH_UTILIZATION {
            warnings.push(format!("High utilization: {:.1}%", utilization * 100.0));
            is_healthy = false;
        }

        if stats.waiters > 0 {
            warnings.push(format!("{} callers waiting for a resource", stats.waiters));
        }

        Self {
            is_healthy,
            warning_count: warnings.len(),
            utilization,
            available: stats.available,
            in_use: stats.in_use,
            waiters: stats.waiters,
            capacity: stats.capacity,
            warnings,
        }
    }

    /// Check if the pool is healthy
    pub fn is_healthy(&self) -> bool {
        self.is_healthy
    }
}
