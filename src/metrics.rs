//! Metrics collection and export for resource pools

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Point-in-time occupancy of a pool, read under the pool lock
///
/// `in_use + available` never exceeds `capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoolStats {
    /// Maximum number of live resources
    pub capacity: usize,

    /// Leased resources, including constructions in flight
    pub in_use: usize,

    /// Idle resources ready to be leased
    pub available: usize,

    /// Callers blocked in `acquire`
    pub waiters: usize,

    /// Whether the pool has been shut down
    pub closed: bool,
}

impl PoolStats {
    /// Resources currently alive, leased or idle
    pub fn live(&self) -> usize {
        self.in_use + self.available
    }

    /// Fraction of capacity currently leased (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        if self.capacity > 0 {
            self.in_use as f64 / self.capacity as f64
        } else {
            0.0
        }
    }
}

/// Metrics data for a pool
///
/// # Examples
///
/// ```
/// use esox_resourcepool::ResourcePool;
///
/// let pool = ResourcePool::infallible(3, || 0u8, |_| {}).unwrap();
///
/// {
///     let _lease = pool.acquire().unwrap();
///     let metrics = pool.get_metrics();
///     assert_eq!(metrics.total_acquired, 1);
///     assert_eq!(metrics.total_created, 1);
///     assert_eq!(metrics.in_use, 1);
/// }
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoolMetrics {
    /// Total leases handed out
    pub total_acquired: usize,

    /// Total leases returned, including ones whose reset failed
    pub total_released: usize,

    /// Total resources built by the factory
    pub total_created: usize,

    /// Factory calls that returned an error
    pub construction_failures: usize,

    /// Returned resources discarded because reset failed
    pub reset_failures: usize,

    /// Acquires that had to block on an exhausted pool
    pub wait_events: usize,

    /// Acquires that gave up at their deadline
    pub timeouts: usize,

    /// Resources taken out of the pool with `Lease::detach`
    pub detached: usize,

    /// Current leased resources
    pub in_use: usize,

    /// Current idle resources
    pub available: usize,

    /// Current blocked callers
    pub waiters: usize,

    /// Pool utilization ratio (0.0 to 1.0)
    pub utilization: f64,

    /// Maximum pool capacity
    pub max_capacity: usize,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("total_acquired".to_string(), self.total_acquired.to_string());
        metrics.insert("total_released".to_string(), self.total_released.to_string());
        metrics.insert("total_created".to_string(), self.total_created.to_string());
        metrics.insert("construction_failures".to_string(), self.construction_failures.to_string());
        metrics.insert("reset_failures".to_string(), self.reset_failures.to_string());
        metrics.insert("wait_events".to_string(), self.wait_events.to_string());
        metrics.insert("timeouts".to_string(), self.timeouts.to_string());
        metrics.insert("detached".to_string(), self.detached.to_string());
        metrics.insert("in_use".to_string(), self.in_use.to_string());
        metrics.insert("available".to_string(), self.available.to_string());
        metrics.insert("waiters".to_string(), self.waiters.to_string());
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics.insert("max_capacity".to_string(), self.max_capacity.to_string());
        metrics
    }
}

/// Metrics exporter for Prometheus format
pub struct MetricsExporter;

impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_resourcepool::{PoolConfiguration, ResourcePool};
    /// use std::collections::HashMap;
    ///
    /// let config = PoolConfiguration::new().with_max_pool_size(2).with_name("fft");
    /// let pool = ResourcePool::with_configuration(
    ///     config,
    ///     || Ok::<_, std::io::Error>(vec![0.0f32; 256]),
    ///     |buf: &mut Vec<f32>| {
    ///         buf.fill(0.0);
    ///         Ok::<_, std::io::Error>(())
    ///     },
    /// )
    /// .unwrap();
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "solver".to_string());
    ///
    /// let output = pool.export_metrics_prometheus(Some(&tags));
    /// assert!(output.contains("resourcepool_resources_in_use{pool=\"fft\""));
    /// assert!(output.contains("service=\"solver\""));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        let mut output = String::new();
        let labels = Self::format_labels(pool_name, tags);

        let gauges: [(&str, &str, String); 5] = [
            ("resourcepool_resources_in_use", "Current leased resources", metrics.in_use.to_string()),
            ("resourcepool_resources_available", "Current idle resources", metrics.available.to_string()),
            ("resourcepool_waiters", "Callers blocked waiting for a resource", metrics.waiters.to_string()),
            ("resourcepool_capacity", "Maximum live resources", metrics.max_capacity.to_string()),
            ("resourcepool_utilization", "Pool utilization ratio", format!("{:.2}", metrics.utilization)),
        ];
        for (name, help, value) in gauges {
            Self::push_metric(&mut output, name, help, "gauge", &labels, &value);
        }

        let counters: [(&str, &str, usize); 8] = [
            ("resourcepool_acquired_total", "Total leases handed out", metrics.total_acquired),
            ("resourcepool_released_total", "Total leases returned", metrics.total_released),
            ("resourcepool_created_total", "Total resources constructed", metrics.total_created),
            ("resourcepool_construction_failures_total", "Factory failures", metrics.construction_failures),
            ("resourcepool_reset_failures_total", "Reset failures", metrics.reset_failures),
            ("resourcepool_wait_events_total", "Acquires that blocked", metrics.wait_events),
            ("resourcepool_timeouts_total", "Acquires that timed out", metrics.timeouts),
            ("resourcepool_detached_total", "Resources detached from the pool", metrics.detached),
        ];
        for (name, help, value) in counters {
            Self::push_metric(&mut output, name, help, "counter", &labels, &value.to_string());
        }

        output
    }

    fn push_metric(
        output: &mut String,
        name: &str,
        help: &str,
        kind: &str,
        labels: &str,
        value: &str,
    ) {
        output.push_str(&format!("# HELP {} {}\n", name, help));
        output.push_str(&format!("# TYPE {} {}\n", name, kind));
        output.push_str(&format!("{}{{{}}} {}\n", name, labels, value));
    }

    fn format_labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> String {
        let mut labels = vec![format!("pool=\"{}\"", pool_name)];

        if let Some(tags) = tags {
            let mut tags: Vec<_> = tags.iter().collect();
            tags.sort();
            for (key, value) in tags {
                labels.push(format!("{}=\"{}\"", key, value));
            }
        }

        labels.join(",")
    }
}

/// Internal metrics tracker
#[derive(Default)]
pub(crate) struct MetricsTracker {
    total_acquired: AtomicUsize,
    total_released: AtomicUsize,
    total_created: AtomicUsize,
    construction_failures: AtomicUsize,
    reset_failures: AtomicUsize,
    wait_events: AtomicUsize,
    timeouts: AtomicUsize,
    detached: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_acquired(&self) {
        self.total_acquired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_released(&self) {
        self.total_released.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_created(&self) {
        self.total_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_construction_failure(&self) {
        self.construction_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reset_failure(&self) {
        self.reset_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_wait(&self) {
        self.wait_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_detached(&self) {
        self.detached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_metrics(&self, stats: PoolStats) -> PoolMetrics {
        PoolMetrics {
            total_acquired: self.total_acquired.load(Ordering::Relaxed),
            total_released: self.total_released.load(Ordering::Relaxed),
            total_created: self.total_created.load(Ordering::Relaxed),
            construction_failures: self.construction_failures.load(Ordering::Relaxed),
            reset_failures: self.reset_failures.load(Ordering::Relaxed),
            wait_events: self.wait_events.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            detached: self.detached.load(Ordering::Relaxed),
            in_use: stats.in_use,
            available: stats.available,
            waiters: stats.waiters,
            utilization: stats.utilization(),
            max_capacity: stats.capacity,
        }
    }
}
