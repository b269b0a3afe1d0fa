//! Bounded resource pool
//!
//! All pool state (idle resources, the live count, waiters and the set of
//! leased ids) sits behind one mutex. Construction runs outside the lock:
//! a slot is reserved first and either confirmed or rolled back once the
//! factory returns.

use crate::config::PoolConfiguration;
use crate::errors::{BoxError, PoolError, PoolResult};
use crate::health::HealthStatus;
use crate::lease::Lease;
use crate::metrics::{MetricsExporter, MetricsTracker, PoolMetrics, PoolStats};

use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

const ASYNC_POLL_INTERVAL: Duration = Duration::from_millis(10);

type Factory<T> = dyn Fn() -> Result<T, BoxError> + Send + Sync;
type Reset<T> = dyn Fn(&mut T) -> Result<(), BoxError> + Send + Sync;

/// Identity of a pooled resource, stable for the resource's whole life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Slot<T> {
    id: ResourceId,
    value: T,
}

enum Checkout<T> {
    Idle(Slot<T>),
    Reserved(ResourceId),
}

struct PoolState<T> {
    idle: VecDeque<Slot<T>>,
    /// Leased ids, including slots reserved for a construction in flight
    checked_out: HashSet<ResourceId>,
    live: usize,
    waiters: usize,
    next_id: u64,
    closed: bool,
}

impl<T> PoolState<T> {
    fn new() -> Self {
        Self {
            idle: VecDeque::new(),
            checked_out: HashSet::new(),
            live: 0,
            waiters: 0,
            next_id: 0,
            closed: false,
        }
    }

    fn reserve(&mut self) -> ResourceId {
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        self.live += 1;
        self.checked_out.insert(id);
        id
    }

    /// Oldest idle resource first, then a fresh reservation if under capacity
    fn checkout(&mut self, capacity: usize) -> PoolResult<Option<Checkout<T>>> {
        if self.closed {
            return Err(PoolError::Closed);
        }
        if let Some(slot) = self.idle.pop_front() {
            self.checked_out.insert(slot.id);
            return Ok(Some(Checkout::Idle(slot)));
        }
        if self.live < capacity {
            return Ok(Some(Checkout::Reserved(self.reserve())));
        }
        Ok(None)
    }

    fn stats(&self, capacity: usize) -> PoolStats {
        PoolStats {
            capacity,
            in_use: self.live - self.idle.len(),
            available: self.idle.len(),
            waiters: self.waiters,
            closed: self.closed,
        }
    }
}

/// State shared between a pool's handles and its outstanding leases
pub(crate) struct PoolShared<T> {
    state: Mutex<PoolState<T>>,
    available: Condvar,
    drained: Condvar,
    factory: Box<Factory<T>>,
    reset: Box<Reset<T>>,
    config: PoolConfiguration,
    metrics: MetricsTracker,
}

impl<T> PoolShared<T> {
    fn capacity(&self) -> usize {
        self.config.max_pool_size
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    /// Give up one live slot and wake whoever may now use it
    fn release_slot(&self, state: &mut PoolState<T>) {
        state.live -= 1;
        self.available.notify_one();
        if state.closed && state.live == 0 {
            self.drained.notify_all();
        }
    }

    fn take_lease(&self, state: &mut PoolState<T>, id: ResourceId) {
        assert!(
            state.checked_out.remove(&id),
            "resource {} returned to pool '{}' without an outstanding lease",
            id,
            self.name()
        );
    }

    /// Reset a returned resource and put it back in the idle set
    ///
    /// A panicking reset hook counts as a failed reset.
    pub(crate) fn give_back(&self, id: ResourceId, mut value: T) -> PoolResult<()> {
        let reset = panic::catch_unwind(AssertUnwindSafe(|| (self.reset)(&mut value)))
            .unwrap_or_else(|_| Err(BoxError::from("reset hook panicked")));

        let mut state = self.state.lock();
        self.take_lease(&mut state, id);
        self.metrics.record_released();

        match reset {
            Ok(()) if !state.closed => {
                state.idle.push_back(Slot { id, value });
                drop(state);
                self.available.notify_one();
                Ok(())
            }
            Ok(()) => {
                self.release_slot(&mut state);
                drop(state);
                drop(value);
                Ok(())
            }
            Err(err) => {
                self.release_slot(&mut state);
                drop(state);
                drop(value);
                self.metrics.record_reset_failure();
                warn!(
                    pool = %self.name(),
                    resource = %id,
                    error = %err,
                    "reset failed, discarding resource"
                );
                Err(PoolError::reset(err))
            }
        }
    }

    /// Remove a leased resource from the pool's accounting for good
    pub(crate) fn forget(&self, id: ResourceId) {
        let mut state = self.state.lock();
        self.take_lease(&mut state, id);
        self.release_slot(&mut state);
        self.metrics.record_detached();
    }
}

/// Deadline `timeout` from now, `None` when it lies beyond what `Instant` can hold
fn deadline_after(timeout: Duration) -> Option<(Duration, Instant)> {
    Instant::now().checked_add(timeout).map(|deadline| (timeout, deadline))
}

/// Rolls a capacity reservation back unless the construction is confirmed
struct Reservation<'a, T> {
    shared: &'a PoolShared<T>,
    id: ResourceId,
    armed: bool,
}

impl<'a, T> Reservation<'a, T> {
    fn new(shared: &'a PoolShared<T>, id: ResourceId) -> Self {
        Self {
            shared,
            id,
            armed: true,
        }
    }

    fn commit(mut self) {
        self.armed = false;
    }
}

impl<T> Drop for Reservation<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.shared.state.lock();
            state.checked_out.remove(&self.id);
            self.shared.release_slot(&mut state);
        }
    }
}

/// Thread-safe pool holding at most `max_pool_size` live resources
///
/// Resources are built on demand by a factory and restored by a reset hook
/// every time they come back. When the pool is exhausted `acquire` blocks
/// until a lease is returned.
///
/// The factory and the reset hook must not call `acquire` on the same pool;
/// doing so deadlocks once capacity is reached.
///
/// Cloning a pool yields another handle to the same resources. The shared
/// state lives until the last handle and the last lease are dropped, so
/// dropping every handle while leases are out is safe: those resources are
/// destroyed once they come back.
///
/// # Examples
///
/// ```
/// use esox_resourcepool::ResourcePool;
///
/// let pool = ResourcePool::infallible(2, || Vec::<f64>::with_capacity(1024), |buf: &mut Vec<f64>| buf.clear())
///     .unwrap();
///
/// {
///     let mut buf = pool.acquire().unwrap();
///     buf.push(1.0);
///     assert_eq!(pool.in_use_count(), 1);
/// }
///
/// assert_eq!(pool.available_count(), 1);
/// assert!(pool.acquire().unwrap().is_empty());
/// ```
pub struct ResourcePool<T: Send + 'static> {
    shared: Arc<PoolShared<T>>,
}

impl<T: Send + 'static> Clone for ResourcePool<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Send + 'static> ResourcePool<T> {
    /// Create a pool of at most `max_size` resources
    pub fn new<F, E, R, RE>(max_size: usize, factory: F, reset: R) -> PoolResult<Self>
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
        R: Fn(&mut T) -> Result<(), RE> + Send + Sync + 'static,
        RE: Into<BoxError>,
    {
        Self::with_configuration(
            PoolConfiguration::new().with_max_pool_size(max_size),
            factory,
            reset,
        )
    }

    /// Create a pool whose factory and reset hook cannot fail
    pub fn infallible<F, R>(max_size: usize, factory: F, reset: R) -> PoolResult<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
        R: Fn(&mut T) + Send + Sync + 'static,
    {
        Self::new(
            max_size,
            move || Ok::<_, BoxError>(factory()),
            move |value: &mut T| {
                reset(value);
                Ok::<_, BoxError>(())
            },
        )
    }

    /// Create a pool from a full configuration, warming it up if requested
    pub fn with_configuration<F, E, R, RE>(
        config: PoolConfiguration,
        factory: F,
        reset: R,
    ) -> PoolResult<Self>
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
        R: Fn(&mut T) -> Result<(), RE> + Send + Sync + 'static,
        RE: Into<BoxError>,
    {
        config.validate()?;
        let warmup = config.warmup_size;

        let pool = Self {
            shared: Arc::new(PoolShared {
                state: Mutex::new(PoolState::new()),
                available: Condvar::new(),
                drained: Condvar::new(),
                factory: Box::new(move || -> Result<T, BoxError> { factory().map_err(Into::into) }),
                reset: Box::new(move |value: &mut T| -> Result<(), BoxError> {
                    reset(value).map_err(Into::into)
                }),
                config,
                metrics: MetricsTracker::new(),
            }),
        };

        if let Some(count) = warmup {
            pool.warmup(count)?;
        }
        Ok(pool)
    }

    /// Lease a resource, blocking while the pool is exhausted
    ///
    /// Waits at most the configured `acquire_timeout`, forever if none is set.
    pub fn acquire(&self) -> PoolResult<Lease<T>> {
        self.acquire_until(self.shared.config.acquire_timeout.and_then(deadline_after))
    }

    /// Lease a resource, waiting at most `timeout` for one to be returned
    pub fn acquire_timeout(&self, timeout: Duration) -> PoolResult<Lease<T>> {
        self.acquire_until(deadline_after(timeout))
    }

    /// Lease a resource without blocking
    ///
    /// Returns `PoolError::PoolExhausted` when every resource is leased and
    /// the pool is at capacity. May still run the factory.
    pub fn try_acquire(&self) -> PoolResult<Lease<T>> {
        let checkout = self.shared.state.lock().checkout(self.capacity())?;
        match checkout {
            Some(checkout) => self.complete(checkout),
            None => Err(PoolError::PoolExhausted),
        }
    }

    /// Lease a resource from async code
    ///
    /// Polls the pool until a resource frees up, bounded by the configured
    /// `acquire_timeout`. Dropping the future abandons the attempt without
    /// holding anything. The factory runs on the calling task.
    pub async fn acquire_async(&self) -> PoolResult<Lease<T>> {
        let attempt = async {
            loop {
                match self.try_acquire() {
                    Err(PoolError::PoolExhausted) => tokio::time::sleep(ASYNC_POLL_INTERVAL).await,
                    result => return result,
                }
            }
        };

        match self.shared.config.acquire_timeout {
            Some(timeout) => tokio::time::timeout(timeout, attempt)
                .await
                .map_err(|_| {
                    self.shared.metrics.record_timeout();
                    PoolError::Timeout(timeout)
                })?,
            None => attempt.await,
        }
    }

    fn acquire_until(&self, deadline: Option<(Duration, Instant)>) -> PoolResult<Lease<T>> {
        let mut state = self.shared.state.lock();
        let mut waited = false;

        loop {
            if let Some(checkout) = state.checkout(self.capacity())? {
                drop(state);
                return self.complete(checkout);
            }

            if let Some((timeout, deadline)) = deadline
                && Instant::now() >= deadline
            {
                self.shared.metrics.record_timeout();
                return Err(PoolError::Timeout(timeout));
            }

            if !waited {
                waited = true;
                self.shared.metrics.record_wait();
                trace!(pool = %self.name(), waiters = state.waiters + 1, "pool exhausted, waiting");
            }

            state.waiters += 1;
            match deadline {
                Some((_, deadline)) => {
                    self.shared.available.wait_until(&mut state, deadline);
                }
                None => self.shared.available.wait(&mut state),
            }
            state.waiters -= 1;
        }
    }

    fn complete(&self, checkout: Checkout<T>) -> PoolResult<Lease<T>> {
        match checkout {
            Checkout::Idle(slot) => {
                self.shared.metrics.record_acquired();
                Ok(Lease::new(slot.value, slot.id, Arc::clone(&self.shared)))
            }
            Checkout::Reserved(id) => {
                let value = self.construct(id)?;
                self.shared.metrics.record_acquired();
                Ok(Lease::new(value, id, Arc::clone(&self.shared)))
            }
        }
    }

    /// Run the factory for a reserved slot; the reservation is rolled back on failure
    fn construct(&self, id: ResourceId) -> PoolResult<T> {
        let reservation = Reservation::new(&self.shared, id);
        match (self.shared.factory)() {
            Ok(value) => {
                reservation.commit();
                self.shared.metrics.record_created();
                debug!(pool = %self.name(), resource = %id, "constructed resource");
                Ok(value)
            }
            Err(err) => {
                drop(reservation);
                self.shared.metrics.record_construction_failure();
                warn!(pool = %self.name(), error = %err, "resource construction failed");
                Err(PoolError::construction(err))
            }
        }
    }

    /// Pre-construct up to `count` idle resources, bounded by free capacity
    ///
    /// Returns how many resources were built.
    pub fn warmup(&self, count: usize) -> PoolResult<usize> {
        let mut created = 0;
        while created < count {
            let id = {
                let mut state = self.shared.state.lock();
                if state.closed {
                    return Err(PoolError::Closed);
                }
                if state.live >= self.capacity() {
                    break;
                }
                state.reserve()
            };

            let value = self.construct(id)?;
            let mut state = self.shared.state.lock();
            self.shared.take_lease(&mut state, id);
            if state.closed {
                self.shared.release_slot(&mut state);
                drop(state);
                drop(value);
                return Err(PoolError::Closed);
            }
            state.idle.push_back(Slot { id, value });
            drop(state);
            self.shared.available.notify_one();
            created += 1;
        }

        debug!(pool = %self.name(), created, "warmed up pool");
        Ok(created)
    }

    /// Close the pool and wait for every outstanding lease to come back
    ///
    /// New acquires fail with `PoolError::Closed`, blocked callers are woken
    /// with the same error and idle resources are destroyed right away.
    /// Leases returned afterwards are destroyed instead of being pooled.
    /// With a timeout, gives up with `PoolError::Timeout` if leases are
    /// still out at the deadline; the pool stays closed.
    pub fn shutdown(&self, timeout: Option<Duration>) -> PoolResult<()> {
        let mut state = self.shared.state.lock();
        state.closed = true;
        let idle = std::mem::take(&mut state.idle);
        state.live -= idle.len();
        let outstanding = state.live;
        drop(state);

        self.shared.available.notify_all();
        debug!(pool = %self.name(), destroyed = idle.len(), outstanding, "shutting down pool");
        drop(idle);

        let deadline = timeout.and_then(deadline_after);
        let mut state = self.shared.state.lock();
        while state.live > 0 {
            match deadline {
                Some((timeout, deadline)) => {
                    if self.shared.drained.wait_until(&mut state, deadline).timed_out()
                        && state.live > 0
                    {
                        return Err(PoolError::Timeout(timeout));
                    }
                }
                None => self.shared.drained.wait(&mut state),
            }
        }
        Ok(())
    }

    /// Snapshot of capacity, leased, idle and waiting counts
    pub fn stats(&self) -> PoolStats {
        self.shared.state.lock().stats(self.capacity())
    }

    /// Number of idle resources ready to be leased
    pub fn available_count(&self) -> usize {
        self.shared.state.lock().idle.len()
    }

    /// Number of leased resources, including constructions in flight
    pub fn in_use_count(&self) -> usize {
        let state = self.shared.state.lock();
        state.live - state.idle.len()
    }

    /// Maximum number of live resources
    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    pub fn name(&self) -> &str {
        self.shared.name()
    }

    pub fn configuration(&self) -> &PoolConfiguration {
        &self.shared.config
    }

    /// Whether both handles refer to the same pool
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Get health status
    pub fn get_health_status(&self) -> HealthStatus {
        HealthStatus::from_stats(&self.stats())
    }

    /// Get pool metrics
    pub fn get_metrics(&self) -> PoolMetrics {
        self.shared.metrics.get_metrics(self.stats())
    }

    /// Export metrics
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.get_metrics().export()
    }

    /// Export metrics in Prometheus format, labelled with the pool name
    pub fn export_metrics_prometheus(&self, tags: Option<&HashMap<String, String>>) -> String {
        MetricsExporter::export_prometheus(&self.get_metrics(), self.name(), tags)
    }
}

impl<T: Send + 'static> fmt::Debug for ResourcePool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePool")
            .field("name", &self.name())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[derive(Debug, Default)]
    struct Counter {
        hits: usize,
    }

    fn counter_pool(max_size: usize) -> ResourcePool<Counter> {
        ResourcePool::infallible(max_size, Counter::default, |c| c.hits = 0).unwrap()
    }

    #[test]
    fn test_zero_capacity_is_invalid() {
        let result = ResourcePool::infallible(0, Counter::default, |_| {});
        assert!(matches!(result, Err(PoolError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_acquire_constructs_then_reuses() {
        let pool = counter_pool(2);

        let first_id = {
            let lease = pool.acquire().unwrap();
            assert_eq!(pool.in_use_count(), 1);
            assert_eq!(pool.available_count(), 0);
            lease.id()
        };

        assert_eq!(pool.available_count(), 1);
        let lease = pool.acquire().unwrap();
        assert_eq!(lease.id(), first_id);
        assert_eq!(pool.get_metrics().total_created, 1);
    }

    #[test]
    fn test_idle_set_is_fifo() {
        let pool = counter_pool(3);
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        let (a_id, b_id) = (a.id(), b.id());

        drop(b);
        drop(a);

        let first = pool.acquire().unwrap();
        let second = pool.acquire().unwrap();
        assert_eq!(first.id(), b_id);
        assert_eq!(second.id(), a_id);
    }

    #[test]
    fn test_reset_runs_before_reuse() {
        let pool = counter_pool(1);
        {
            let mut lease = pool.acquire().unwrap();
            lease.hits = 7;
        }
        assert_eq!(pool.acquire().unwrap().hits, 0);
    }

    #[test]
    fn test_try_acquire_on_exhausted_pool() {
        let pool = counter_pool(1);
        let _held = pool.acquire().unwrap();
        assert!(matches!(pool.try_acquire(), Err(PoolError::PoolExhausted)));
    }

    #[test]
    fn test_acquire_timeout_expires() {
        let pool = counter_pool(1);
        let _held = pool.acquire().unwrap();

        let started = Instant::now();
        let result = pool.acquire_timeout(Duration::from_millis(30));
        assert!(matches!(result, Err(PoolError::Timeout(_))));
        assert!(started.elapsed() >= Duration::from_millis(30));
        assert_eq!(pool.stats().waiters, 0);
        assert_eq!(pool.get_metrics().timeouts, 1);
    }

    #[test]
    fn test_unbounded_timeouts_do_not_overflow() {
        let config = PoolConfiguration::new()
            .with_max_pool_size(1)
            .with_timeout(Duration::MAX);
        let pool = ResourcePool::with_configuration(
            config,
            || Ok::<_, BoxError>(Counter::default()),
            |_| Ok::<_, BoxError>(()),
        )
        .unwrap();

        drop(pool.acquire_timeout(Duration::MAX).unwrap());
        let held = pool.acquire().unwrap();

        let waiter = {
            let pool = pool.clone();
            thread::spawn(move || pool.acquire_timeout(Duration::MAX).map(|lease| lease.id()))
        };
        thread::sleep(Duration::from_millis(20));
        let held_id = held.id();
        drop(held);
        assert_eq!(waiter.join().unwrap().unwrap(), held_id);

        pool.shutdown(Some(Duration::MAX)).unwrap();
        assert!(pool.stats().closed);
    }

    #[test]
    fn test_configured_timeout_applies_to_acquire() {
        let config = PoolConfiguration::new()
            .with_max_pool_size(1)
            .with_timeout(Duration::from_millis(20));
        let pool = ResourcePool::with_configuration(
            config,
            || Ok::<_, BoxError>(Counter::default()),
            |_| Ok::<_, BoxError>(()),
        )
        .unwrap();

        let _held = pool.acquire().unwrap();
        assert!(matches!(pool.acquire(), Err(PoolError::Timeout(_))));
    }

    #[test]
    fn test_construction_failure_rolls_back_reservation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let factory_calls = Arc::clone(&calls);
        let pool = ResourcePool::new(
            1,
            move || {
                if factory_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err("device unavailable")
                } else {
                    Ok(Counter::default())
                }
            },
            |_| Ok::<_, BoxError>(()),
        )
        .unwrap();

        assert!(matches!(pool.acquire(), Err(PoolError::ConstructionFailed(_))));
        assert_eq!(pool.in_use_count(), 0);
        assert_eq!(pool.available_count(), 0);

        let lease = pool.acquire().unwrap();
        assert_eq!(lease.hits, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let metrics = pool.get_metrics();
        assert_eq!(metrics.construction_failures, 1);
        assert_eq!(metrics.total_created, 1);
    }

    #[test]
    fn test_reset_failure_discards_resource() {
        let pool = ResourcePool::new(
            1,
            || Ok::<_, BoxError>(Counter::default()),
            |c: &mut Counter| {
                if c.hits > 100 {
                    Err("counter saturated")
                } else {
                    c.hits = 0;
                    Ok(())
                }
            },
        )
        .unwrap();

        let mut lease = pool.acquire().unwrap();
        let broken_id = lease.id();
        lease.hits = 500;
        assert!(matches!(lease.release(), Err(PoolError::ResetFailed(_))));

        assert_eq!(pool.in_use_count(), 0);
        assert_eq!(pool.available_count(), 0);

        let fresh = pool.acquire().unwrap();
        assert_ne!(fresh.id(), broken_id);
        assert_eq!(pool.get_metrics().reset_failures, 1);
    }

    #[test]
    fn test_reset_failure_on_drop_frees_capacity_for_waiter() {
        let pool = ResourcePool::new(
            1,
            || Ok::<_, BoxError>(Counter::default()),
            |_: &mut Counter| Err::<(), _>("never resettable"),
        )
        .unwrap();

        let held = pool.acquire().unwrap();
        let waiter = {
            let pool = pool.clone();
            thread::spawn(move || pool.acquire().map(|lease| lease.id()))
        };

        thread::sleep(Duration::from_millis(20));
        let held_id = held.id();
        drop(held);

        let id = waiter.join().unwrap().unwrap();
        assert_ne!(id, held_id);
    }

    #[test]
    fn test_panicking_reset_frees_slot() {
        let pool = ResourcePool::new(
            1,
            || Ok::<_, BoxError>(Counter::default()),
            |c: &mut Counter| {
                if c.hits > 0 {
                    panic!("reset exploded");
                }
                Ok::<_, BoxError>(())
            },
        )
        .unwrap();

        let mut lease = pool.acquire().unwrap();
        let broken_id = lease.id();
        lease.hits = 1;
        drop(lease);

        let stats = pool.stats();
        assert_eq!(stats.in_use, 0);
        assert_eq!(stats.available, 0);
        assert_eq!(pool.get_metrics().reset_failures, 1);

        let fresh = pool.acquire_timeout(Duration::from_millis(50)).unwrap();
        assert_ne!(fresh.id(), broken_id);
        drop(fresh);
        pool.shutdown(Some(Duration::from_secs(1))).unwrap();
    }

    #[test]
    fn test_panicking_reset_surfaces_on_release() {
        let pool = ResourcePool::new(
            1,
            || Ok::<_, BoxError>(Counter::default()),
            |_: &mut Counter| -> Result<(), BoxError> { panic!("reset exploded") },
        )
        .unwrap();

        let lease = pool.acquire().unwrap();
        match lease.release() {
            Err(PoolError::ResetFailed(err)) => assert_eq!(err.to_string(), "reset hook panicked"),
            other => panic!("expected reset failure, got {:?}", other),
        }
        assert!(pool.try_acquire().is_ok());
    }

    #[test]
    fn test_detach_frees_slot() {
        let pool = counter_pool(1);
        let lease = pool.acquire().unwrap();
        let counter = lease.detach();
        assert_eq!(counter.hits, 0);

        assert_eq!(pool.in_use_count(), 0);
        assert!(pool.try_acquire().is_ok());
        assert_eq!(pool.get_metrics().total_created, 2);
    }

    #[test]
    fn test_warmup_is_bounded_by_capacity() {
        let pool = counter_pool(3);
        let _held = pool.acquire().unwrap();

        assert_eq!(pool.warmup(5).unwrap(), 2);
        assert_eq!(pool.available_count(), 2);
        assert_eq!(pool.in_use_count(), 1);
    }

    #[test]
    fn test_configured_warmup() {
        let config = PoolConfiguration::new().with_max_pool_size(4).with_warmup(2);
        let pool = ResourcePool::with_configuration(
            config,
            || Ok::<_, BoxError>(Counter::default()),
            |_| Ok::<_, BoxError>(()),
        )
        .unwrap();

        assert_eq!(pool.available_count(), 2);
    }

    #[test]
    fn test_shutdown_waits_for_outstanding_leases() {
        let pool = counter_pool(2);
        let lease = pool.acquire().unwrap();
        drop(pool.acquire().unwrap());
        assert_eq!(pool.available_count(), 1);

        let returner = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            drop(lease);
        });

        pool.shutdown(None).unwrap();
        returner.join().unwrap();

        let stats = pool.stats();
        assert!(stats.closed);
        assert_eq!(stats.in_use, 0);
        assert_eq!(stats.available, 0);
        assert!(matches!(pool.acquire(), Err(PoolError::Closed)));
    }

    #[test]
    fn test_shutdown_times_out_with_lease_out() {
        let pool = counter_pool(1);
        let _held = pool.acquire().unwrap();

        let result = pool.shutdown(Some(Duration::from_millis(20)));
        assert!(matches!(result, Err(PoolError::Timeout(_))));
        assert!(matches!(pool.try_acquire(), Err(PoolError::Closed)));
    }

    #[test]
    fn test_shutdown_wakes_blocked_callers() {
        let pool = counter_pool(1);
        let held = pool.acquire().unwrap();

        let waiter = {
            let pool = pool.clone();
            thread::spawn(move || pool.acquire().map(|_| ()))
        };
        thread::sleep(Duration::from_millis(20));

        let closer = {
            let pool = pool.clone();
            thread::spawn(move || pool.shutdown(None))
        };

        assert!(matches!(waiter.join().unwrap(), Err(PoolError::Closed)));
        drop(held);
        closer.join().unwrap().unwrap();
    }

    #[test]
    fn test_leases_outlive_pool_handle() {
        let pool = counter_pool(1);
        let mut lease = pool.acquire().unwrap();
        drop(pool);

        lease.hits = 3;
        assert!(lease.release().is_ok());
    }

    #[test]
    fn test_clone_shares_resources() {
        let pool = counter_pool(1);
        let other = pool.clone();
        assert!(pool.ptr_eq(&other));

        let _held = pool.acquire().unwrap();
        assert!(matches!(other.try_acquire(), Err(PoolError::PoolExhausted)));
    }

    #[tokio::test]
    async fn test_async_acquire_waits_for_return() {
        let pool = counter_pool(1);
        let held = pool.acquire().unwrap();
        let held_id = held.id();

        let releaser = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            drop(held);
        });

        let lease = pool.acquire_async().await.unwrap();
        assert_eq!(lease.id(), held_id);
        releaser.await.unwrap();
    }

    #[tokio::test]
    async fn test_async_acquire_times_out() {
        let config = PoolConfiguration::new()
            .with_max_pool_size(1)
            .with_timeout(Duration::from_millis(30));
        let pool = ResourcePool::with_configuration(
            config,
            || Ok::<_, BoxError>(Counter::default()),
            |_| Ok::<_, BoxError>(()),
        )
        .unwrap();

        let _held = pool.acquire().unwrap();
        assert!(matches!(
            pool.acquire_async().await,
            Err(PoolError::Timeout(_))
        ));
    }
}
