//! Scoped ownership of a pooled resource

use crate::errors::PoolResult;
use crate::pool::{PoolShared, ResourceId};

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// A leased resource that goes back to its pool when dropped
///
/// A lease is move-only and returns its resource exactly once: either
/// through [`Lease::release`], which consumes it, or when it goes out of
/// scope. The resource is reset before any other caller can see it.
///
/// # Examples
///
/// ```
/// use esox_resourcepool::ResourcePool;
///
/// let pool = ResourcePool::infallible(1, || 0u64, |n| *n = 0).unwrap();
///
/// let mut lease = pool.acquire().unwrap();
/// *lease += 41;
/// lease.release().unwrap();
///
/// assert_eq!(*pool.acquire().unwrap(), 0);
/// ```
pub struct Lease<T: Send + 'static> {
    value: Option<T>,
    id: ResourceId,
    pool: Arc<PoolShared<T>>,
}

impl<T: Send + 'static> Lease<T> {
    pub(crate) fn new(value: T, id: ResourceId, pool: Arc<PoolShared<T>>) -> Self {
        Self {
            value: Some(value),
            id,
            pool,
        }
    }

    /// Identity of the leased resource
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Return the resource to its pool now
    ///
    /// Surfaces a reset failure, in which case the resource was discarded
    /// and its slot freed. Dropping the lease does the same but only logs
    /// the failure.
    pub fn release(mut self) -> PoolResult<()> {
        match self.value.take() {
            Some(value) => self.pool.give_back(self.id, value),
            None => Ok(()),
        }
    }

    /// Take the resource out of the pool for good, freeing its slot
    pub fn detach(mut self) -> T {
        let value = self.value.take().expect("lease already released");
        self.pool.forget(self.id);
        value
    }
}

impl<T: Send + 'static> Deref for Lease<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.value.as_ref().expect("lease already released")
    }
}

impl<T: Send + 'static> DerefMut for Lease<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.value.as_mut().expect("lease already released")
    }
}

impl<T: Send + 'static> Drop for Lease<T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            // reset failures are logged by the pool
            let _ = self.pool.give_back(self.id, value);
        }
    }
}

impl<T: Send + fmt::Debug + 'static> fmt::Debug for Lease<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("id", &self.id)
            .field("value", &self.value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::ResourcePool;

    #[test]
    fn test_drop_returns_resource() {
        let pool = ResourcePool::infallible(1, String::new, |s| s.clear()).unwrap();
        {
            let mut lease = pool.acquire().unwrap();
            lease.push_str("scratch");
            assert_eq!(pool.available_count(), 0);
        }
        assert_eq!(pool.available_count(), 1);
        assert!(pool.acquire().unwrap().is_empty());
    }

    #[test]
    fn test_early_return_releases() {
        fn fails_midway(pool: &ResourcePool<Vec<u8>>) -> Result<(), String> {
            let mut lease = pool.acquire().map_err(|e| e.to_string())?;
            lease.extend_from_slice(b"partial");
            Err("bailed out".to_string())
        }

        let pool = ResourcePool::infallible(1, Vec::<u8>::new, |v| v.clear()).unwrap();
        assert!(fails_midway(&pool).is_err());
        assert_eq!(pool.in_use_count(), 0);
        assert_eq!(pool.available_count(), 1);
    }

    #[test]
    fn test_release_is_counted_once() {
        let pool = ResourcePool::infallible(1, || 0u32, |_| {}).unwrap();
        let lease = pool.acquire().unwrap();
        lease.release().unwrap();

        let metrics = pool.get_metrics();
        assert_eq!(metrics.total_acquired, 1);
        assert_eq!(metrics.total_released, 1);
    }

    #[test]
    fn test_debug_shows_id() {
        let pool = ResourcePool::infallible(1, || 5u8, |_| {}).unwrap();
        let lease = pool.acquire().unwrap();
        let rendered = format!("{:?}", lease);
        assert!(rendered.contains("Lease"));
        assert!(rendered.contains("5"));
    }
}
