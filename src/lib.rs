//! # EsoxSolutions.ResourcePool
//!
//! Bounded, thread-safe pool for expensive-to-build resources such as
//! compute contexts, transform engines or factorization workspaces.
//!
//! ## Features
//!
//! - Hard cap on live resources, enforced even while constructions run
//! - Construction outside the pool lock, rolled back if the factory fails
//! - Blocking acquire with optional timeout, non-blocking and async variants
//! - Automatic return of resources via RAII (Drop trait), reset before reuse
//! - Size-tiered registry that lazily creates one pool per tier
//! - Pool warm-up and graceful shutdown
//! - Metrics, health status and Prometheus text export
//! - `tracing` events for construction, failures and shutdown
//!
//! ## Quick Start
//!
//! ```rust
//! use esox_resourcepool::ResourcePool;
//!
//! let pool = ResourcePool::infallible(2, || vec![0u32; 16], |v: &mut Vec<u32>| v.fill(0)).unwrap();
//! {
//!     let mut scratch = pool.acquire().unwrap();
//!     scratch[0] = 7;
//!     // Resource reset and returned when `scratch` goes out of scope
//! }
//! assert_eq!(pool.acquire().unwrap()[0], 0);
//! ```

mod pool;
mod lease;
mod registry;
mod config;
mod metrics;
mod health;
mod errors;

pub use pool::{ResourcePool, ResourceId};
pub use lease::Lease;
pub use registry::{PoolRegistry, TierPolicy};
pub use config::{PoolConfiguration, RegistryConfiguration};
pub use metrics::{PoolMetrics, PoolStats, MetricsExporter};
pub use health::HealthStatus;
pub use errors::{BoxError, HookError, PoolError, PoolResult};
