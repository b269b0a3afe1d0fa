//! Basic usage examples for ResourcePool

use esox_resourcepool::{BoxError, PoolConfiguration, PoolError, ResourcePool};
use std::time::Duration;

/// Stand-in for an expensive transform engine
#[derive(Debug)]
struct TransformEngine {
    twiddles: Vec<f64>,
    scratch: Vec<f64>,
}

impl TransformEngine {
    fn plan(size: usize) -> Result<Self, BoxError> {
        let twiddles = (0..size)
            .map(|k| (2.0 * std::f64::consts::PI * k as f64 / size as f64).cos())
            .collect();
        Ok(Self {
            twiddles,
            scratch: vec![0.0; size],
        })
    }

    fn clear(&mut self) -> Result<(), BoxError> {
        self.scratch.fill(0.0);
        Ok(())
    }
}

fn main() {
    println!("=== EsoxSolutions.ResourcePool - Basic Examples ===\n");

    // Example 1: Simple pool
    simple_pool();

    // Example 2: Pool with configuration
    configured_pool();

    // Example 3: Try methods and timeouts
    try_methods();

    // Example 4: Metrics and health
    metrics_and_health();
}

fn simple_pool() {
    println!("1. Simple Pool:");
    let pool = ResourcePool::new(2, || TransformEngine::plan(256), TransformEngine::clear).unwrap();

    {
        let mut engine = pool.acquire().unwrap();
        engine.scratch[0] = 1.0;
        println!("   Got engine {} with {} twiddles", engine.id(), engine.twiddles.len());
        // Engine automatically reset and returned when dropped
    }

    println!("   Available after return: {}\n", pool.available_count());
}

fn configured_pool() {
    println!("2. Configured Pool:");

    let config = PoolConfiguration::new()
        .with_name("transforms")
        .with_max_pool_size(4)
        .with_warmup(2)
        .with_timeout(Duration::from_secs(1));

    let pool = ResourcePool::with_configuration(config, || TransformEngine::plan(64), TransformEngine::clear)
        .unwrap();

    {
        let _first = pool.acquire().unwrap();
        let _second = pool.acquire().unwrap();
        println!("   In use: {}", pool.in_use_count());
        println!("   Available: {}", pool.available_count());
    }

    println!("   After return - Available: {}\n", pool.available_count());
}

fn try_methods() {
    println!("3. Try Methods:");
    let pool = ResourcePool::infallible(1, || 0u64, |n| *n = 0).unwrap();

    let first = pool.try_acquire();
    assert!(first.is_ok());
    println!("   First try: Success");

    match pool.try_acquire() {
        Err(PoolError::PoolExhausted) => println!("   Second try: pool exhausted"),
        other => println!("   Second try: unexpected {:?}", other.map(|lease| lease.id())),
    }

    match pool.acquire_timeout(Duration::from_millis(50)) {
        Err(e) => println!("   Timed acquire: {}", e),
        Ok(_) => println!("   Timed acquire: Success"),
    }

    drop(first);

    assert!(pool.try_acquire().is_ok());
    println!("   Third try: Success\n");
}

fn metrics_and_health() {
    println!("4. Metrics and Health:");
    let pool = ResourcePool::infallible(5, || vec![0u8; 1024], |buf: &mut Vec<u8>| buf.fill(0)).unwrap();

    {
        let _buf1 = pool.acquire().unwrap();
        let _buf2 = pool.acquire().unwrap();

        let health = pool.get_health_status();
        println!("   Health: {}", if health.is_healthy { "Healthy" } else { "Unhealthy" });
        println!("   Utilization: {:.1}%", health.utilization * 100.0);
        println!("   In use: {}, Available: {}", health.in_use, health.available);
    }

    let metrics = pool.export_metrics();
    println!("\n   Metrics:");
    for (key, value) in metrics {
        println!("     {}: {}", key, value);
    }
}
