//! Async usage examples

use esox_resourcepool::{BoxError, PoolConfiguration, ResourcePool};
use std::time::Duration;
use tokio::time::sleep;

#[tokio::main]
async fn main() {
    println!("=== EsoxSolutions.ResourcePool - Async Examples ===\n");

    // Example 1: Async acquire
    async_acquire().await;

    // Example 2: Async with timeout
    async_with_timeout().await;

    // Example 3: Concurrent access
    concurrent_access().await;
}

fn context_pool(config: PoolConfiguration) -> ResourcePool<Vec<f32>> {
    ResourcePool::with_configuration(
        config,
        || Ok::<_, BoxError>(vec![0.0f32; 512]),
        |ctx: &mut Vec<f32>| {
            ctx.fill(0.0);
            Ok::<_, BoxError>(())
        },
    )
    .unwrap()
}

async fn async_acquire() {
    println!("1. Async Acquire:");
    let pool = context_pool(PoolConfiguration::new().with_max_pool_size(2));

    {
        let ctx = pool.acquire_async().await.unwrap();
        println!("   Got context {} asynchronously", ctx.id());
    }

    println!();
}

async fn async_with_timeout() {
    println!("2. Async with Timeout:");

    let pool = context_pool(
        PoolConfiguration::new()
            .with_max_pool_size(1)
            .with_timeout(Duration::from_millis(100)),
    );

    // Hold the only context
    let _ctx = pool.acquire().unwrap();

    // Try to get another (should timeout)
    match pool.acquire_async().await {
        Ok(_) => println!("   Got context"),
        Err(e) => println!("   Error: {}", e),
    }

    println!();
}

async fn concurrent_access() {
    println!("3. Concurrent Access:");

    let pool = context_pool(PoolConfiguration::new().with_max_pool_size(3).with_name("kernels"));

    let mut handles = vec![];
    for task in 0..10 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            if let Ok(mut ctx) = pool.acquire_async().await {
                ctx[0] = task as f32;
                sleep(Duration::from_millis(10)).await;
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let metrics = pool.get_metrics();
    println!("   Total acquired: {}", metrics.total_acquired);
    println!("   Total created: {}", metrics.total_created);
    println!("   Available: {}", metrics.available);
}
