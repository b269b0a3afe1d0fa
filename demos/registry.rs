//! Size-tiered registry examples

use esox_resourcepool::{BoxError, PoolRegistry, RegistryConfiguration, TierPolicy};
use std::sync::Arc;
use std::thread;

/// Stand-in for a factorization workspace sized for an n x n system
struct Workspace {
    n: usize,
    pivots: Vec<usize>,
    lu: Vec<f64>,
}

fn main() {
    println!("=== EsoxSolutions.ResourcePool - Registry Examples ===\n");

    let config = RegistryConfiguration::new()
        .with_name("lu")
        .with_tier_policy(TierPolicy::PowerOfTwo)
        .with_tier_capacity(|tier| if tier >= 256 { 1 } else { 4 });

    let registry = Arc::new(
        PoolRegistry::new(
            config,
            |n| {
                Ok::<_, BoxError>(Workspace {
                    n,
                    pivots: (0..n).collect(),
                    lu: vec![0.0; n * n],
                })
            },
            |ws: &mut Workspace| {
                ws.lu.fill(0.0);
                for (i, p) in ws.pivots.iter_mut().enumerate() {
                    *p = i;
                }
                Ok::<_, BoxError>(())
            },
        )
        .unwrap(),
    );

    let handles: Vec<_> = [10usize, 30, 60, 100, 200, 300]
        .into_iter()
        .map(|n| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let mut ws = registry.acquire(n).unwrap();
                ws.lu[0] = n as f64;
                ws.pivots.swap(0, 1);
                println!("   System of size {} solved in a {}x{} workspace", n, ws.n, ws.n);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    println!();
    for (tier, stats) in registry.stats() {
        println!("   Tier {:>4}: capacity {}, idle {}", tier, stats.capacity, stats.available);
    }
}
