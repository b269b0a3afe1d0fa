// EsoxSolutions.ResourcePool
// Bounded, thread-safe resource pool with leases and size-tiered registries

// This is just a binary wrapper - the actual library is in lib.rs
// Run demos with: cargo run --example basic

use esox_resourcepool::{BoxError, PoolRegistry, RegistryConfiguration};
use std::thread;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), BoxError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== EsoxSolutions.ResourcePool ===");
    println!("See demos/ directory for usage examples");
    println!("Run: cargo run --example basic");
    println!();

    // Quick demo: workers share size-tiered scratch workspaces
    println!("Quick Demo:");
    let registry = PoolRegistry::new(
        RegistryConfiguration::new().with_name("workspaces").with_max_pool_size(2),
        |tier| Ok::<_, BoxError>(vec![0.0f64; tier]),
        |workspace: &mut Vec<f64>| {
            workspace.fill(0.0);
            Ok::<_, BoxError>(())
        },
    )?;

    thread::scope(|scope| {
        for worker in 0..6usize {
            let registry = &registry;
            scope.spawn(move || {
                let size = 40 + worker * 20;
                match registry.acquire(size) {
                    Ok(mut workspace) => {
                        workspace[0] = worker as f64;
                        println!("  Worker {} got a {}-element workspace", worker, workspace.len());
                    }
                    Err(err) => eprintln!("  Worker {} failed: {}", worker, err),
                }
            });
        }
    });

    for (tier, stats) in registry.stats() {
        println!("  Tier {}: {} idle of {}", tier, stats.available, stats.capacity);
    }
    Ok(())
}
