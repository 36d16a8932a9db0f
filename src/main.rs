// EsoxSolutions.ResourcePool
// Bounded pool of expensive resources with lazy creation and idle eviction

// This is just a binary wrapper - the actual library is in lib.rs
// Run examples with: cargo run --example basic

use esox_resourcepool::{PoolConfiguration, Resource, ResourcePool};
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

struct DemoConnection {
    id: usize,
}

impl Resource for DemoConnection {
    fn close(self) {
        tracing::info!(id = self.id, "connection closed");
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== EsoxSolutions.ResourcePool ===");
    println!("See demos/ directory for usage examples");
    println!("Run: cargo run --example basic");
    println!();

    let config = PoolConfiguration::new()
        .with_initial_capacity(2)
        .with_max_capacity(4)
        .with_idle_timeout(Duration::from_millis(200));

    let pool = ResourcePool::with_config(
        || {
            let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
            tracing::info!(id, "connection opened");
            Ok::<_, Infallible>(DemoConnection { id })
        },
        config,
    );

    match pool.acquire() {
        Ok(conn) => println!("  Got connection: {}", conn.id),
        Err(err) => println!("  Acquire failed: {err}"),
    }
    println!("  Stats after return: {:?}", pool.stats());

    std::thread::sleep(Duration::from_millis(500));
    println!("  Stats after idle timeout: {:?}", pool.stats());

    pool.close();
}
