//! Basic usage examples for ResourcePool

use esox_resourcepool::{PoolError, Resource, ResourcePool};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

struct Connection {
    id: usize,
}

impl Resource for Connection {
    fn close(self) {
        println!("   [connection {} closed]", self.id);
    }
}

fn connection_factory() -> impl Fn() -> io::Result<Connection> + Send + Sync + 'static {
    let next_id = AtomicUsize::new(1);
    move || {
        Ok(Connection {
            id: next_id.fetch_add(1, Ordering::Relaxed),
        })
    }
}

fn main() {
    println!("=== EsoxSolutions.ResourcePool - Basic Examples ===\n");

    // Example 1: Get and put
    get_and_put();

    // Example 2: Resizing
    resizing();

    // Example 3: Blocking waiters
    blocking_waiters();

    // Example 4: Idle eviction
    idle_eviction();
}

fn get_and_put() {
    println!("1. Get and Put:");
    let pool = ResourcePool::new(connection_factory(), 2, 4, Duration::ZERO);

    let conn = pool.get().unwrap();
    println!("   Got connection {}", conn.id);
    println!("   Active: {}, In use: {}", pool.active(), pool.in_use());
    pool.put(Some(conn));

    {
        let conn = pool.acquire().unwrap();
        println!("   Reused connection {} via guard", conn.id);
    }

    // A broken connection is discarded; its slot is refilled lazily
    pool.acquire().unwrap().discard();
    println!("   Active after discard: {}\n", pool.active());
}

fn resizing() {
    println!("2. Resizing:");
    let pool = ResourcePool::new(connection_factory(), 2, 8, Duration::ZERO);

    pool.set_capacity(6).unwrap();
    println!("   Capacity: {}, Available: {}", pool.capacity(), pool.available());

    match pool.set_capacity(9) {
        Err(PoolError::CapacityOutOfRange { requested, max }) => {
            println!("   Rejected capacity {requested} (max {max})");
        }
        other => println!("   Unexpected: {other:?}"),
    }

    pool.close();
    println!("   Closed: {}\n", pool.is_closed());
}

fn blocking_waiters() {
    println!("3. Blocking Waiters:");
    let pool = Arc::new(ResourcePool::new(connection_factory(), 1, 1, Duration::ZERO));
    let held = pool.get().unwrap();

    let waiter = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || {
            let conn = pool.get().unwrap();
            println!("   Waiter got connection {}", conn.id);
            pool.put(Some(conn));
        })
    };

    thread::sleep(Duration::from_millis(50));
    pool.put(Some(held));
    waiter.join().unwrap();

    println!("   Wait count: {}, wait time: {:?}\n", pool.wait_count(), pool.wait_time());
}

fn idle_eviction() {
    println!("4. Idle Eviction:");
    let pool = ResourcePool::new(connection_factory(), 3, 3, Duration::from_millis(100));

    let conns: Vec<_> = (0..3).map(|_| pool.get().unwrap()).collect();
    for conn in conns {
        pool.put(Some(conn));
    }
    println!("   Active before idling: {}", pool.active());

    thread::sleep(Duration::from_millis(300));
    let stats = pool.stats();
    println!("   Active after idling: {}, idle closed: {}", stats.active, stats.idle_closed);
}
