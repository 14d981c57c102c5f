//! Numbered tasks on an elastic pool
//!
//! Starts a pool with 3 to 10 workers and room for 100 queued tasks, submits
//! 100 tasks that each print their number and sleep for a second, then shuts
//! the pool down after a few seconds whatever is still queued.
//!
//! Run with: RUST_LOG=info cargo run --example numbered_tasks

use dynamic_thread_pool::prelude::*;
use std::thread;
use std::time::Duration;

fn task(number: usize) {
    println!(
        "thread {:?} is working, number = {}",
        thread::current().name().unwrap_or("unnamed"),
        number
    );
    thread::sleep(Duration::from_secs(1));
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ThreadPoolConfig::new(3, 10, 100).with_manager_interval(Duration::from_secs(1));
    let pool = ThreadPool::with_config(config)?;

    for i in 0..100 {
        pool.execute_with(task, i + 100);
    }

    thread::sleep(Duration::from_secs(5));

    let before = pool.stats();
    println!(
        "\n{} live workers, {} busy, {} tasks still queued",
        before.live_workers, before.busy_workers, before.queued_tasks
    );

    pool.shutdown()?;

    let stats = pool.stats();
    println!("Completed: {}", stats.tasks_completed);
    println!("Discarded: {}", stats.tasks_discarded);
    println!("Workers spawned: {}", stats.workers_spawned);
    println!("Workers retired: {}", stats.workers_retired);

    Ok(())
}
