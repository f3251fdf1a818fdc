//! # Example: flaky_feed
//!
//! Polls a feed that fails a few times in a row, showing how the delay between
//! invocations doubles on every failure and snaps back after the next success.
//!
//! ## Flow
//! ```text
//! start(force=true)
//!   ├─► invoke #1 → Err("feed unavailable")  error_count=1  next in 400ms
//!   ├─► invoke #2 → Err("feed unavailable")  error_count=2  next in 800ms
//!   ├─► invoke #3 → Err("feed unavailable")  error_count=3  next in 1000ms (capped)
//!   ├─► invoke #4 → Ok(4)                    error_count=0  next in 200ms
//!   │       └─► subscriber prints "item #4"
//!   └─► ...
//! destroy()
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example flaky_feed
//! ```

use std::{
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};

use pollvisor::{ActionError, ConfigUpdate, LogWriter, Poller};

static CALLS: AtomicU32 = AtomicU32::new(0);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // 1. Create a named poller: 200ms between successes, backoff capped at 1s
    let feed: Poller<u32> = Poller::create(
        "flaky-feed",
        Some(
            ConfigUpdate::new()
                .interval(Duration::from_millis(200))
                .max_interval(Duration::from_secs(1)),
        ),
    )?;

    // 2. Route lifecycle events into tracing
    LogWriter::new().spawn(feed.events());

    // 3. The feed is down for the first three calls
    feed.set_action(|| async {
        let call = CALLS.fetch_add(1, Ordering::Relaxed) + 1;
        if call <= 3 {
            return Err(ActionError::fail("feed unavailable"));
        }
        Ok(call)
    });

    // 4. Only successful results reach subscribers
    feed.subscribe(|item: &u32| println!("[feed] item #{item}"));

    // 5. Run for a while, then release the name
    feed.start(true)?;
    tokio::time::sleep(Duration::from_secs(3)).await;

    let status = feed.status();
    println!(
        "[main] invocations={} error_count={}",
        status.invocations, status.error_count
    );

    feed.destroy();
    println!("[main] done.");
    Ok(())
}
