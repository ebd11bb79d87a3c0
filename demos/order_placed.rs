//! # Example: order_placed
//!
//! One event type, three consumers: one succeeds, one fails, one outlives the deadline.
//!
//! Demonstrates how to:
//! - Register a blocking closure ([`HandlerFn`]) and a cancellable async handler.
//! - Publish under both invocation policies.
//! - Inspect the [`AggregateDispatchFailure`] returned to the producer.
//! - Bound a publish with a deadline-derived [`CancellationToken`].
//!
//! ## Flow
//! ```text
//! OrderPlaced { id: 42 } ──► Dispatcher::publish()
//!     ├─► stock   (blocking)   ─► counter += 1
//!     ├─► mailer  (suspending) ─► Err("smtp unavailable")
//!     └─► reporting (suspending) ─► cancelled by deadline
//!           └─► Err(AggregateDispatchFailure { mailer, reporting })
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=eventstack=debug cargo run --example order_placed
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eventstack::{
    AggregateDispatchFailure, AsyncEventHandler, Dispatcher, DispatcherConfig, HandlerError,
    HandlerFn,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug)]
struct OrderPlaced {
    id: u64,
}

/// Sends a confirmation mail; the relay is always down in this demo.
struct Mailer;

#[async_trait]
impl AsyncEventHandler<OrderPlaced> for Mailer {
    async fn handle_async(&self, e: &OrderPlaced, _ctx: CancellationToken) -> Result<(), HandlerError> {
        println!("[mailer] order {}", e.id);
        Err(HandlerError::fail("smtp unavailable"))
    }

    fn name(&self) -> &str {
        "mailer"
    }
}

/// Takes longer than the publish deadline and honors cancellation.
struct Reporting;

#[async_trait]
impl AsyncEventHandler<OrderPlaced> for Reporting {
    async fn handle_async(&self, e: &OrderPlaced, ctx: CancellationToken) -> Result<(), HandlerError> {
        tokio::select! {
            _ = ctx.cancelled() => {
                println!("[reporting] order {} cancelled", e.id);
                Err(HandlerError::Canceled)
            }
            _ = tokio::time::sleep(Duration::from_secs(5)) => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "reporting"
    }
}

fn report(policy: &str, res: Result<(), AggregateDispatchFailure>) {
    match res {
        Ok(()) => println!("[{policy}] all handlers succeeded"),
        Err(agg) => {
            println!("[{policy}] {agg}");
            for f in &agg.failures {
                println!("  - {} ({}): {}", f.handler, f.shape, f.kind);
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Logging (the dispatcher emits tracing events)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 2. Wire handlers once at startup
    let stock = Arc::new(AtomicUsize::new(0));
    let s = Arc::clone(&stock);
    let reserve = HandlerFn::<OrderPlaced, _>::arc("stock", move |_: &OrderPlaced| {
        s.fetch_add(1, Ordering::SeqCst);
        Ok::<_, HandlerError>(())
    });

    for cfg in [DispatcherConfig::sequential(), DispatcherConfig::concurrent()] {
        let dispatcher = Dispatcher::builder(cfg)
            .configure(|r| {
                r.register::<OrderPlaced, _>(reserve.clone())?;
                r.register_async::<OrderPlaced, _>(Arc::new(Mailer))?;
                r.register_async::<OrderPlaced, _>(Arc::new(Reporting))?;
                Ok(())
            })?
            .build();

        // 3. Caller-derived deadline: cancel the token after 200ms
        let token = CancellationToken::new();
        let deadline = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            deadline.cancel();
        });

        // 4. Publish and inspect the aggregate
        let res = dispatcher.publish(&OrderPlaced { id: 42 }, &token).await;
        report(cfg.invocation.as_str(), res);
    }

    println!("stock reserved {} time(s)", stock.load(Ordering::SeqCst));
    Ok(())
}
