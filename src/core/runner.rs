//! # Run a single handler invocation.
//!
//! Invokes one [`Registration`] for one event and converts whatever happens into
//! `Result<(), FailureKind>`:
//!
//! ```text
//! Ok(())                     → Ok(())
//! Err(HandlerError::Fail)    → FailureKind::Failed
//! Err(HandlerError::Canceled)→ FailureKind::Cancelled
//! panic                      → FailureKind::Panicked   (caught, never propagated)
//! ```
//!
//! ## Rules
//! - Blocking handlers run inline on the caller's context.
//! - Suspending handlers get a clone of the token; cancellation stays advisory.
//! - Panics are caught with `catch_unwind` (`AssertUnwindSafe`), so a handler that
//!   panics while holding a lock may leave its own shared state poisoned.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::core::registry::Registration;
use crate::error::FailureKind;
use crate::handlers::erased::{AnyEvent, ErasedBlocking, ErasedSuspending, Invoker};

/// Invokes `registration` according to its shape.
pub(crate) async fn run_once(
    registration: &Registration,
    event: AnyEvent<'_>,
    ctx: &CancellationToken,
) -> Result<(), FailureKind> {
    match registration.invoker() {
        Invoker::Blocking(handler) => run_blocking(handler.as_ref(), event),
        Invoker::Suspending(handler) => run_suspending(handler.as_ref(), event, ctx.clone()).await,
    }
}

/// Runs a blocking handler inline, catching panics.
pub(crate) fn run_blocking(
    handler: &dyn ErasedBlocking,
    event: AnyEvent<'_>,
) -> Result<(), FailureKind> {
    match std::panic::catch_unwind(AssertUnwindSafe(|| handler.invoke(event))) {
        Ok(res) => res.map_err(FailureKind::from),
        Err(panic_err) => Err(FailureKind::Panicked {
            info: panic_message(&*panic_err),
        }),
    }
}

/// Awaits a suspending handler, catching panics raised while polling it.
pub(crate) async fn run_suspending(
    handler: &dyn ErasedSuspending,
    event: AnyEvent<'_>,
    ctx: CancellationToken,
) -> Result<(), FailureKind> {
    let fut = handler.invoke(event, ctx);
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res.map_err(FailureKind::from),
        Err(panic_err) => Err(FailureKind::Panicked {
            info: panic_message(&*panic_err),
        }),
    }
}

fn panic_message(any: &(dyn Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
