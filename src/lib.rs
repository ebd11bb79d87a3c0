//! # eventstack
//!
//! **eventstack** is an in-process event dispatcher for CQRS-style applications.
//!
//! A published event is routed to every handler registered for its exact type. Each
//! handler is either **blocking** ([`EventHandler`]) or **suspending** and cancellable
//! ([`AsyncEventHandler`]). Handler failures are isolated: one failing consumer never
//! hides another's outcome, and every failure comes back to the producer in a single
//! [`AggregateDispatchFailure`].
//!
//! There is no broker, persistence, or cross-process delivery. Everything runs on the
//! caller's task.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ EventHandler │   │AsyncEvent    │   │ HandlerFn /  │
//!     │  (blocking)  │   │Handler(async)│   │AsyncHandlerFn│
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  HandlerRegistry (wired once at startup, read-only afterwards)    │
//! │  EventType(TypeId) ──► [Registration, Registration, ...]          │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Dispatcher::publish(&event, &token)                              │
//! │   - resolve by exact type                                         │
//! │   - InvocationPolicy: Sequential | Concurrent                     │
//! │   - FailurePolicy:    Continue   | ShortCircuit                   │
//! │   - runner::run_once: error / cancel / panic → FailureKind        │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                 Ok(()) | Err(AggregateDispatchFailure)
//!                          (failures in registration order)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                               |
//! |-------------------|--------------------------------------------------------------|--------------------------------------------------|
//! | **Handlers**      | Blocking and cancellable async contracts, closure adapters.  | [`EventHandler`], [`AsyncEventHandler`], [`HandlerFn`] |
//! | **Registry**      | Exact-type lookup, insertion order, duplicate detection.     | [`HandlerRegistry`], [`EventType`]               |
//! | **Dispatch**      | Publish, runtime-typed publish, spawned publish.             | [`Dispatcher`], [`DispatcherBuilder`]            |
//! | **Policies**      | Sequential/concurrent scheduling, continue/short-circuit.    | [`InvocationPolicy`], [`FailurePolicy`]          |
//! | **Errors**        | Per-handler failures aggregated per publish.                 | [`AggregateDispatchFailure`], [`HandlerFailure`] |
//! | **Configuration** | Centralize dispatcher settings.                              | [`DispatcherConfig`]                             |
//!
//! ## Logging
//! The dispatcher emits [`tracing`] events (`debug` per publish, `warn` per failed
//! handler). Install any subscriber to see them.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use eventstack::{AsyncEventHandler, Dispatcher, DispatcherConfig, HandlerError};
//!
//! struct OrderPlaced { id: u64 }
//!
//! struct Billing;
//!
//! #[async_trait]
//! impl AsyncEventHandler<OrderPlaced> for Billing {
//!     async fn handle_async(&self, e: &OrderPlaced, ctx: CancellationToken) -> Result<(), HandlerError> {
//!         if ctx.is_cancelled() {
//!             return Err(HandlerError::Canceled);
//!         }
//!         if e.id == 0 {
//!             return Err(HandlerError::fail("boom"));
//!         }
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str { "billing" }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::builder(DispatcherConfig::concurrent())
//!         .configure(|r| r.register_async::<OrderPlaced, _>(Arc::new(Billing)).map(|_| ()))?
//!         .build();
//!
//!     let token = CancellationToken::new();
//!     dispatcher.publish(&OrderPlaced { id: 1 }, &token).await?;
//!
//!     let Err(failure) = dispatcher.publish(&OrderPlaced { id: 0 }, &token).await else {
//!         unreachable!("id 0 fails");
//!     };
//!     assert_eq!(failure.failures[0].message(), Some("boom"));
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod handlers;
mod policies;

// ---- Public re-exports ----

pub use crate::core::{
    Dispatcher, DispatcherBuilder, DispatcherConfig, HandlerRegistry, Registration,
};
pub use error::{
    AggregateDispatchFailure, DispatchResult, FailureKind, HandlerError, HandlerFailure,
    RegistryError,
};
pub use events::{Event, EventType};
pub use handlers::{
    AsyncEventHandler, AsyncHandlerFn, EventHandler, HandlerFn, HandlerId, HandlerShape,
};
pub use policies::{FailurePolicy, InvocationPolicy};
