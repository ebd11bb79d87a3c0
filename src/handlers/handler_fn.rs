//! # Function-backed handlers (`HandlerFn`, `AsyncHandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `Fn(&E) -> Result<(), HandlerError>` as a blocking handler.
//! [`AsyncHandlerFn`] wraps `Fn(E, CancellationToken) -> Fut` as a suspending handler and
//! produces a fresh future per invocation from a clone of the event.
//!
//! ## Concurrency semantics
//! - Each invocation of an [`AsyncHandlerFn`] owns its future and its event clone.
//! - No hidden mutation between invocations; if state must be shared, capture an
//!   `Arc<...>` explicitly inside the closure.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use eventstack::{AsyncHandlerFn, EventHandler, AsyncEventHandler, HandlerError, HandlerFn};
//!
//! #[derive(Clone)]
//! struct OrderPlaced { id: u64 }
//!
//! let audit = HandlerFn::<OrderPlaced, _>::new("audit", |e: &OrderPlaced| {
//!     let _ = e.id;
//!     Ok::<_, HandlerError>(())
//! });
//! let mailer = AsyncHandlerFn::<OrderPlaced, _>::new("mailer", |e: OrderPlaced, ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Err(HandlerError::Canceled);
//!     }
//!     let _ = e.id;
//!     Ok::<_, HandlerError>(())
//! });
//!
//! assert_eq!(EventHandler::<OrderPlaced>::name(&audit), "audit");
//! assert_eq!(AsyncEventHandler::<OrderPlaced>::name(&mailer), "mailer");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::HandlerError;
use crate::events::Event;
use crate::handlers::handler::{AsyncEventHandler, EventHandler};

/// Closure-backed blocking handler.
pub struct HandlerFn<E, F> {
    name: Cow<'static, str>,
    f: F,
    _event: PhantomData<fn(&E)>,
}

impl<E, F> HandlerFn<E, F> {
    /// Creates a new function-backed handler.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            _event: PhantomData,
        }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<E, F> fmt::Debug for HandlerFn<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn").field("name", &self.name).finish()
    }
}

impl<E, F> EventHandler<E> for HandlerFn<E, F>
where
    E: Event,
    F: Fn(&E) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    fn handle(&self, event: &E) -> Result<(), HandlerError> {
        (self.f)(event)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Closure-backed suspending handler.
///
/// The closure receives an owned clone of the event so the returned future can be `'static`.
pub struct AsyncHandlerFn<E, F> {
    name: Cow<'static, str>,
    f: F,
    _event: PhantomData<fn(E)>,
}

impl<E, F> AsyncHandlerFn<E, F> {
    /// Creates a new function-backed suspending handler.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            _event: PhantomData,
        }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<E, F> fmt::Debug for AsyncHandlerFn<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncHandlerFn")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<E, F, Fut> AsyncEventHandler<E> for AsyncHandlerFn<E, F>
where
    E: Event + Clone,
    F: Fn(E, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle_async(&self, event: &E, ctx: CancellationToken) -> Result<(), HandlerError> {
        (self.f)(event.clone(), ctx).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
