//! # Handler contracts.
//!
//! A handler processes one event type in one of two shapes:
//! - [`EventHandler`] **blocking**: runs to completion on the dispatcher's context.
//! - [`AsyncEventHandler`] **suspending**: may await, receives a [`CancellationToken`].
//!
//! One type may implement both shapes, for as many event types as it likes. Each
//! `(event type, shape)` pair is registered separately.
//!
//! Handlers only ever see `&E`. Side effects performed before a failure are not rolled
//! back by the dispatcher.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::HandlerError;
use crate::events::Event;

/// # Blocking handler for events of type `E`.
///
/// # Example
/// ```
/// use eventstack::{EventHandler, HandlerError};
///
/// struct OrderPlaced { id: u64 }
/// struct Audit;
///
/// impl EventHandler<OrderPlaced> for Audit {
///     fn handle(&self, event: &OrderPlaced) -> Result<(), HandlerError> {
///         if event.id == 0 {
///             return Err(HandlerError::fail("missing order id"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait EventHandler<E: Event>: Send + Sync + 'static {
    /// Processes the event synchronously.
    fn handle(&self, event: &E) -> Result<(), HandlerError>;

    /// Returns the handler name used in logs and failure reports.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// # Suspending, cancellable handler for events of type `E`.
///
/// The token is advisory: check `ctx.is_cancelled()` (or select on `ctx.cancelled()`)
/// and return [`HandlerError::Canceled`] to report an early exit.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use eventstack::{AsyncEventHandler, HandlerError};
///
/// struct OrderPlaced { id: u64 }
/// struct Mailer;
///
/// #[async_trait]
/// impl AsyncEventHandler<OrderPlaced> for Mailer {
///     async fn handle_async(&self, _event: &OrderPlaced, ctx: CancellationToken) -> Result<(), HandlerError> {
///         tokio::select! {
///             _ = ctx.cancelled() => Err(HandlerError::Canceled),
///             _ = tokio::time::sleep(Duration::from_millis(5)) => Ok(()),
///         }
///     }
///
///     fn name(&self) -> &str { "mailer" }
/// }
/// ```
#[async_trait]
pub trait AsyncEventHandler<E: Event>: Send + Sync + 'static {
    /// Processes the event; may suspend.
    async fn handle_async(&self, event: &E, ctx: CancellationToken) -> Result<(), HandlerError>;

    /// Returns the handler name used in logs and failure reports.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Contract shape a registration was made with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerShape {
    /// [`EventHandler`]: runs inline, no suspension point.
    Blocking,
    /// [`AsyncEventHandler`]: awaited under the invocation policy.
    Suspending,
}

impl HandlerShape {
    /// Short lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerShape::Blocking => "blocking",
            HandlerShape::Suspending => "suspending",
        }
    }
}

impl fmt::Display for HandlerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one registration.
///
/// `seq` is the registry-wide registration ordinal; it defines invocation order
/// under the sequential policy and the order of failures in an aggregate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId {
    seq: u64,
    name: Arc<str>,
}

impl HandlerId {
    pub(crate) fn new(seq: u64, name: impl Into<Arc<str>>) -> Self {
        Self {
            seq,
            name: name.into(),
        }
    }

    /// Registration ordinal.
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Handler name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.seq)
    }
}
