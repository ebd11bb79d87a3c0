//! Type-erased handler adapters stored by the registry.
//!
//! The registry keeps handlers of many event types in one map, so each registration is
//! wrapped in an adapter that accepts `&(dyn Any + Send + Sync)` and downcasts to the
//! concrete event type it was registered for.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::HandlerError;
use crate::events::{Event, EventType};
use crate::handlers::handler::{AsyncEventHandler, EventHandler, HandlerShape};

/// Erased event reference passed through the dispatcher.
pub(crate) type AnyEvent<'a> = &'a (dyn Any + Send + Sync);

/// Blocking handler with the event type erased.
pub(crate) trait ErasedBlocking: Send + Sync {
    fn invoke(&self, event: AnyEvent<'_>) -> Result<(), HandlerError>;
}

/// Suspending handler with the event type erased.
#[async_trait]
pub(crate) trait ErasedSuspending: Send + Sync {
    async fn invoke(
        &self,
        event: &(dyn Any + Send + Sync),
        ctx: CancellationToken,
    ) -> Result<(), HandlerError>;
}

/// Invocation entry point of one registration.
pub(crate) enum Invoker {
    Blocking(Box<dyn ErasedBlocking>),
    Suspending(Box<dyn ErasedSuspending>),
}

impl Invoker {
    pub(crate) fn blocking<E, H>(handler: Arc<H>) -> Self
    where
        E: Event,
        H: EventHandler<E> + ?Sized,
    {
        Invoker::Blocking(Box::new(BlockingAdapter::<E, H> {
            handler,
            _event: PhantomData,
        }))
    }

    pub(crate) fn suspending<E, H>(handler: Arc<H>) -> Self
    where
        E: Event,
        H: AsyncEventHandler<E> + ?Sized,
    {
        Invoker::Suspending(Box::new(SuspendingAdapter::<E, H> {
            handler,
            _event: PhantomData,
        }))
    }

    pub(crate) fn shape(&self) -> HandlerShape {
        match self {
            Invoker::Blocking(_) => HandlerShape::Blocking,
            Invoker::Suspending(_) => HandlerShape::Suspending,
        }
    }
}

/// Address of the handler instance behind `handler`, used to detect exact duplicates.
pub(crate) fn instance_key<H: ?Sized>(handler: &Arc<H>) -> usize {
    Arc::as_ptr(handler) as *const () as usize
}

struct BlockingAdapter<E, H: ?Sized> {
    handler: Arc<H>,
    _event: PhantomData<fn(&E)>,
}

impl<E, H> ErasedBlocking for BlockingAdapter<E, H>
where
    E: Event,
    H: EventHandler<E> + ?Sized,
{
    fn invoke(&self, event: AnyEvent<'_>) -> Result<(), HandlerError> {
        match event.downcast_ref::<E>() {
            Some(event) => self.handler.handle(event),
            None => Err(type_mismatch::<E>()),
        }
    }
}

struct SuspendingAdapter<E, H: ?Sized> {
    handler: Arc<H>,
    _event: PhantomData<fn(&E)>,
}

#[async_trait]
impl<E, H> ErasedSuspending for SuspendingAdapter<E, H>
where
    E: Event,
    H: AsyncEventHandler<E> + ?Sized,
{
    async fn invoke(
        &self,
        event: &(dyn Any + Send + Sync),
        ctx: CancellationToken,
    ) -> Result<(), HandlerError> {
        match event.downcast_ref::<E>() {
            Some(event) => self.handler.handle_async(event, ctx).await,
            None => Err(type_mismatch::<E>()),
        }
    }
}

fn type_mismatch<E: Event>() -> HandlerError {
    HandlerError::fail(format!(
        "event type mismatch: handler expects {}",
        EventType::of::<E>().name()
    ))
}
