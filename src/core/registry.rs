//! # Handler registry - exact-type lookup of event handlers.
//!
//! The registry maps an [`EventType`] to the ordered list of handlers registered for it.
//!
//! ## Architecture
//! ```text
//! startup code ──► register::<E, H>(Arc<H>)        ─┐
//!              ──► register_async::<E, H>(Arc<H>)  ─┼─► slots[TypeId(E)].push(Registration)
//!              ──► register_fn / register_async_fn ─┘
//!
//! Dispatcher ──► resolve(EventType) ──► &[Registration]   (registration order)
//! ```
//!
//! ## Rules
//! - Lookup is by **exact** type; there is no supertype or trait-object matching.
//! - Unknown event types resolve to an empty slice, never an error.
//! - Insertion order is preserved and defines sequential invocation order.
//! - The same handler instance may be registered once per `(event type, shape)` pair;
//!   a second identical registration fails with [`RegistryError::DuplicateRegistration`].
//! - Registration needs `&mut self`; once shared with a dispatcher the registry is read-only,
//!   so the dispatch path takes no locks.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{HandlerError, RegistryError};
use crate::events::{Event, EventType};
use crate::handlers::erased::{instance_key, Invoker};
use crate::handlers::{
    AsyncEventHandler, AsyncHandlerFn, EventHandler, HandlerFn, HandlerId, HandlerShape,
};

/// One handler registered for one event type in one shape.
pub struct Registration {
    id: HandlerId,
    event: EventType,
    instance: usize,
    invoker: Invoker,
}

impl Registration {
    /// Identity of the registered handler.
    #[inline]
    pub fn id(&self) -> &HandlerId {
        &self.id
    }

    /// Event type the handler was registered for.
    #[inline]
    pub fn event(&self) -> EventType {
        self.event
    }

    /// Contract shape of the registration.
    #[inline]
    pub fn shape(&self) -> HandlerShape {
        self.invoker.shape()
    }

    pub(crate) fn invoker(&self) -> &Invoker {
        &self.invoker
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("event", &self.event)
            .field("shape", &self.shape())
            .finish()
    }
}

/// Registrations of a single event type.
struct Slot {
    event: EventType,
    registrations: Vec<Registration>,
}

/// Type-keyed registry of event handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    slots: HashMap<TypeId, Slot>,
    next_seq: u64,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a blocking handler for events of type `E`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateRegistration`] if this exact handler instance is
    /// already registered as a blocking handler for `E`.
    pub fn register<E, H>(&mut self, handler: Arc<H>) -> Result<HandlerId, RegistryError>
    where
        E: Event,
        H: EventHandler<E> + ?Sized,
    {
        let name = <H as EventHandler<E>>::name(&*handler).to_string();
        let instance = instance_key(&handler);
        self.insert(
            EventType::of::<E>(),
            name,
            instance,
            Invoker::blocking::<E, H>(handler),
        )
    }

    /// Registers a suspending handler for events of type `E`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateRegistration`] if this exact handler instance is
    /// already registered as a suspending handler for `E`.
    pub fn register_async<E, H>(&mut self, handler: Arc<H>) -> Result<HandlerId, RegistryError>
    where
        E: Event,
        H: AsyncEventHandler<E> + ?Sized,
    {
        let name = <H as AsyncEventHandler<E>>::name(&*handler).to_string();
        let instance = instance_key(&handler);
        self.insert(
            EventType::of::<E>(),
            name,
            instance,
            Invoker::suspending::<E, H>(handler),
        )
    }

    /// Registers a closure as a blocking handler for `E`.
    ///
    /// Every call creates a new handler instance, so this never reports a duplicate.
    ///
    /// # Errors
    ///
    /// Kept fallible for symmetry with [`Self::register`].
    pub fn register_fn<E, F>(
        &mut self,
        name: impl Into<std::borrow::Cow<'static, str>>,
        f: F,
    ) -> Result<HandlerId, RegistryError>
    where
        E: Event,
        F: Fn(&E) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.register::<E, _>(HandlerFn::<E, F>::arc(name, f))
    }

    /// Registers a closure as a suspending handler for `E`.
    ///
    /// The closure receives an owned clone of the event and the publish token.
    ///
    /// # Errors
    ///
    /// Kept fallible for symmetry with [`Self::register_async`].
    pub fn register_async_fn<E, F, Fut>(
        &mut self,
        name: impl Into<std::borrow::Cow<'static, str>>,
        f: F,
    ) -> Result<HandlerId, RegistryError>
    where
        E: Event + Clone,
        F: Fn(E, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.register_async::<E, _>(AsyncHandlerFn::<E, F>::arc(name, f))
    }

    /// Returns the registrations for `event` in registration order.
    ///
    /// Unknown event types yield an empty slice.
    pub fn resolve(&self, event: EventType) -> &[Registration] {
        self.slots
            .get(&event.id())
            .map(|slot| slot.registrations.as_slice())
            .unwrap_or(&[])
    }

    /// Typed shorthand for [`Self::resolve`].
    pub fn resolve_for<E: Event>(&self) -> &[Registration] {
        self.resolve(EventType::of::<E>())
    }

    /// Looks up a slot by raw [`TypeId`] (runtime-typed publish).
    pub(crate) fn resolve_type_id(&self, id: TypeId) -> Option<(EventType, &[Registration])> {
        self.slots
            .get(&id)
            .map(|slot| (slot.event, slot.registrations.as_slice()))
    }

    /// Number of handlers registered for `E`.
    pub fn handler_count<E: Event>(&self) -> usize {
        self.resolve_for::<E>().len()
    }

    /// Total number of registrations.
    pub fn len(&self) -> usize {
        self.slots.values().map(|s| s.registrations.len()).sum()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Event types with at least one handler, sorted by type name.
    pub fn event_types(&self) -> Vec<EventType> {
        let mut types: Vec<EventType> = self.slots.values().map(|s| s.event).collect();
        types.sort_unstable_by_key(|t| t.name());
        types
    }

    fn insert(
        &mut self,
        event: EventType,
        name: String,
        instance: usize,
        invoker: Invoker,
    ) -> Result<HandlerId, RegistryError> {
        let shape = invoker.shape();
        let slot = self.slots.entry(event.id()).or_insert_with(|| Slot {
            event,
            registrations: Vec::new(),
        });

        let duplicate = slot
            .registrations
            .iter()
            .any(|r| r.instance == instance && r.shape() == shape);
        if duplicate {
            return Err(RegistryError::DuplicateRegistration {
                event,
                handler: name,
                shape,
            });
        }

        let id = HandlerId::new(self.next_seq, name);
        self.next_seq += 1;

        debug!(event = %event, handler = %id, shape = %shape, "handler registered");
        slot.registrations.push(Registration {
            id: id.clone(),
            event,
            instance,
            invoker,
        });
        Ok(id)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("event_types", &self.slots.len())
            .field("registrations", &self.len())
            .finish()
    }
}
