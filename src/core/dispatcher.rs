//! # Dispatcher: routes published events to their registered handlers.
//!
//! The [`Dispatcher`] owns a read-only [`HandlerRegistry`] and a [`DispatcherConfig`].
//! Each publish resolves the handlers of the event's exact type, runs them under the
//! configured [`InvocationPolicy`](crate::InvocationPolicy), and aggregates the outcome.
//!
//! ## High-level flow
//! ```text
//! publish(&event, &token)
//!   ├─► registry.resolve(EventType::of::<E>())
//!   │     └─ empty → Ok(())                                   (no subscribers is not an error)
//!   ├─► Sequential:
//!   │     for reg in registration order:
//!   │        run_once(reg, event, token) ─► Err? record failure
//!   │                                        └─ ShortCircuit → trigger, skip the rest
//!   ├─► Concurrent:
//!   │     blocking regs inline (registration order)
//!   │     suspending regs ─► FuturesUnordered (scope = token.child_token())
//!   │        first failure + ShortCircuit → trigger, scope.cancel()
//!   └─► failures sorted by registration order
//!         ├─ none → Ok(())
//!         └─ some → Err(AggregateDispatchFailure { failures, skipped, trigger })
//! ```
//!
//! ## Rules
//! - Handler errors and panics never escape `publish`; they are returned in the aggregate.
//! - Without short-circuit every resolved handler is attempted exactly once per publish.
//! - The caller's token is forwarded to every suspending handler and never cancelled
//!   by the dispatcher; short-circuit cancels a child token only.
//! - There is no built-in timeout; derive a token that is cancelled after a deadline.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use tokio_util::sync::CancellationToken;
//! use eventstack::{Dispatcher, DispatcherConfig, HandlerError};
//!
//! #[derive(Clone)]
//! struct OrderPlaced { id: u64 }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let counter = Arc::new(AtomicUsize::new(0));
//!     let c = Arc::clone(&counter);
//!
//!     let dispatcher = Dispatcher::builder(DispatcherConfig::default())
//!         .configure(|r| {
//!             r.register_fn::<OrderPlaced, _>("count", move |_| {
//!                 c.fetch_add(1, Ordering::SeqCst);
//!                 Ok(())
//!             })?;
//!             r.register_async_fn::<OrderPlaced, _, _>("mail", |e, _ctx| async move {
//!                 if e.id == 0 { return Err(HandlerError::fail("no id")); }
//!                 Ok(())
//!             })?;
//!             Ok(())
//!         })?
//!         .build();
//!
//!     dispatcher.publish(&OrderPlaced { id: 7 }, &CancellationToken::new()).await?;
//!     assert_eq!(counter.load(Ordering::SeqCst), 1);
//!     Ok(())
//! }
//! ```

use std::any::Any;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::core::builder::DispatcherBuilder;
use crate::core::config::DispatcherConfig;
use crate::core::registry::{HandlerRegistry, Registration};
use crate::core::runner::{run_blocking, run_once};
use crate::error::{AggregateDispatchFailure, DispatchResult, FailureKind, HandlerFailure};
use crate::events::{Event, EventType};
use crate::handlers::erased::{AnyEvent, Invoker};
use crate::handlers::HandlerId;

/// Failures collected during one publish.
#[derive(Default)]
struct Outcome {
    failures: Vec<HandlerFailure>,
    skipped: Vec<HandlerId>,
    trigger: Option<HandlerId>,
}

/// Routes events to handlers resolved from a [`HandlerRegistry`].
pub struct Dispatcher {
    cfg: DispatcherConfig,
    registry: Arc<HandlerRegistry>,
}

impl Dispatcher {
    /// Creates a dispatcher over a fully wired registry.
    pub fn new(cfg: DispatcherConfig, registry: impl Into<Arc<HandlerRegistry>>) -> Self {
        Self {
            cfg,
            registry: registry.into(),
        }
    }

    /// Returns a builder for wiring handlers before first use.
    pub fn builder(cfg: DispatcherConfig) -> DispatcherBuilder {
        DispatcherBuilder::new(cfg)
    }

    /// Active configuration.
    #[inline]
    pub fn config(&self) -> &DispatcherConfig {
        &self.cfg
    }

    /// Registry the dispatcher resolves handlers from.
    #[inline]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Publishes `event` to every handler registered for `E`.
    ///
    /// `ctx` is forwarded to every suspending handler.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateDispatchFailure`] if at least one handler failed, was
    /// cancelled or panicked.
    pub async fn publish<E: Event>(&self, event: &E, ctx: &CancellationToken) -> DispatchResult {
        let event_type = EventType::of::<E>();
        let registrations = self.registry.resolve(event_type);
        self.dispatch(event_type, registrations, event, ctx).await
    }

    /// Publishes with a token that is never cancelled.
    ///
    /// # Errors
    ///
    /// Same as [`Self::publish`].
    pub async fn publish_uncancellable<E: Event>(&self, event: &E) -> DispatchResult {
        self.publish(event, &CancellationToken::new()).await
    }

    /// Publishes a type-erased event, resolving handlers by its runtime type.
    ///
    /// Pass the value itself, not a `Box` around it (`&*boxed`), otherwise the
    /// box type is what gets resolved.
    ///
    /// # Errors
    ///
    /// Same as [`Self::publish`].
    pub async fn publish_dyn(
        &self,
        event: &(dyn Any + Send + Sync),
        ctx: &CancellationToken,
    ) -> DispatchResult {
        match self.registry.resolve_type_id(Any::type_id(event)) {
            Some((event_type, registrations)) => {
                self.dispatch(event_type, registrations, event, ctx).await
            }
            None => {
                trace!("no handlers registered for erased event");
                Ok(())
            }
        }
    }

    /// Spawns the publish on the current tokio runtime and returns its handle.
    ///
    /// The handle resolves to the same outcome [`Self::publish`] would return.
    pub fn spawn_publish<E: Event>(
        self: &Arc<Self>,
        event: E,
        ctx: CancellationToken,
    ) -> JoinHandle<DispatchResult> {
        let me = Arc::clone(self);
        tokio::spawn(async move { me.publish(&event, &ctx).await })
    }

    async fn dispatch(
        &self,
        event_type: EventType,
        registrations: &[Registration],
        event: AnyEvent<'_>,
        ctx: &CancellationToken,
    ) -> DispatchResult {
        if registrations.is_empty() {
            trace!(event = %event_type, "no handlers registered");
            return Ok(());
        }

        debug!(
            event = %event_type,
            handlers = registrations.len(),
            policy = self.cfg.invocation.as_str(),
            "publishing event"
        );

        let mut outcome = if self.cfg.is_concurrent() {
            self.run_concurrent(registrations, event, ctx).await
        } else {
            self.run_sequential(registrations, event, ctx).await
        };

        if let Some(trigger) = &outcome.trigger {
            debug!(
                event = %event_type,
                trigger = %trigger,
                skipped = outcome.skipped.len(),
                "publish short-circuited"
            );
        }

        if outcome.failures.is_empty() {
            debug!(event = %event_type, "publish completed");
            return Ok(());
        }

        outcome.failures.sort_by_key(|f| f.handler.seq());
        outcome.skipped.sort();
        debug!(
            event = %event_type,
            failed = outcome.failures.len(),
            "publish completed with failures"
        );
        Err(AggregateDispatchFailure {
            event: event_type,
            failures: outcome.failures,
            skipped: outcome.skipped,
            trigger: outcome.trigger,
        })
    }

    async fn run_sequential(
        &self,
        registrations: &[Registration],
        event: AnyEvent<'_>,
        ctx: &CancellationToken,
    ) -> Outcome {
        let mut outcome = Outcome::default();

        for (idx, reg) in registrations.iter().enumerate() {
            let Err(kind) = run_once(reg, event, ctx).await else {
                continue;
            };
            outcome.failures.push(failure(reg, kind));

            if self.cfg.short_circuits() {
                outcome.trigger = Some(reg.id().clone());
                outcome.skipped = registrations
                    .iter()
                    .skip(idx + 1)
                    .map(|r| r.id().clone())
                    .collect();
                break;
            }
        }
        outcome
    }

    async fn run_concurrent(
        &self,
        registrations: &[Registration],
        event: AnyEvent<'_>,
        ctx: &CancellationToken,
    ) -> Outcome {
        let mut outcome = Outcome::default();
        let mut suspending = Vec::new();

        for reg in registrations {
            match reg.invoker() {
                Invoker::Blocking(handler) => {
                    if outcome.trigger.is_some() {
                        outcome.skipped.push(reg.id().clone());
                        continue;
                    }
                    if let Err(kind) = run_blocking(handler.as_ref(), event) {
                        outcome.failures.push(failure(reg, kind));
                        if self.cfg.short_circuits() {
                            outcome.trigger = Some(reg.id().clone());
                        }
                    }
                }
                Invoker::Suspending(_) => suspending.push(reg),
            }
        }

        if outcome.trigger.is_some() {
            outcome
                .skipped
                .extend(suspending.iter().map(|r| r.id().clone()));
            return outcome;
        }

        let scope = ctx.child_token();
        let mut in_flight: FuturesUnordered<_> = suspending
            .into_iter()
            .map(|reg| {
                let scope = scope.clone();
                async move { (reg, run_once(reg, event, &scope).await) }
            })
            .collect();

        while let Some((reg, res)) = in_flight.next().await {
            let Err(kind) = res else {
                continue;
            };
            if self.cfg.short_circuits() && outcome.trigger.is_none() {
                outcome.trigger = Some(reg.id().clone());
                scope.cancel();
            }
            outcome.failures.push(failure(reg, kind));
        }
        outcome
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("cfg", &self.cfg)
            .field("registry", &self.registry)
            .finish()
    }
}

/// Builds a [`HandlerFailure`] for `reg` and logs it.
fn failure(reg: &Registration, kind: FailureKind) -> HandlerFailure {
    warn!(
        event = %reg.event(),
        handler = %reg.id(),
        shape = %reg.shape(),
        error = %kind,
        "event handler failed"
    );
    HandlerFailure {
        handler: reg.id().clone(),
        event: reg.event(),
        shape: reg.shape(),
        kind,
    }
}
