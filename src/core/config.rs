//! # Dispatcher configuration.
//!
//! Provides [`DispatcherConfig`] centralized settings for the dispatcher.
//!
//! Config is used in one place:
//! - **Dispatcher creation**: `Dispatcher::builder(config)` / `Dispatcher::new(config, registry)`
//!
//! There are no sentinel values; every field is an explicit policy enum.

use crate::policies::{FailurePolicy, InvocationPolicy};

/// Configuration for a [`Dispatcher`](crate::Dispatcher).
///
/// Defines:
/// - **Scheduling**: sequential vs. concurrent handler execution
/// - **Failure handling**: continue-and-aggregate vs. short-circuit
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors in hot paths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// How resolved handlers are scheduled.
    pub invocation: InvocationPolicy,

    /// Whether the first failure halts the remaining handlers.
    pub on_failure: FailurePolicy,
}

impl DispatcherConfig {
    /// Sequential invocation, continue on failure.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            invocation: InvocationPolicy::Sequential,
            on_failure: FailurePolicy::Continue,
        }
    }

    /// Concurrent invocation, continue on failure.
    #[must_use]
    pub fn concurrent() -> Self {
        Self {
            invocation: InvocationPolicy::Concurrent,
            on_failure: FailurePolicy::Continue,
        }
    }

    /// Returns a copy with the given failure policy.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }

    /// True if suspending handlers are awaited jointly.
    #[inline]
    pub fn is_concurrent(&self) -> bool {
        self.invocation == InvocationPolicy::Concurrent
    }

    /// True if the first failure halts the publish.
    #[inline]
    pub fn short_circuits(&self) -> bool {
        self.on_failure == FailurePolicy::ShortCircuit
    }
}
