//! # Invocation policies for resolved handlers.
//!
//! [`InvocationPolicy`] determines how the handlers resolved for one event are run.
//!
//! - [`InvocationPolicy::Sequential`] one after another in registration order (default).
//! - [`InvocationPolicy::Concurrent`] suspending handlers awaited jointly.
//!
//! ## Choosing the right policy
//!
//! **Ordered side effects** (audit log, projections that depend on each other):
//! ```text
//! InvocationPolicy::Sequential  → H1 ─► H2 ─► H3        wall time = sum
//! ```
//!
//! **Independent I/O-bound consumers** (mail, webhooks, cache invalidation):
//! ```text
//! InvocationPolicy::Concurrent  → blocking inline, then ┌ H2 ┐
//!                                                        ├ H3 ┤  wall time ≈ slowest
//!                                                        └ H4 ┘
//! ```
//!
//! Either way failures are reported in registration order.

/// Policy controlling how resolved handlers are scheduled within one publish.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InvocationPolicy {
    /// Strict registration order; each suspending handler is fully awaited before the next starts.
    #[default]
    Sequential,
    /// Blocking handlers run inline (registration order), then all suspending handlers
    /// are started together and awaited jointly. Completion order is unspecified.
    Concurrent,
}

impl InvocationPolicy {
    /// Short lowercase label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationPolicy::Sequential => "sequential",
            InvocationPolicy::Concurrent => "concurrent",
        }
    }
}
