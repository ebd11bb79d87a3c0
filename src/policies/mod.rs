//! Invocation and failure policies.
//!
//! This module groups the knobs that control **how** resolved handlers run and
//! **what happens** when one of them fails.
//!
//! ## Contents
//! - [`InvocationPolicy`] sequential or concurrent scheduling
//! - [`FailurePolicy`]    continue-and-aggregate or short-circuit
//!
//! ## Quick wiring
//! ```text
//! DispatcherConfig { invocation: InvocationPolicy, on_failure: FailurePolicy }
//!      └─► core::dispatcher::Dispatcher uses:
//!           - invocation to pick the sequential or concurrent path
//!           - on_failure to decide continue/halt after each failure
//! ```
//!
//! ## Defaults
//! - `InvocationPolicy::Sequential`
//! - `FailurePolicy::Continue`

mod failure;
mod invocation;

pub use failure::FailurePolicy;
pub use invocation::InvocationPolicy;
