//! # Failure policies.
//!
//! [`FailurePolicy`] determines whether one handler's failure stops the rest.
//!
//! - [`FailurePolicy::Continue`] every resolved handler is attempted exactly once (default).
//! - [`FailurePolicy::ShortCircuit`] the first failure halts the publish.
//!
//! ```text
//! Continue      H1 ok ─► H2 err ─► H3 ok             failures = [H2]
//! ShortCircuit  H1 ok ─► H2 err ─╳ H3 skipped        failures = [H2], skipped = [H3], trigger = H2
//! ```
//!
//! Under the concurrent policy a short-circuit cannot stop handlers that are already
//! in flight; it cancels the token they share instead, and the ones that honor it
//! are recorded as cancelled.

/// Policy controlling what happens after a handler fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Keep going and aggregate every failure (pub/sub isolation).
    #[default]
    Continue,
    /// Stop at the first failure.
    ShortCircuit,
}
