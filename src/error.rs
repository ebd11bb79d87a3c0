//! Error types used by the registry, the dispatcher and handler bodies.
//!
//! - [`RegistryError`] raised while wiring handlers (exact duplicate registration).
//! - [`HandlerError`] returned by handler bodies.
//! - [`HandlerFailure`] one handler's captured failure, with its [`FailureKind`].
//! - [`AggregateDispatchFailure`] the failure outcome of a single publish call.
//!
//! Handler errors never escape a publish as a fault: they are captured as
//! [`HandlerFailure`]s and returned together inside [`AggregateDispatchFailure`].

use std::fmt;

use thiserror::Error;

use crate::events::EventType;
use crate::handlers::{HandlerId, HandlerShape};

/// Outcome of one publish call.
pub type DispatchResult = Result<(), AggregateDispatchFailure>;

/// # Errors produced by the handler registry.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The same handler instance is already registered for this event type and shape.
    #[error("handler '{handler}' already registered for {event} as {shape}")]
    DuplicateRegistration {
        /// Event type of the rejected registration.
        event: EventType,
        /// Name of the handler that was registered twice.
        handler: String,
        /// Contract shape of the rejected registration.
        shape: HandlerShape,
    },
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::DuplicateRegistration { .. } => "registry_duplicate_registration",
        }
    }
}

/// # Errors returned by handler bodies.
///
/// Return [`HandlerError::Canceled`] after observing the cancellation token so the
/// dispatcher records a cancellation instead of an ordinary failure.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Handler failed while processing the event.
    #[error("handler failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Handler observed the cancellation signal and unwound early.
    #[error("handler cancelled")]
    Canceled,
}

impl HandlerError {
    /// Builds a [`HandlerError::Fail`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use eventstack::HandlerError;
    ///
    /// let err = HandlerError::fail("boom");
    /// assert_eq!(err.as_message(), "boom");
    /// ```
    pub fn fail(error: impl fmt::Display) -> Self {
        HandlerError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Fail { .. } => "handler_failed",
            HandlerError::Canceled => "handler_canceled",
        }
    }

    /// Returns the bare error message.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Fail { error } => error.clone(),
            HandlerError::Canceled => "cancelled".to_string(),
        }
    }
}

/// How a single handler invocation failed.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Handler returned an error.
    #[error("failed: {error}")]
    Failed {
        /// Message of the error raised by the handler.
        error: String,
    },

    /// Handler honored the cancellation signal.
    #[error("cancelled")]
    Cancelled,

    /// Handler panicked; the panic was caught at the dispatcher boundary.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload, when it was a string.
        info: String,
    },
}

impl FailureKind {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            FailureKind::Failed { .. } => "handler_failed",
            FailureKind::Cancelled => "handler_cancelled",
            FailureKind::Panicked { .. } => "handler_panicked",
        }
    }
}

impl From<HandlerError> for FailureKind {
    fn from(err: HandlerError) -> Self {
        match err {
            HandlerError::Fail { error } => FailureKind::Failed { error },
            HandlerError::Canceled => FailureKind::Cancelled,
        }
    }
}

/// One handler's failure during a publish call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("handler '{handler}' ({shape}) for {event} {kind}")]
pub struct HandlerFailure {
    /// Identity of the failing handler.
    pub handler: HandlerId,
    /// Event type being dispatched.
    pub event: EventType,
    /// Contract shape the handler was invoked through.
    pub shape: HandlerShape,
    /// What went wrong.
    pub kind: FailureKind,
}

impl HandlerFailure {
    /// True if the handler observed cancellation and unwound.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, FailureKind::Cancelled)
    }

    /// Error message for [`FailureKind::Failed`], panic info for [`FailureKind::Panicked`].
    pub fn message(&self) -> Option<&str> {
        match &self.kind {
            FailureKind::Failed { error } => Some(error),
            FailureKind::Panicked { info } => Some(info),
            FailureKind::Cancelled => None,
        }
    }
}

/// Failure outcome of one publish call.
///
/// `failures` is ordered by handler registration order, never by completion order.
#[derive(Error, Debug, Clone)]
pub struct AggregateDispatchFailure {
    /// Event type that was published.
    pub event: EventType,
    /// Every captured handler failure, in registration order.
    pub failures: Vec<HandlerFailure>,
    /// Handlers not invoked because the failure policy short-circuited.
    pub skipped: Vec<HandlerId>,
    /// Handler whose failure halted the publish (short-circuit only).
    pub trigger: Option<HandlerId>,
}

impl AggregateDispatchFailure {
    /// Number of failed handlers.
    #[inline]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// True if no handler failure was recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failure recorded for `handler`, if any.
    pub fn failure_of(&self, handler: &HandlerId) -> Option<&HandlerFailure> {
        self.failures.iter().find(|f| &f.handler == handler)
    }

    /// Failures that are cancellations.
    pub fn cancelled(&self) -> impl Iterator<Item = &HandlerFailure> {
        self.failures.iter().filter(|f| f.is_cancelled())
    }

    /// Failure that triggered the short-circuit, if any.
    pub fn trigger_failure(&self) -> Option<&HandlerFailure> {
        self.trigger.as_ref().and_then(|id| self.failure_of(id))
    }
}

impl fmt::Display for AggregateDispatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} handler(s) failed for {}",
            self.failures.len(),
            self.event
        )?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.handler, failure.kind)?;
        }
        if !self.skipped.is_empty() {
            write!(f, "; {} skipped", self.skipped.len())?;
        }
        Ok(())
    }
}
