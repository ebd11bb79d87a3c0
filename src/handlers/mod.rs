//! # Handler contracts and closure-backed handlers.
//!
//! This module provides the handler-related types:
//! - [`EventHandler`] - blocking contract
//! - [`AsyncEventHandler`] - suspending, cancellable contract
//! - [`HandlerFn`] / [`AsyncHandlerFn`] - closure-backed implementations
//! - [`HandlerShape`] / [`HandlerId`] - registration metadata
//!
//! The `erased` submodule holds the type-erased adapters the registry stores.

pub(crate) mod erased;
mod handler;
mod handler_fn;

pub use handler::{AsyncEventHandler, EventHandler, HandlerId, HandlerShape};
pub use handler_fn::{AsyncHandlerFn, HandlerFn};
