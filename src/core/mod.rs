//! Dispatch core: registry, invocation and aggregation.
//!
//! The public API from this module is [`Dispatcher`], [`DispatcherBuilder`],
//! [`DispatcherConfig`] and [`HandlerRegistry`].
//!
//! Internal modules:
//! - [`config`]: scheduling and failure policies bundled for the dispatcher;
//! - [`registry`]: exact-type handler lookup, populated before first publish;
//! - [`runner`]: invokes one handler with panic isolation and outcome classification;
//! - [`dispatcher`]: resolves, schedules and aggregates one publish;
//! - [`builder`]: wires handlers and freezes the registry.

mod builder;
mod config;
mod dispatcher;
mod registry;
mod runner;

pub use builder::DispatcherBuilder;
pub use config::DispatcherConfig;
pub use dispatcher::Dispatcher;
pub use registry::{HandlerRegistry, Registration};
