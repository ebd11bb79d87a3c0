use std::sync::Arc;

use crate::core::{config::DispatcherConfig, dispatcher::Dispatcher, registry::HandlerRegistry};
use crate::error::RegistryError;

/// Builder for constructing a [`Dispatcher`] with its handlers wired.
///
/// Registration happens here, before the registry is frozen behind an `Arc`.
pub struct DispatcherBuilder {
    cfg: DispatcherConfig,
    registry: HandlerRegistry,
}

impl DispatcherBuilder {
    /// Creates a new builder with the given configuration and an empty registry.
    pub fn new(cfg: DispatcherConfig) -> Self {
        Self {
            cfg,
            registry: HandlerRegistry::new(),
        }
    }

    /// Replaces the registry with one wired elsewhere.
    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Runs `wire` against the registry.
    ///
    /// # Errors
    ///
    /// Propagates the first [`RegistryError`] returned by `wire`.
    pub fn configure<F>(mut self, wire: F) -> Result<Self, RegistryError>
    where
        F: FnOnce(&mut HandlerRegistry) -> Result<(), RegistryError>,
    {
        wire(&mut self.registry)?;
        Ok(self)
    }

    /// Builds and returns the dispatcher.
    ///
    /// The registry becomes read-only from here on.
    pub fn build(self) -> Arc<Dispatcher> {
        Arc::new(Dispatcher::new(self.cfg, self.registry))
    }
}
