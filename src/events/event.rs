//! # Event marker trait and event type identity.
//!
//! An [`Event`] is an immutable fact. Any `Send + Sync + 'static` value qualifies;
//! the dispatcher never mutates it and only hands out shared references.
//!
//! [`EventType`] is the registry key. It wraps the [`TypeId`] of the concrete event
//! type, so two structurally identical events of different types never share handlers.
//!
//! ## Example
//! ```rust
//! use eventstack::EventType;
//!
//! struct OrderPlaced { id: u64 }
//! struct OrderShipped { id: u64 }
//!
//! assert_ne!(EventType::of::<OrderPlaced>(), EventType::of::<OrderShipped>());
//! assert!(EventType::of::<OrderPlaced>().name().ends_with("OrderPlaced"));
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Marker for values that can be published through the dispatcher.
///
/// Blanket-implemented for every `Send + Sync + 'static` type.
pub trait Event: Any + Send + Sync {}

impl<T: Any + Send + Sync> Event for T {}

/// Identity of a concrete event type.
///
/// Equality and hashing use the [`TypeId`] only; the name is kept for logs and errors.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    /// Returns the identity of `E`.
    #[must_use]
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }

    /// Underlying [`TypeId`].
    #[inline]
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name (for diagnostics only, not a stable key).
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of [`Self::name`], e.g. `OrderPlaced`.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        match base.rfind("::") {
            Some(pos) => &self.name[pos + 2..],
            None => self.name,
        }
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventType").field(&self.name).finish()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Placed;
    #[allow(dead_code)]
    struct Shipped(u64);
    #[allow(dead_code)]
    struct Wrapper<T>(T);

    #[test]
    fn distinct_types_have_distinct_identity() {
        assert_eq!(EventType::of::<Placed>(), EventType::of::<Placed>());
        assert_ne!(EventType::of::<Placed>(), EventType::of::<Shipped>());
    }

    #[test]
    fn usable_as_map_key() {
        let mut map = HashMap::new();
        map.insert(EventType::of::<Placed>(), 1);
        map.insert(EventType::of::<Shipped>(), 2);
        assert_eq!(map.get(&EventType::of::<Placed>()), Some(&1));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn short_name_strips_module_path() {
        assert_eq!(EventType::of::<Placed>().short_name(), "Placed");
        assert_eq!(EventType::of::<Placed>().to_string(), "Placed");
        assert_eq!(EventType::of::<u32>().short_name(), "u32");
    }

    #[test]
    fn generic_parameters_do_not_collapse() {
        assert_ne!(
            EventType::of::<Wrapper<u8>>(),
            EventType::of::<Wrapper<u16>>()
        );
    }
}
