//! Published events: the marker trait and the type identity used as registry key.
//!
//! ## Contents
//! - [`Event`] marker for publishable values (blanket-implemented)
//! - [`EventType`] exact-type identity (`TypeId` + name for diagnostics)

mod event;

pub use event::{Event, EventType};
