//! Adapters layer (Hexagonal Architecture)

mod event_sink;
mod identity;
mod memory_store;

pub use event_sink::{InMemoryEventSink, LoggingEventSink};
pub use identity::InMemoryIdentityResolver;
pub use memory_store::InMemoryEntityStore;
