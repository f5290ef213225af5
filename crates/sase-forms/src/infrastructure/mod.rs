//! Infrastructure layer
//!
//! Adapters for the outbound ports.

pub mod events;
pub mod persistence;

pub use events::{LoggingEventPublisher, NoOpEventPublisher};
pub use persistence::{InMemoryFormRepository, JsonFileFormRepository};
