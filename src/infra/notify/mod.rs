//! Event notifier backends.

pub mod memory;

pub use memory::{InMemoryNotifier, PublishedEvent};
