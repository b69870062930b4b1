//! Runtime: the scheduler loop, its handle, and the task spawner it runs on.

use std::future::Future;

pub mod api;
pub mod service;
pub mod tokio_spawner;

pub use api::{AssignmentReport, RegistrationReceipt, RegistrationRequest};
pub use service::{TriageHandle, TriageService};
pub use tokio_spawner::TokioSpawner;

/// Abstraction over spawning background tasks.
pub trait Spawn {
    /// Spawn an async task that returns a future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
