//! # Triage Scheduler
//!
//! Severity-aware patient queueing and staff assignment for an emergency intake desk.
//!
//! Patients arrive with a set of vitals. The crate classifies them into a severity tier,
//! keeps them in a priority queue whose scores grow with waiting time, estimates how
//! long each one still has to wait, and matches the most urgent patients to available
//! doctors (and, for critical cases, nurses).
//!
//! ## Core Problem Solved
//!
//! - **Triage under uncertainty**: a remote classifier may be slow or unreachable; a
//!   deterministic rule table always answers within a bounded time.
//! - **Starvation**: a quadratic overflow term lets long-waiting low-severity patients
//!   eventually outrank fresh critical arrivals.
//! - **Double booking**: the queue is owned by a single scheduler task, so no two
//!   assignment passes can match the same patient.
//!
//! ## Key Components
//!
//! - [`core::SeverityClassifier`]: remote-then-local classification chain
//! - [`core::PriorityFunction`]: wait-aware scoring
//! - [`core::TriageQueue`]: ordered waiting entries with stats and estimates
//! - [`core::WaitTimeEstimator`]: remaining-wait heuristic
//! - [`core::AssignmentScheduler`]: threshold-gated batch matching
//! - [`runtime::TriageHandle`]: async handle to the running scheduler loop
//!
//! ```rust,ignore
//! use triage_scheduler::builders::ServiceBuilder;
//! use triage_scheduler::config::TriageConfig;
//! use triage_scheduler::runtime::TokioSpawner;
//!
//! let handle = ServiceBuilder::new(TriageConfig::from_env()?)
//!     .with_staff(staff_directory)
//!     .start(&TokioSpawner::current())?;
//! let receipt = handle.register(request).await?;
//! let report = handle.try_assign().await?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Classification, scoring, queueing and matching.
pub mod core;
/// Configuration models for scoring, estimation, classification and the scheduler loop.
pub mod config;
/// Builders to construct a triage service from configuration.
pub mod builders;
/// In-memory collaborator adapters.
pub mod infra;
/// Scheduler loop, service handle and API models.
pub mod runtime;
/// Shared utilities.
pub mod util;
