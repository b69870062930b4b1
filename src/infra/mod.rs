//! In-memory collaborators: record store, staff directory and event notifier.

pub mod notify;
pub mod records;
pub mod staff;

pub use notify::InMemoryNotifier;
pub use records::InMemoryRecordStore;
pub use staff::InMemoryStaffDirectory;
