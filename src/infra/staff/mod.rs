//! Staff directory backends.

pub mod memory;

pub use memory::InMemoryStaffDirectory;
