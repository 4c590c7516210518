//! Test utilities
//!
//! Manual mock implementations and test fixtures for unit testing.
//! Repositories are exercised through the in-memory adapters directly;
//! only the outbound ports (gateway, notifier) need mocks.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
