//! Test doubles for the collaborator traits
//!
//! Shared by this crate's unit tests and the integration tests of
//! downstream crates.

pub mod mocks;

pub use mocks::{MemoryBibliography, MockHistoryProvider};
