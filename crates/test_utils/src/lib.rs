//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! household bills test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built users, bill fields and in-memory adapters
//! - `builders`: Builder patterns for bills with payments
//! - `assertions`: Custom assertion helpers for billing types
//! - `generators`: Property-based test data generators
//! - `tracing`: One-time test log subscriber

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;
pub mod tracing;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
pub use self::tracing::init_test_tracing;
