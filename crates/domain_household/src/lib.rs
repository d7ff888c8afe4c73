//! Household Domain
//!
//! This crate owns the members of a household and the `UserDirectory` port
//! through which the billing domain discovers who can be billed.
//!
//! The billing domain only ever holds a weak reference (`UserId`) to a user;
//! the directory is the source of truth for whether that id still resolves
//! and whether the member is currently active.
//!
//! # Examples
//!
//! ```rust
//! use domain_household::User;
//!
//! let mut alice = User::new("Alice");
//! assert!(alice.is_active);
//!
//! alice.deactivate();
//! assert!(!alice.is_active);
//! ```

pub mod user;
pub mod error;
pub mod ports;

pub use user::User;
pub use error::HouseholdError;
pub use ports::UserDirectory;
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::InMemoryUserDirectory;
