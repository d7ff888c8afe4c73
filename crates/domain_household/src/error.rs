//! Household domain errors

use thiserror::Error;

/// Errors that can occur in the household domain
#[derive(Debug, Error)]
pub enum HouseholdError {
    /// User with the given ID was not found
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Invalid user data provided
    #[error("Invalid user data: {0}")]
    InvalidData(String),
}

impl HouseholdError {
    /// Creates a UserNotFound error from any ID type
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        HouseholdError::UserNotFound(id.to_string())
    }

    /// Creates an InvalidData error with a message
    pub fn invalid(message: impl Into<String>) -> Self {
        HouseholdError::InvalidData(message.into())
    }
}
