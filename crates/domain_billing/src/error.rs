//! Billing domain errors

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::PortError;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Date is not in `dd-mm-yy` form
    #[error("Invalid date format: '{0}', expected dd-mm-yy")]
    InvalidFormat(String),

    /// Total amount is zero or negative
    #[error("Amount must be a positive number, got {0}")]
    NonPositiveAmount(Decimal),

    /// Bill type outside water/power/internet/misc
    #[error("Unknown bill type: '{0}'")]
    UnknownBillType(String),

    /// A required bill field was not supplied
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Usage outside the 0-31 day billing period
    #[error("Usage in days must be between 0 and {max}, got {value}")]
    UsageOutOfRange {
        value: u32,
        max: u32,
    },

    /// Bill creation found nobody to bill
    #[error("No active users exist to create the bill")]
    NoActiveUsers,

    /// A payment edit referenced a user the directory could not resolve
    #[error("Could not fetch user with id: {user_id} with error: {cause}")]
    UserLookup {
        user_id: String,
        cause: String,
    },

    /// Two payments for the same user in one bill
    #[error("Duplicate payment for user: {0}")]
    DuplicatePayment(String),

    /// Bill not found
    #[error("Bill not found: {0}")]
    BillNotFound(String),

    /// Operation needs a bill that has been saved at least once
    #[error("Bill has not been persisted yet")]
    NotPersisted,

    /// The store failed
    #[error("Storage error: {0}")]
    Storage(#[from] PortError),
}

impl BillingError {
    /// Creates a UserLookup error from the failing id and the directory's error
    pub fn user_lookup(user_id: impl std::fmt::Display, cause: impl std::fmt::Display) -> Self {
        BillingError::UserLookup {
            user_id: user_id.to_string(),
            cause: cause.to_string(),
        }
    }

    /// Returns true for errors the caller can fix by correcting its input
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BillingError::InvalidFormat(_)
                | BillingError::NonPositiveAmount(_)
                | BillingError::UnknownBillType(_)
                | BillingError::MissingField(_)
                | BillingError::UsageOutOfRange { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_user_lookup_message_template() {
        let err = BillingError::user_lookup("5eb74cca2ae20907b147cb21", "user does not exist");
        assert_eq!(
            err.to_string(),
            "Could not fetch user with id: 5eb74cca2ae20907b147cb21 with error: user does not exist"
        );
        assert!(!err.is_validation());
    }

    #[test]
    fn test_validation_classification() {
        assert!(BillingError::NonPositiveAmount(dec!(-1)).is_validation());
        assert!(BillingError::MissingField("date").is_validation());
        assert!(!BillingError::NoActiveUsers.is_validation());
        assert!(!BillingError::NotPersisted.is_validation());
    }
}
