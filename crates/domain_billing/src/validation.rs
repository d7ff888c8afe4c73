//! Bill validation rules
//!
//! Pure checks run on every bill construction and whenever `date`,
//! `bill_type` or `total_amount` is mutated. Payment-only mutations do not
//! re-run them.
//!
//! # Rules
//!
//! - Date must be `dd-mm-yy`: two ASCII digits, hyphen, two digits, hyphen,
//!   two digits. No calendar check is made, so `99-99-99` passes.
//! - Total amount must be strictly positive.
//! - Bill type must be one of `water`, `power`, `internet`, `misc`.
//! - Usage is measured in days of a 31 day billing period.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::bill::BillType;
use crate::error::BillingError;

/// Longest billing period, and the usage a member gets by default
pub const MAX_USAGE_DAYS: u32 = 31;

// `[0-9]` rather than `\d`, which would also accept non-ASCII digits
static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{2}-[0-9]{2}-[0-9]{2}$").expect("valid date pattern"));

/// Checks that `date` has the `dd-mm-yy` shape
pub fn validate_date(date: &str) -> Result<(), BillingError> {
    if DATE_PATTERN.is_match(date) {
        Ok(())
    } else {
        Err(BillingError::InvalidFormat(date.to_string()))
    }
}

/// Checks that `amount` is strictly positive
pub fn validate_amount(amount: Decimal) -> Result<(), BillingError> {
    if amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(BillingError::NonPositiveAmount(amount))
    }
}

/// Parses a bill type, rejecting anything outside the known set
pub fn validate_type(bill_type: &str) -> Result<BillType, BillingError> {
    bill_type.parse()
}

/// Checks that a usage figure fits in the billing period
pub fn validate_usage(days: u32) -> Result<(), BillingError> {
    if days <= MAX_USAGE_DAYS {
        Ok(())
    } else {
        Err(BillingError::UsageOutOfRange {
            value: days,
            max: MAX_USAGE_DAYS,
        })
    }
}
