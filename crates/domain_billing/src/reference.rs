//! Reference names
//!
//! A bill's reference name is what members quote when they pay it, so it is
//! derived from the bill itself and never set directly.

use crate::bill::BillType;

/// Builds the `{type}-{date}` reference for a bill
///
/// Callers are expected to have validated both parts already.
pub fn generate_reference(bill_type: BillType, date: &str) -> String {
    format!("{}-{}", bill_type, date)
}
