//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for billing types that give
//! more meaningful error messages than standard assertions.

use rust_decimal::Decimal;

use core_kernel::UserId;
use domain_billing::{Bill, PaymentStatus};

/// Asserts that a bill's payable amounts add up to its total exactly
pub fn assert_payments_sum_to_total(bill: &Bill) {
    let sum = bill.payments().total_payable();
    assert_eq!(
        sum,
        bill.total_amount(),
        "Sum of payable amounts ({}) doesn't equal bill total ({})",
        sum,
        bill.total_amount()
    );
}

/// Asserts that no two payments on a bill belong to the same user
pub fn assert_unique_payers(bill: &Bill) {
    let mut seen = std::collections::HashSet::new();
    for payment in bill.payments() {
        assert!(
            seen.insert(payment.user_id()),
            "User {} has more than one payment on bill {}",
            payment.user_id(),
            bill.reference_name()
        );
    }
}

/// Asserts the payers of a bill, in order
pub fn assert_payers(bill: &Bill, expected: &[UserId]) {
    let actual: Vec<UserId> = bill.payments().iter().map(|p| p.user_id()).collect();
    assert_eq!(
        actual, expected,
        "Payers on bill {} differ from expected",
        bill.reference_name()
    );
}

/// Asserts one member's payment state
pub fn assert_payment(
    bill: &Bill,
    user_id: UserId,
    usage_in_days: u32,
    payable_amount: Decimal,
    status: PaymentStatus,
) {
    let payment = bill
        .payments()
        .get(user_id)
        .unwrap_or_else(|| panic!("No payment for user {} on bill {}", user_id, bill.reference_name()));

    assert_eq!(payment.usage_in_days(), usage_in_days, "usage for {}", user_id);
    assert_eq!(payment.payable_amount(), payable_amount, "payable amount for {}", user_id);
    assert_eq!(payment.status(), status, "status for {}", user_id);
}

/// Asserts that a result is Ok and returns the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Asserts that an error matches a specific variant
#[macro_export]
macro_rules! assert_err_variant {
    ($result:expr, $pattern:pat) => {
        match $result {
            Ok(value) => panic!("Expected Err matching {}, got Ok({:?})", stringify!($pattern), value),
            Err(ref e) => {
                assert!(
                    matches!(e, $pattern),
                    "Error {:?} does not match pattern {}",
                    e,
                    stringify!($pattern)
                );
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::TestBillBuilder;
    use rust_decimal_macros::dec;

    #[test]
    fn test_assert_payments_sum_to_total() {
        let bill = TestBillBuilder::new()
            .with_payment_state(UserId::new(), 1, dec!(33.34), PaymentStatus::Unpaid)
            .with_payment_state(UserId::new(), 1, dec!(33.33), PaymentStatus::Unpaid)
            .with_payment_state(UserId::new(), 1, dec!(33.33), PaymentStatus::Unpaid)
            .build();
        assert_payments_sum_to_total(&bill);
    }

    #[test]
    #[should_panic(expected = "doesn't equal bill total")]
    fn test_assert_payments_sum_to_total_fails() {
        let bill = TestBillBuilder::new()
            .with_payment_state(UserId::new(), 1, dec!(10), PaymentStatus::Unpaid)
            .build();
        assert_payments_sum_to_total(&bill);
    }
}
