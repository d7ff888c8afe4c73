//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating bill input that either
//! satisfies or deliberately breaks the validation rules.

use proptest::prelude::*;
use rust_decimal::Decimal;

use domain_billing::{BillType, MAX_USAGE_DAYS};

/// Strategy for generating bill types
pub fn bill_type_strategy() -> impl Strategy<Value = BillType> {
    prop_oneof![
        Just(BillType::Water),
        Just(BillType::Power),
        Just(BillType::Internet),
        Just(BillType::Misc),
    ]
}

/// Strategy for generating `dd-mm-yy` dates
pub fn valid_date_strategy() -> impl Strategy<Value = String> {
    (1u32..=28, 1u32..=12, 0u32..=99).prop_map(|(d, m, y)| format!("{:02}-{:02}-{:02}", d, m, y))
}

/// Strategy for generating strings that are never `dd-mm-yy`
pub fn invalid_date_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1}-[0-9]{2}-[0-9]{2}",
        "[0-9]{2}/[0-9]{2}/[0-9]{2}",
        "[0-9]{4}-[0-9]{2}-[0-9]{2}",
        "[a-z]{8}",
    ]
}

/// Strategy for generating positive totals with two decimal places
pub fn positive_total_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for generating zero or negative totals
pub fn non_positive_total_strategy() -> impl Strategy<Value = Decimal> {
    (-10_000_000i64..=0i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for generating usage within the allowed range
pub fn usage_strategy() -> impl Strategy<Value = u32> {
    0u32..=MAX_USAGE_DAYS
}

/// Strategy for generating a non-empty list of usages
pub fn usage_vec_strategy(max_members: usize) -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(usage_strategy(), 1..=max_members)
}
