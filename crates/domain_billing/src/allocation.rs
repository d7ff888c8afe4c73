//! Usage-based allocation of a bill's total
//!
//! Each payment's share is `total * usage / Σusage`. When nobody has any
//! usage the total is split equally instead.
//!
//! Shares are truncated toward zero at the allocator's scale and whatever is
//! left over goes to the first payment, so the shares always add up to the
//! total exactly and none of them can go negative.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::payment::BillPayment;

/// Decimal places used for payable amounts unless configured otherwise
pub const DEFAULT_AMOUNT_SCALE: u32 = 2;

/// Splits a total across payments in proportion to usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentAllocator {
    scale: u32,
}

impl PaymentAllocator {
    /// Creates an allocator rounding to whole cents
    pub fn new() -> Self {
        Self::with_scale(DEFAULT_AMOUNT_SCALE)
    }

    /// Creates an allocator rounding to `scale` decimal places
    pub fn with_scale(scale: u32) -> Self {
        Self { scale }
    }

    /// Decimal places shares are rounded to
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Sets every payment's payable amount from `total`
    ///
    /// Usage and status are never touched. An empty slice is left alone.
    pub fn allocate(&self, total: Decimal, payments: &mut [BillPayment]) {
        if payments.is_empty() {
            return;
        }

        let total_usage: u64 = payments.iter().map(|p| u64::from(p.usage_in_days())).sum();
        let count = Decimal::from(payments.len() as u64);

        let mut allocated = Decimal::ZERO;
        for payment in payments.iter_mut() {
            let share = if total_usage == 0 {
                total / count
            } else {
                usage_share(total, payment.usage_in_days(), total_usage)
            };
            let share = share.round_dp_with_strategy(self.scale, RoundingStrategy::ToZero);
            allocated = allocated.saturating_add(share);
            payment.set_payable_amount(share);
        }

        let remainder = total - allocated;
        if !remainder.is_zero() {
            let first = &mut payments[0];
            let adjusted = first.payable_amount().saturating_add(remainder);
            first.set_payable_amount(adjusted);
        }
    }
}

// Multiplies first for precision. Near Decimal::MAX the product overflows, so
// the share falls back to a whole-unit quotient that never exceeds
// `total / total_usage`, keeping the sum of shares within the total.
fn usage_share(total: Decimal, usage: u32, total_usage: u64) -> Decimal {
    let usage = Decimal::from(usage);
    let total_usage = Decimal::from(total_usage);
    match total.checked_mul(usage) {
        Some(weighted) => weighted / total_usage,
        None => {
            let mut quotient = (total / total_usage).trunc();
            if quotient.checked_mul(total_usage).map_or(true, |back| back > total) {
                quotient -= Decimal::ONE;
            }
            quotient.saturating_mul(usage)
        }
    }
}

impl Default for PaymentAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Allocates `total` across `payments` at the default scale
pub fn allocate(total: Decimal, payments: &mut [BillPayment]) {
    PaymentAllocator::new().allocate(total, payments);
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::UserId;
    use rust_decimal_macros::dec;

    use crate::payment::PaymentStatus;

    fn payments(usages: &[u32]) -> Vec<BillPayment> {
        usages.iter().map(|&u| BillPayment::new(UserId::new(), u)).collect()
    }

    fn amounts(payments: &[BillPayment]) -> Vec<Decimal> {
        payments.iter().map(|p| p.payable_amount()).collect()
    }

    #[test]
    fn test_equal_usage_splits_evenly() {
        let mut records = payments(&[1, 1]);
        allocate(dec!(100), &mut records);

        assert_eq!(amounts(&records), vec![dec!(50), dec!(50)]);
        assert_eq!(records.iter().map(|p| p.payable_amount()).sum::<Decimal>(), dec!(100));
    }

    #[test]
    fn test_proportional_to_usage() {
        let mut records = payments(&[31, 10, 0]);
        allocate(dec!(82), &mut records);

        assert_eq!(amounts(&records), vec![dec!(62), dec!(20), dec!(0)]);
    }

    #[test]
    fn test_remainder_goes_to_first_record() {
        let mut records = payments(&[1, 1, 1]);
        allocate(dec!(100), &mut records);

        assert_eq!(amounts(&records), vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
    }

    #[test]
    fn test_zero_usage_falls_back_to_equal_split() {
        let mut records = payments(&[0, 0, 0, 0]);
        allocate(dec!(90), &mut records);

        assert_eq!(
            amounts(&records),
            vec![dec!(22.50), dec!(22.50), dec!(22.50), dec!(22.50)]
        );
    }

    #[test]
    fn test_largest_total_does_not_overflow() {
        let mut records = payments(&[31, 31]);
        allocate(Decimal::MAX, &mut records);

        assert!(records.iter().all(|p| p.payable_amount() > Decimal::ZERO));
        assert_eq!(records.iter().map(|p| p.payable_amount()).sum::<Decimal>(), Decimal::MAX);

        let mut records = payments(&[31, 0, 7]);
        allocate(Decimal::MAX, &mut records);
        assert_eq!(records[1].payable_amount(), Decimal::ZERO);
        assert_eq!(records.iter().map(|p| p.payable_amount()).sum::<Decimal>(), Decimal::MAX);
    }

    #[test]
    fn test_empty_is_noop() {
        let mut records: Vec<BillPayment> = Vec::new();
        allocate(dec!(10), &mut records);
        assert!(records.is_empty());
    }

    #[test]
    fn test_usage_and_status_untouched() {
        let user = UserId::new();
        let mut records = vec![BillPayment::restore(user, 7, dec!(999), PaymentStatus::Paid)];
        allocate(dec!(40), &mut records);

        assert_eq!(records[0].usage_in_days(), 7);
        assert_eq!(records[0].status(), PaymentStatus::Paid);
        assert_eq!(records[0].payable_amount(), dec!(40));
    }

    #[test]
    fn test_custom_scale() {
        let mut records = payments(&[1, 2]);
        PaymentAllocator::with_scale(0).allocate(dec!(100), &mut records);

        assert_eq!(amounts(&records), vec![dec!(34), dec!(66)]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use core_kernel::UserId;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn allocation_sums_to_total(
            cents in 1i64..100_000_000i64,
            usages in proptest::collection::vec(0u32..=31u32, 1..12),
        ) {
            let total = Decimal::new(cents, 2);
            let mut records: Vec<BillPayment> =
                usages.iter().map(|&u| BillPayment::new(UserId::new(), u)).collect();

            allocate(total, &mut records);

            let sum: Decimal = records.iter().map(|p| p.payable_amount()).sum();
            prop_assert_eq!(sum, total);
            prop_assert!(records.iter().all(|p| p.payable_amount() >= Decimal::ZERO));
        }
    }
}
