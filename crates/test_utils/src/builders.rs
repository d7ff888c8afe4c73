//! Test Data Builders
//!
//! Provides builder patterns for constructing bills with a chosen payment
//! list. Tests specify only the relevant parts and get defaults for the rest.

use rust_decimal::Decimal;

use core_kernel::UserId;
use domain_billing::{Bill, BillFields, BillPayment, BillSnapshot, PaymentStatus};

use crate::fixtures::BillFixtures;

/// Builder for bills as they would be loaded from storage
pub struct TestBillBuilder {
    fields: BillFields,
    is_admin_confirmed: bool,
    is_deleted: bool,
    payments: Vec<BillPayment>,
}

impl Default for TestBillBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBillBuilder {
    /// Creates a builder for the standard water bill with no payments
    pub fn new() -> Self {
        Self {
            fields: BillFixtures::water_bill_fields(),
            is_admin_confirmed: false,
            is_deleted: false,
            payments: Vec::new(),
        }
    }

    /// Sets the total amount
    pub fn with_total(mut self, total: Decimal) -> Self {
        self.fields.total_amount = Some(total);
        self
    }

    /// Adds an unpaid payment with nothing allocated
    pub fn with_payment(self, user_id: UserId, usage_in_days: u32) -> Self {
        self.with_payment_state(user_id, usage_in_days, Decimal::ZERO, PaymentStatus::Unpaid)
    }

    /// Adds a payment in an arbitrary state
    pub fn with_payment_state(
        mut self,
        user_id: UserId,
        usage_in_days: u32,
        payable_amount: Decimal,
        status: PaymentStatus,
    ) -> Self {
        self.payments
            .push(BillPayment::restore(user_id, usage_in_days, payable_amount, status));
        self
    }

    /// Marks the bill as admin-confirmed
    pub fn confirmed(mut self) -> Self {
        self.is_admin_confirmed = true;
        self
    }

    /// Sets the legacy soft-delete flag
    pub fn flagged_deleted(mut self) -> Self {
        self.is_deleted = true;
        self
    }

    /// Builds the bill
    ///
    /// # Panics
    ///
    /// Panics if the fields are invalid or two payments share a user.
    pub fn build(self) -> Bill {
        let template = Bill::new(self.fields).expect("builder fields must be valid");
        Bill::restore(BillSnapshot {
            id: None,
            date: template.date().to_string(),
            bill_type: template.bill_type(),
            total_amount: template.total_amount(),
            is_admin_confirmed: self.is_admin_confirmed,
            is_deleted: self.is_deleted,
            files: template.files().to_vec(),
            payments: self.payments,
            created_at: template.created_at(),
            updated_at: template.updated_at(),
        })
        .expect("builder payments must have distinct users")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_builder_defaults() {
        let bill = TestBillBuilder::new().build();
        assert!(bill.id().is_none());
        assert_eq!(bill.reference_name(), "water-01-01-20");
        assert!(bill.payments().is_empty());
    }

    #[test]
    fn test_builder_payments_and_flags() {
        let user = UserId::new();
        let bill = TestBillBuilder::new()
            .with_total(dec!(50))
            .with_payment_state(user, 10, dec!(50), PaymentStatus::Paid)
            .confirmed()
            .flagged_deleted()
            .build();

        assert_eq!(bill.total_amount(), dec!(50));
        assert_eq!(bill.amount_paid(), dec!(50));
        assert!(bill.is_admin_confirmed());
        assert!(bill.is_deleted());
    }
}
