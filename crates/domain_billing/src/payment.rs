//! Bill payments
//!
//! A `BillPayment` is one member's share of a bill. Payments have no life of
//! their own: they live inside a bill's `PaymentSet`, which keeps at most one
//! payment per user and only lets the allocator and the reconciler change
//! them.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::UserId;

use crate::error::BillingError;

/// Payment status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Nothing paid yet
    #[default]
    Unpaid,
    /// Member says they paid, awaiting confirmation
    Marked,
    /// Payment confirmed
    Paid,
}

impl PaymentStatus {
    /// Returns the lowercase name used in storage and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Marked => "marked",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "marked" => Ok(PaymentStatus::Marked),
            "paid" => Ok(PaymentStatus::Paid),
            other => Err(format!("Unknown payment status: {}", other)),
        }
    }
}

/// One member's share of a bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillPayment {
    user_id: UserId,
    usage_in_days: u32,
    payable_amount: Decimal,
    #[serde(default)]
    status: PaymentStatus,
}

impl BillPayment {
    /// Creates an unpaid payment with nothing allocated yet
    pub fn new(user_id: UserId, usage_in_days: u32) -> Self {
        Self {
            user_id,
            usage_in_days,
            payable_amount: Decimal::ZERO,
            status: PaymentStatus::Unpaid,
        }
    }

    /// Rebuilds a stored payment exactly as it was saved
    pub fn restore(
        user_id: UserId,
        usage_in_days: u32,
        payable_amount: Decimal,
        status: PaymentStatus,
    ) -> Self {
        Self {
            user_id,
            usage_in_days,
            payable_amount,
            status,
        }
    }

    /// Member this share belongs to
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Days of the billing period the member used
    pub fn usage_in_days(&self) -> u32 {
        self.usage_in_days
    }

    /// Amount the allocator assigned to this member
    pub fn payable_amount(&self) -> Decimal {
        self.payable_amount
    }

    /// Current payment status
    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub(crate) fn set_payable_amount(&mut self, amount: Decimal) {
        self.payable_amount = amount;
    }

    /// Merges the fields present in `edit`, leaving the rest untouched
    pub(crate) fn merge(&mut self, edit: &PaymentEdit) {
        if let Some(usage) = edit.usage_in_days {
            self.usage_in_days = usage;
        }
        if let Some(status) = edit.status {
            self.status = status;
        }
    }
}

/// A caller's change to one member's payment
///
/// Absent fields mean "leave as is" for an existing payment and "use the
/// default" for a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEdit {
    /// Member the edit applies to
    pub user_id: UserId,
    /// New usage, if changing
    #[serde(default)]
    pub usage_in_days: Option<u32>,
    /// New status, if changing
    #[serde(default)]
    pub status: Option<PaymentStatus>,
}

impl PaymentEdit {
    /// Creates an edit that changes nothing yet
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id,
            usage_in_days: None,
            status: None,
        }
    }

    /// Sets the usage to apply
    pub fn usage(mut self, days: u32) -> Self {
        self.usage_in_days = Some(days);
        self
    }

    /// Sets the status to apply
    pub fn status(mut self, status: PaymentStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// The payments of one bill, at most one per user, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BillPayment>", into = "Vec<BillPayment>")]
pub struct PaymentSet {
    payments: Vec<BillPayment>,
}

impl PaymentSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from stored payments, rejecting duplicate users
    pub fn from_payments(payments: Vec<BillPayment>) -> Result<Self, BillingError> {
        let mut seen = HashSet::with_capacity(payments.len());
        for payment in &payments {
            if !seen.insert(payment.user_id) {
                return Err(BillingError::DuplicatePayment(payment.user_id.to_string()));
            }
        }
        Ok(Self { payments })
    }

    /// Number of payments
    pub fn len(&self) -> usize {
        self.payments.len()
    }

    /// Returns true if the bill has no payments
    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }

    /// Iterates payments in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, BillPayment> {
        self.payments.iter()
    }

    /// Returns the payment for `user_id`, if any
    pub fn get(&self, user_id: UserId) -> Option<&BillPayment> {
        self.payments.iter().find(|p| p.user_id == user_id)
    }

    /// Returns true if `user_id` has a payment
    pub fn contains(&self, user_id: UserId) -> bool {
        self.get(user_id).is_some()
    }

    /// Sum of all payable amounts
    pub fn total_payable(&self) -> Decimal {
        self.payments.iter().map(|p| p.payable_amount).sum()
    }

    pub(crate) fn get_mut(&mut self, user_id: UserId) -> Option<&mut BillPayment> {
        self.payments.iter_mut().find(|p| p.user_id == user_id)
    }

    pub(crate) fn insert(&mut self, payment: BillPayment) -> Result<(), BillingError> {
        if self.contains(payment.user_id) {
            return Err(BillingError::DuplicatePayment(payment.user_id.to_string()));
        }
        self.payments.push(payment);
        Ok(())
    }

    /// Drops every payment whose user is not in `keep`, returning the dropped ids
    pub(crate) fn retain_users(&mut self, keep: &HashSet<UserId>) -> Vec<UserId> {
        let removed = self
            .payments
            .iter()
            .filter(|p| !keep.contains(&p.user_id))
            .map(|p| p.user_id)
            .collect();
        self.payments.retain(|p| keep.contains(&p.user_id));
        removed
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [BillPayment] {
        &mut self.payments
    }
}

impl TryFrom<Vec<BillPayment>> for PaymentSet {
    type Error = BillingError;

    fn try_from(payments: Vec<BillPayment>) -> Result<Self, Self::Error> {
        Self::from_payments(payments)
    }
}

impl From<PaymentSet> for Vec<BillPayment> {
    fn from(set: PaymentSet) -> Self {
        set.payments
    }
}

impl<'a> IntoIterator for &'a PaymentSet {
    type Item = &'a BillPayment;
    type IntoIter = std::slice::Iter<'a, BillPayment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
