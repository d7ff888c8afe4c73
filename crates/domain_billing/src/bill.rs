//! Bill Aggregate Root
//!
//! The Bill is the consistency boundary for a household bill and its
//! payments.
//!
//! # Invariants
//!
//! - At most one payment per user
//! - `date`, `bill_type` and `total_amount` are valid whenever they are set
//! - `reference_name` always reflects the current type and date
//! - Payments change only through reconciliation and allocation

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::BillId;
use domain_household::{User, UserDirectory};

use crate::allocation::PaymentAllocator;
use crate::error::BillingError;
use crate::payment::{BillPayment, PaymentEdit, PaymentSet, PaymentStatus};
use crate::ports::BillStore;
use crate::reconcile::{PaymentReconciler, ReconcileOutcome};
use crate::reference::generate_reference;
use crate::validation::{validate_amount, validate_date, validate_type, validate_usage};

/// Kind of utility a bill is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillType {
    Water,
    Power,
    Internet,
    Misc,
}

impl BillType {
    /// Returns the lowercase name used in references and storage
    pub fn as_str(&self) -> &'static str {
        match self {
            BillType::Water => "water",
            BillType::Power => "power",
            BillType::Internet => "internet",
            BillType::Misc => "misc",
        }
    }
}

impl fmt::Display for BillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillType {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "water" => Ok(BillType::Water),
            "power" => Ok(BillType::Power),
            "internet" => Ok(BillType::Internet),
            "misc" => Ok(BillType::Misc),
            other => Err(BillingError::UnknownBillType(other.to_string())),
        }
    }
}

/// Raw bill input as it arrives from a caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillFields {
    /// Issue date, `dd-mm-yy`
    #[serde(default)]
    pub date: Option<String>,
    /// One of water, power, internet, misc
    #[serde(default, rename = "type")]
    pub bill_type: Option<String>,
    /// Total to split, strictly positive
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    /// Attachment references
    #[serde(default)]
    pub files: Vec<String>,
}

impl BillFields {
    /// Creates fields with every required value present
    pub fn new(date: impl Into<String>, bill_type: impl Into<String>, total_amount: Decimal) -> Self {
        Self {
            date: Some(date.into()),
            bill_type: Some(bill_type.into()),
            total_amount: Some(total_amount),
            files: Vec::new(),
        }
    }

    /// Every problem with these fields, in the order date, type, amount
    pub fn problems(&self) -> Vec<BillingError> {
        let mut problems = Vec::new();

        match self.date.as_deref() {
            Some(date) => {
                if let Err(e) = validate_date(date) {
                    problems.push(e);
                }
            }
            None => problems.push(BillingError::MissingField("date")),
        }

        match self.bill_type.as_deref() {
            Some(bill_type) => {
                if let Err(e) = validate_type(bill_type) {
                    problems.push(e);
                }
            }
            None => problems.push(BillingError::MissingField("type")),
        }

        match self.total_amount {
            Some(amount) => {
                if let Err(e) = validate_amount(amount) {
                    problems.push(e);
                }
            }
            None => problems.push(BillingError::MissingField("total_amount")),
        }

        problems
    }

    fn validated(self) -> Result<(String, BillType, Decimal, Vec<String>), BillingError> {
        if let Some(problem) = self.problems().into_iter().next() {
            return Err(problem);
        }

        let date = self.date.ok_or(BillingError::MissingField("date"))?;
        let bill_type = validate_type(self.bill_type.as_deref().ok_or(BillingError::MissingField("type"))?)?;
        let total_amount = self.total_amount.ok_or(BillingError::MissingField("total_amount"))?;
        Ok((date, bill_type, total_amount, self.files))
    }
}

/// Every stored field of a bill, used by storage adapters to rebuild one
///
/// Also the wire shape a `Bill` is deserialized through. An incoming
/// `reference_name` is ignored and derived again from the type and date.
#[derive(Debug, Clone, Deserialize)]
pub struct BillSnapshot {
    #[serde(default)]
    pub id: Option<BillId>,
    pub date: String,
    #[serde(rename = "type")]
    pub bill_type: BillType,
    pub total_amount: Decimal,
    #[serde(default)]
    pub is_admin_confirmed: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub payments: Vec<BillPayment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A household bill and the members' shares of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BillSnapshot")]
pub struct Bill {
    id: Option<BillId>,
    date: String,
    #[serde(rename = "type")]
    bill_type: BillType,
    total_amount: Decimal,
    reference_name: String,
    is_admin_confirmed: bool,
    is_deleted: bool,
    files: Vec<String>,
    payments: PaymentSet,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Bill {
    /// Creates an unsaved bill with no payments
    ///
    /// # Errors
    ///
    /// The first of `MissingField`, `InvalidFormat`, `UnknownBillType`,
    /// `NonPositiveAmount` that applies, checked in that order.
    pub fn new(fields: BillFields) -> Result<Self, BillingError> {
        let (date, bill_type, total_amount, files) = fields.validated()?;
        let now = Utc::now();

        let mut bill = Self {
            id: None,
            date,
            bill_type,
            total_amount,
            reference_name: String::new(),
            is_admin_confirmed: false,
            is_deleted: false,
            files,
            payments: PaymentSet::new(),
            created_at: now,
            updated_at: now,
        };
        bill.generate_reference();
        Ok(bill)
    }

    /// Creates a bill with one payment per active member
    ///
    /// Every member starts with `default_usage_days` of usage and nothing
    /// allocated; allocation is a separate step.
    ///
    /// # Errors
    ///
    /// Field validation errors, `UsageOutOfRange` for a default usage beyond
    /// the billing period, or `NoActiveUsers` when the roster is empty.
    pub fn create_with_active_users(
        fields: BillFields,
        active_users: &[User],
        default_usage_days: u32,
    ) -> Result<Self, BillingError> {
        let mut bill = Self::new(fields)?;
        validate_usage(default_usage_days)?;

        if active_users.is_empty() {
            return Err(BillingError::NoActiveUsers);
        }

        for user in active_users {
            bill.payments.insert(BillPayment::new(user.id, default_usage_days))?;
        }
        debug!(
            reference = %bill.reference_name,
            payments = bill.payments.len(),
            "Created bill for active users"
        );
        Ok(bill)
    }

    /// Rebuilds a stored or deserialized bill
    ///
    /// Timestamps, flags and allocated amounts are kept as given and
    /// `reference_name` is derived again.
    ///
    /// # Errors
    ///
    /// `InvalidFormat`, `NonPositiveAmount` or `UsageOutOfRange` for a value
    /// a valid bill cannot hold, `DuplicatePayment` if two payments share a user.
    pub fn restore(snapshot: BillSnapshot) -> Result<Self, BillingError> {
        validate_date(&snapshot.date)?;
        validate_amount(snapshot.total_amount)?;
        for payment in &snapshot.payments {
            validate_usage(payment.usage_in_days())?;
        }
        let payments = PaymentSet::from_payments(snapshot.payments)?;
        let mut bill = Self {
            id: snapshot.id,
            date: snapshot.date,
            bill_type: snapshot.bill_type,
            total_amount: snapshot.total_amount,
            reference_name: String::new(),
            is_admin_confirmed: snapshot.is_admin_confirmed,
            is_deleted: snapshot.is_deleted,
            files: snapshot.files,
            payments,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        };
        bill.generate_reference();
        Ok(bill)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> Option<BillId> {
        self.id
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn bill_type(&self) -> BillType {
        self.bill_type
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn reference_name(&self) -> &str {
        &self.reference_name
    }

    pub fn is_admin_confirmed(&self) -> bool {
        self.is_admin_confirmed
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn payments(&self) -> &PaymentSet {
        &self.payments
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Sum of payable amounts already paid
    pub fn amount_paid(&self) -> Decimal {
        self.sum_where(|status| status == PaymentStatus::Paid)
    }

    /// Sum of payable amounts still unpaid or only marked
    pub fn amount_outstanding(&self) -> Decimal {
        self.sum_where(|status| status != PaymentStatus::Paid)
    }

    /// Every field that would be written to storage
    pub fn snapshot(&self) -> BillSnapshot {
        BillSnapshot {
            id: self.id,
            date: self.date.clone(),
            bill_type: self.bill_type,
            total_amount: self.total_amount,
            is_admin_confirmed: self.is_admin_confirmed,
            is_deleted: self.is_deleted,
            files: self.files.clone(),
            payments: self.payments.iter().cloned().collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    // ========================================================================
    // Mutators
    // ========================================================================

    /// Recomputes `reference_name` from the current type and date
    pub fn generate_reference(&mut self) {
        self.reference_name = generate_reference(self.bill_type, &self.date);
    }

    /// Changes the issue date
    pub fn set_date(&mut self, date: impl Into<String>) -> Result<(), BillingError> {
        let date = date.into();
        validate_date(&date)?;
        self.date = date;
        self.generate_reference();
        self.touch();
        Ok(())
    }

    /// Changes the bill type
    pub fn set_bill_type(&mut self, bill_type: &str) -> Result<(), BillingError> {
        self.bill_type = validate_type(bill_type)?;
        self.generate_reference();
        self.touch();
        Ok(())
    }

    /// Changes the total; existing shares are not reallocated
    pub fn set_total_amount(&mut self, total_amount: Decimal) -> Result<(), BillingError> {
        validate_amount(total_amount)?;
        self.total_amount = total_amount;
        self.touch();
        Ok(())
    }

    /// Records that an admin checked the bill
    pub fn confirm(&mut self) {
        self.is_admin_confirmed = true;
        self.touch();
    }

    /// Appends an attachment reference
    pub fn attach_file(&mut self, reference: impl Into<String>) {
        self.files.push(reference.into());
        self.touch();
    }

    /// Sets the id chosen by the store on first save
    ///
    /// Has no effect once the bill has an id.
    pub fn assign_id(&mut self, id: BillId) {
        if self.id.is_none() {
            self.id = Some(id);
        }
    }

    /// Splits the total across payments by usage
    pub fn allocate_payments(&mut self, allocator: &PaymentAllocator) {
        allocator.allocate(self.total_amount, self.payments.as_mut_slice());
        self.touch();
    }

    /// Full-replace reconciliation with the default reconciler
    pub async fn apply_edits(
        &mut self,
        edits: &[PaymentEdit],
        directory: &dyn UserDirectory,
    ) -> Result<ReconcileOutcome, BillingError> {
        self.apply_edits_with(&PaymentReconciler::default(), edits, directory).await
    }

    /// Full-replace reconciliation with a configured reconciler
    pub async fn apply_edits_with(
        &mut self,
        reconciler: &PaymentReconciler,
        edits: &[PaymentEdit],
        directory: &dyn UserDirectory,
    ) -> Result<ReconcileOutcome, BillingError> {
        let result = reconciler.reconcile(&mut self.payments, edits, directory).await;
        self.touch();
        result
    }

    /// Full-replace reconciliation that changes nothing unless every user resolves
    pub async fn apply_edits_staged(
        &mut self,
        reconciler: &PaymentReconciler,
        edits: &[PaymentEdit],
        directory: &dyn UserDirectory,
    ) -> Result<ReconcileOutcome, BillingError> {
        let outcome = reconciler.reconcile_staged(&mut self.payments, edits, directory).await?;
        self.touch();
        Ok(outcome)
    }

    /// Applies one member's edit, leaving every other payment alone
    pub async fn apply_single_edit(
        &mut self,
        reconciler: &PaymentReconciler,
        edit: &PaymentEdit,
        directory: &dyn UserDirectory,
    ) -> Result<ReconcileOutcome, BillingError> {
        let outcome = reconciler.apply_single(&mut self.payments, edit, directory).await?;
        self.touch();
        Ok(outcome)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Upserts the bill, picking up the id the store assigns
    pub async fn save(&mut self, store: &dyn BillStore) -> Result<(), BillingError> {
        *self = store.save(self.clone(), None).await?;
        Ok(())
    }

    /// Hard-deletes the bill from the store
    pub async fn delete(&self, store: &dyn BillStore) -> Result<(), BillingError> {
        let id = self.id.ok_or(BillingError::NotPersisted)?;
        store.delete(id, None).await?;
        Ok(())
    }

    fn sum_where(&self, matches: impl Fn(PaymentStatus) -> bool) -> Decimal {
        self.payments
            .iter()
            .filter(|p| matches(p.status()))
            .map(|p| p.payable_amount())
            .sum()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl TryFrom<BillSnapshot> for Bill {
    type Error = BillingError;

    fn try_from(snapshot: BillSnapshot) -> Result<Self, Self::Error> {
        Bill::restore(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn water_fields() -> BillFields {
        BillFields::new("01-01-20", "water", dec!(100))
    }

    #[test]
    fn test_missing_fields_all_reported() {
        let problems = BillFields::default().problems();
        assert_eq!(problems.len(), 3);
        assert!(matches!(problems[0], BillingError::MissingField("date")));
        assert!(matches!(problems[1], BillingError::MissingField("type")));
        assert!(matches!(problems[2], BillingError::MissingField("total_amount")));
    }

    #[test]
    fn test_new_reports_first_problem() {
        let fields = BillFields::new("1-1-20", "gas", dec!(-1));
        assert!(matches!(Bill::new(fields), Err(BillingError::InvalidFormat(_))));

        let fields = BillFields::new("01-01-20", "water", dec!(-1));
        match Bill::new(fields) {
            Err(e @ BillingError::NonPositiveAmount(_)) => {
                assert!(e.to_string().starts_with("Amount must be a positive number"));
            }
            other => panic!("Expected NonPositiveAmount, got {:?}", other),
        }
    }

    #[test]
    fn test_new_bill_defaults() {
        let bill = Bill::new(water_fields()).unwrap();

        assert!(bill.id().is_none());
        assert!(!bill.is_admin_confirmed());
        assert!(!bill.is_deleted());
        assert!(bill.files().is_empty());
        assert!(bill.payments().is_empty());
        assert_eq!(bill.reference_name(), "water-01-01-20");
    }

    #[test]
    fn test_create_with_active_users() {
        let users = vec![User::new("Alice"), User::new("Bob")];
        let bill = Bill::create_with_active_users(water_fields(), &users, 31).unwrap();

        assert_eq!(bill.payments().len(), 2);
        for (payment, user) in bill.payments().iter().zip(&users) {
            assert_eq!(payment.user_id(), user.id);
            assert_eq!(payment.usage_in_days(), 31);
            assert_eq!(payment.payable_amount(), Decimal::ZERO);
            assert_eq!(payment.status(), PaymentStatus::Unpaid);
        }
    }

    #[test]
    fn test_create_without_users_fails() {
        let result = Bill::create_with_active_users(water_fields(), &[], 31);
        assert!(matches!(result, Err(BillingError::NoActiveUsers)));
    }

    #[test]
    fn test_create_rejects_default_usage_beyond_period() {
        let users = vec![User::new("Alice")];
        let result = Bill::create_with_active_users(water_fields(), &users, 400);
        assert!(matches!(
            result,
            Err(BillingError::UsageOutOfRange { value: 400, max: 31 })
        ));
    }

    #[test]
    fn test_mutators_revalidate_and_rename() {
        let mut bill = Bill::new(water_fields()).unwrap();

        bill.set_bill_type("power").unwrap();
        bill.set_date("02-03-21").unwrap();
        assert_eq!(bill.reference_name(), "power-02-03-21");

        assert!(bill.set_date("2/3/21").is_err());
        assert!(bill.set_bill_type("gas").is_err());
        assert!(bill.set_total_amount(Decimal::ZERO).is_err());
        assert_eq!(bill.reference_name(), "power-02-03-21");
        assert_eq!(bill.total_amount(), dec!(100));
    }

    #[test]
    fn test_allocate_and_totals() {
        let users = vec![User::new("Alice"), User::new("Bob")];
        let mut bill = Bill::create_with_active_users(water_fields(), &users, 31).unwrap();
        bill.allocate_payments(&PaymentAllocator::new());

        assert_eq!(bill.payments().total_payable(), dec!(100));
        assert_eq!(bill.amount_paid(), Decimal::ZERO);
        assert_eq!(bill.amount_outstanding(), dec!(100));
    }

    #[test]
    fn test_confirm_attach_and_assign_id() {
        let mut bill = Bill::new(water_fields()).unwrap();
        bill.confirm();
        bill.attach_file("receipts/water-jan.pdf");

        let id = BillId::new();
        bill.assign_id(id);
        bill.assign_id(BillId::new());

        assert!(bill.is_admin_confirmed());
        assert_eq!(bill.files(), ["receipts/water-jan.pdf".to_string()]);
        assert_eq!(bill.id(), Some(id));
    }

    #[test]
    fn test_snapshot_restore_preserves_bill() {
        let users = vec![User::new("Alice")];
        let mut bill = Bill::create_with_active_users(water_fields(), &users, 12).unwrap();
        bill.assign_id(BillId::new());
        bill.allocate_payments(&PaymentAllocator::new());

        let restored = Bill::restore(bill.snapshot()).unwrap();
        assert_eq!(restored, bill);
    }

    #[test]
    fn test_json_uses_type_key() {
        let bill = Bill::new(water_fields()).unwrap();
        let json = serde_json::to_value(&bill).unwrap();
        assert_eq!(json["type"], "water");
        assert_eq!(json["reference_name"], "water-01-01-20");

        let fields: BillFields = serde_json::from_value(serde_json::json!({
            "date": "01-01-20",
            "type": "misc",
            "total_amount": 12.5
        }))
        .unwrap();
        assert_eq!(fields.bill_type.as_deref(), Some("misc"));
        assert!(fields.problems().is_empty());
    }

    #[test]
    fn test_json_round_trip_keeps_bill() {
        let users = vec![User::new("Alice"), User::new("Bob")];
        let mut bill = Bill::create_with_active_users(water_fields(), &users, 20).unwrap();
        bill.assign_id(BillId::new());
        bill.allocate_payments(&PaymentAllocator::new());

        let json = serde_json::to_string(&bill).unwrap();
        let decoded: Bill = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, bill);
    }

    fn bill_json(date: &str, total: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "date": date,
            "type": "water",
            "total_amount": total,
            "reference_name": "hand-written",
            "created_at": "2020-01-01T00:00:00Z",
            "updated_at": "2020-01-01T00:00:00Z"
        })
    }

    #[test]
    fn test_deserialize_validates_fields() {
        let bad_date = bill_json("1 January 2020", serde_json::json!(100));
        let err = serde_json::from_value::<Bill>(bad_date).unwrap_err();
        assert!(err.to_string().starts_with("Invalid date format"));

        let bad_total = bill_json("01-01-20", serde_json::json!(-5));
        let err = serde_json::from_value::<Bill>(bad_total).unwrap_err();
        assert!(err.to_string().starts_with("Amount must be a positive number"));
    }

    #[test]
    fn test_deserialize_derives_reference_name() {
        let bill: Bill = serde_json::from_value(bill_json("01-01-20", serde_json::json!(100))).unwrap();

        assert_eq!(bill.reference_name(), "water-01-01-20");
        assert!(bill.id().is_none());
        assert!(bill.payments().is_empty());
    }

    #[test]
    fn test_restore_rejects_usage_beyond_period() {
        let mut snapshot = Bill::new(water_fields()).unwrap().snapshot();
        snapshot.payments.push(BillPayment::new(core_kernel::UserId::new(), 45));

        assert!(matches!(
            Bill::restore(snapshot),
            Err(BillingError::UsageOutOfRange { value: 45, max: 31 })
        ));
    }
}
