//! PostgreSQL Bill Store Adapter
//!
//! This module provides the internal (database) adapter for the billing
//! domain, implementing the `BillStore` trait using the `BillRepository`.
//!
//! # Overview
//!
//! The adapter:
//!
//! - Assigns a time-ordered id to bills saved for the first time
//! - Converts bills to rows and back, keeping payment order
//! - Translates database errors into port errors
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::PostgresBillStore;
//! use domain_billing::BillStore;
//! use std::sync::Arc;
//!
//! let store: Arc<dyn BillStore> = Arc::new(PostgresBillStore::new(pool));
//! let bill = store.load(bill_id, None).await?;
//! ```

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    BillId, DomainPort, HealthCheckResult, HealthCheckable, OperationMetadata, PortError, UserId,
};
use domain_billing::{Bill, BillPayment, BillSnapshot, BillStore, PaymentStatus};

use crate::error::DatabaseError;
use crate::repositories::bills::{BillPaymentRow, BillRepository, BillRow};

/// PostgreSQL-backed implementation of the BillStore trait
///
/// # Error Handling
///
/// - Missing bills -> `PortError::NotFound`
/// - Payments for unknown users -> `PortError::Conflict`
/// - Rows that no longer parse -> `PortError::Internal`
#[derive(Debug, Clone)]
pub struct PostgresBillStore {
    repository: BillRepository,
    pool: PgPool,
}

impl PostgresBillStore {
    /// Creates a new PostgreSQL bill store
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: BillRepository::new(pool.clone()),
            pool,
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &BillRepository {
        &self.repository
    }
}

impl DomainPort for PostgresBillStore {}

#[async_trait]
impl HealthCheckable for PostgresBillStore {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, "postgres-bill-store").await
    }
}

#[async_trait]
impl BillStore for PostgresBillStore {
    #[instrument(skip(self, _metadata), fields(bill_id = %id))]
    async fn load(
        &self,
        id: BillId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Bill, PortError> {
        let (bill, payments) = self
            .repository
            .find_by_id(*id.as_uuid())
            .await?
            .ok_or_else(|| DatabaseError::not_found("Bill", id))?;

        Ok(rows_to_bill(bill, payments)?)
    }

    #[instrument(skip(self, bill, _metadata), fields(reference = %bill.reference_name()))]
    async fn save(
        &self,
        mut bill: Bill,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Bill, PortError> {
        if bill.id().is_none() {
            bill.assign_id(BillId::new_v7());
        }

        let (row, payments) = bill_to_rows(&bill)?;
        self.repository.upsert(&row, &payments).await?;
        debug!(bill_id = %row.bill_id, payments = payments.len(), "Bill saved");
        Ok(bill)
    }

    #[instrument(skip(self, _metadata), fields(bill_id = %id))]
    async fn delete(
        &self,
        id: BillId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        if !self.repository.delete(*id.as_uuid()).await? {
            return Err(DatabaseError::not_found("Bill", id).into());
        }
        Ok(())
    }

    #[instrument(skip(self, _metadata))]
    async fn find_all(
        &self,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Bill>, PortError> {
        let rows = self.repository.find_all().await?;
        debug!(count = rows.len(), "Loaded bills");

        let bills = rows
            .into_iter()
            .map(|(bill, payments)| rows_to_bill(bill, payments))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(bills)
    }
}

/// Splits a bill into its `bills` row and ordered `bill_payments` rows
pub(crate) fn bill_to_rows(bill: &Bill) -> Result<(BillRow, Vec<BillPaymentRow>), DatabaseError> {
    let bill_id = *bill
        .id()
        .ok_or_else(|| DatabaseError::invalid_row("bill has no id"))?
        .as_uuid();

    let payments = bill
        .payments()
        .iter()
        .enumerate()
        .map(|(position, payment)| {
            Ok(BillPaymentRow {
                bill_id,
                position: i32::try_from(position).map_err(DatabaseError::invalid_row)?,
                user_id: *payment.user_id().as_uuid(),
                usage_in_days: i32::try_from(payment.usage_in_days())
                    .map_err(DatabaseError::invalid_row)?,
                payable_amount: payment.payable_amount(),
                status: payment.status().as_str().to_string(),
            })
        })
        .collect::<Result<Vec<_>, DatabaseError>>()?;

    let row = BillRow {
        bill_id,
        bill_date: bill.date().to_string(),
        bill_type: bill.bill_type().as_str().to_string(),
        total_amount: bill.total_amount(),
        reference_name: bill.reference_name().to_string(),
        is_admin_confirmed: bill.is_admin_confirmed(),
        is_deleted: bill.is_deleted(),
        files: bill.files().to_vec(),
        created_at: bill.created_at(),
        updated_at: bill.updated_at(),
    };

    Ok((row, payments))
}

/// Rebuilds a bill from its row and payment rows
pub(crate) fn rows_to_bill(row: BillRow, payments: Vec<BillPaymentRow>) -> Result<Bill, DatabaseError> {
    let payments = payments
        .into_iter()
        .map(|p| {
            let usage = u32::try_from(p.usage_in_days).map_err(DatabaseError::invalid_row)?;
            let status: PaymentStatus = p.status.parse().map_err(DatabaseError::invalid_row)?;
            Ok(BillPayment::restore(
                UserId::from_uuid(p.user_id),
                usage,
                p.payable_amount,
                status,
            ))
        })
        .collect::<Result<Vec<_>, DatabaseError>>()?;

    let snapshot = BillSnapshot {
        id: Some(BillId::from_uuid(row.bill_id)),
        date: row.bill_date,
        bill_type: row.bill_type.parse().map_err(DatabaseError::invalid_row)?,
        total_amount: row.total_amount,
        is_admin_confirmed: row.is_admin_confirmed,
        is_deleted: row.is_deleted,
        files: row.files,
        payments,
        created_at: row.created_at,
        updated_at: row.updated_at,
    };

    Bill::restore(snapshot).map_err(DatabaseError::invalid_row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain_billing::{BillFields, PaymentAllocator};
    use domain_household::User;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn saved_bill() -> Bill {
        let users = vec![User::new("Alice"), User::new("Bob")];
        let mut bill = Bill::create_with_active_users(
            BillFields::new("01-01-20", "water", dec!(100)),
            &users,
            31,
        )
        .unwrap();
        bill.assign_id(BillId::new_v7());
        bill.attach_file("receipts/jan.pdf");
        bill.allocate_payments(&PaymentAllocator::new());
        bill
    }

    fn bill_row(bill_type: &str) -> BillRow {
        BillRow {
            bill_id: Uuid::new_v4(),
            bill_date: "01-01-20".to_string(),
            bill_type: bill_type.to_string(),
            total_amount: dec!(10),
            reference_name: format!("{}-01-01-20", bill_type),
            is_admin_confirmed: false,
            is_deleted: false,
            files: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_rows_round_trip() {
        let bill = saved_bill();
        let (row, payments) = bill_to_rows(&bill).unwrap();

        assert_eq!(row.reference_name, "water-01-01-20");
        assert_eq!(row.files, vec!["receipts/jan.pdf".to_string()]);
        assert_eq!(payments.iter().map(|p| p.position).collect::<Vec<_>>(), vec![0, 1]);
        assert!(payments.iter().all(|p| p.status == "unpaid"));

        let back = rows_to_bill(row, payments).unwrap();
        assert_eq!(back, bill);
    }

    #[test]
    fn test_unsaved_bill_has_no_rows() {
        let bill = Bill::new(BillFields::new("01-01-20", "misc", dec!(5))).unwrap();
        assert!(bill_to_rows(&bill).is_err());
    }

    #[test]
    fn test_unknown_stored_type_is_rejected() {
        let err = rows_to_bill(bill_row("gas"), vec![]).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidRow(_)));
    }

    #[test]
    fn test_negative_usage_is_rejected() {
        let row = bill_row("power");
        let payment = BillPaymentRow {
            bill_id: row.bill_id,
            position: 0,
            user_id: Uuid::new_v4(),
            usage_in_days: -1,
            payable_amount: dec!(0),
            status: "unpaid".to_string(),
        };
        assert!(rows_to_bill(row, vec![payment]).is_err());
    }

    #[test]
    fn test_group_payments_keeps_order() {
        use crate::repositories::bills::group_payments;

        let first = bill_row("water");
        let second = bill_row("power");
        let payment = |bill_id, position| BillPaymentRow {
            bill_id,
            position,
            user_id: Uuid::new_v4(),
            usage_in_days: 1,
            payable_amount: dec!(0),
            status: "paid".to_string(),
        };
        let payments = vec![
            payment(second.bill_id, 0),
            payment(first.bill_id, 1),
            payment(first.bill_id, 0),
        ];

        let grouped = group_payments(vec![first.clone(), second.clone()], payments);
        assert_eq!(grouped[0].0.bill_id, first.bill_id);
        assert_eq!(grouped[0].1.iter().map(|p| p.position).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(grouped[1].1.len(), 1);
    }
}
