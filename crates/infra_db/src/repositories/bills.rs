//! Bill repository implementation
//!
//! A bill and its payments are always written in one transaction. Payments
//! are replaced wholesale on every save and keep their order through the
//! `position` column.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

/// Row from the `bills` table
#[derive(Debug, Clone, FromRow)]
pub struct BillRow {
    pub bill_id: Uuid,
    pub bill_date: String,
    pub bill_type: String,
    pub total_amount: Decimal,
    pub reference_name: String,
    pub is_admin_confirmed: bool,
    pub is_deleted: bool,
    pub files: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row from the `bill_payments` table
#[derive(Debug, Clone, FromRow)]
pub struct BillPaymentRow {
    pub bill_id: Uuid,
    pub position: i32,
    pub user_id: Uuid,
    pub usage_in_days: i32,
    pub payable_amount: Decimal,
    pub status: String,
}

const SELECT_BILL: &str = r#"
    SELECT bill_id, bill_date, bill_type, total_amount, reference_name,
           is_admin_confirmed, is_deleted, files, created_at, updated_at
    FROM bills
"#;

const SELECT_PAYMENT: &str = r#"
    SELECT bill_id, position, user_id, usage_in_days, payable_amount, status
    FROM bill_payments
"#;

/// Repository for bills and their payments
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: PgPool,
}

impl BillRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads one bill with its payments in stored order
    pub async fn find_by_id(
        &self,
        bill_id: Uuid,
    ) -> Result<Option<(BillRow, Vec<BillPaymentRow>)>, DatabaseError> {
        let bill = sqlx::query_as::<_, BillRow>(&format!("{SELECT_BILL} WHERE bill_id = $1"))
            .bind(bill_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(bill) = bill else {
            return Ok(None);
        };

        let payments = sqlx::query_as::<_, BillPaymentRow>(&format!(
            "{SELECT_PAYMENT} WHERE bill_id = $1 ORDER BY position"
        ))
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some((bill, payments)))
    }

    /// Loads every bill, oldest first, with its payments
    pub async fn find_all(&self) -> Result<Vec<(BillRow, Vec<BillPaymentRow>)>, DatabaseError> {
        let bills = sqlx::query_as::<_, BillRow>(&format!(
            "{SELECT_BILL} ORDER BY created_at, bill_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = bills.iter().map(|b| b.bill_id).collect();
        let payments = sqlx::query_as::<_, BillPaymentRow>(&format!(
            "{SELECT_PAYMENT} WHERE bill_id = ANY($1) ORDER BY bill_id, position"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_payments(bills, payments))
    }

    /// Inserts or replaces a bill and all of its payments
    pub async fn upsert(
        &self,
        bill: &BillRow,
        payments: &[BillPaymentRow],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO bills (
                bill_id, bill_date, bill_type, total_amount, reference_name,
                is_admin_confirmed, is_deleted, files, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (bill_id) DO UPDATE SET
                bill_date = EXCLUDED.bill_date,
                bill_type = EXCLUDED.bill_type,
                total_amount = EXCLUDED.total_amount,
                reference_name = EXCLUDED.reference_name,
                is_admin_confirmed = EXCLUDED.is_admin_confirmed,
                is_deleted = EXCLUDED.is_deleted,
                files = EXCLUDED.files,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(bill.bill_id)
        .bind(&bill.bill_date)
        .bind(&bill.bill_type)
        .bind(bill.total_amount)
        .bind(&bill.reference_name)
        .bind(bill.is_admin_confirmed)
        .bind(bill.is_deleted)
        .bind(&bill.files)
        .bind(bill.created_at)
        .bind(bill.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM bill_payments WHERE bill_id = $1")
            .bind(bill.bill_id)
            .execute(&mut *tx)
            .await?;

        for payment in payments {
            sqlx::query(
                r#"
                INSERT INTO bill_payments (
                    bill_id, position, user_id, usage_in_days, payable_amount, status
                ) VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(payment.bill_id)
            .bind(payment.position)
            .bind(payment.user_id)
            .bind(payment.usage_in_days)
            .bind(payment.payable_amount)
            .bind(&payment.status)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Deletes a bill; payments go with it
    ///
    /// # Returns
    ///
    /// `false` if no bill had this id
    pub async fn delete(&self, bill_id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM bills WHERE bill_id = $1")
            .bind(bill_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Pairs each bill with its payments, keeping both orders
pub(crate) fn group_payments(
    bills: Vec<BillRow>,
    payments: Vec<BillPaymentRow>,
) -> Vec<(BillRow, Vec<BillPaymentRow>)> {
    let mut by_bill: HashMap<Uuid, Vec<BillPaymentRow>> = HashMap::new();
    for payment in payments {
        by_bill.entry(payment.bill_id).or_default().push(payment);
    }

    bills
        .into_iter()
        .map(|bill| {
            let mut rows = by_bill.remove(&bill.bill_id).unwrap_or_default();
            rows.sort_by_key(|p| p.position);
            (bill, rows)
        })
        .collect()
}
