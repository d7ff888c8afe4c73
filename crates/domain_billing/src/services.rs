//! Billing domain services
//!
//! `BillService` orchestrates the bill aggregate, the user directory and the
//! bill store. Every mutating operation loads the bill, changes it in memory
//! and saves it only if the change succeeded.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use core_kernel::{BillId, PortError};
use domain_household::UserDirectory;

use crate::bill::{Bill, BillFields};
use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::payment::PaymentEdit;
use crate::ports::BillStore;
use crate::reconcile::ReconcileOutcome;

/// Service for creating and maintaining household bills
pub struct BillService {
    store: Arc<dyn BillStore>,
    directory: Arc<dyn UserDirectory>,
    config: BillingConfig,
}

impl BillService {
    /// Creates a service with default configuration
    pub fn new(store: Arc<dyn BillStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self::with_config(store, directory, BillingConfig::default())
    }

    /// Creates a service with explicit configuration
    pub fn with_config(
        store: Arc<dyn BillStore>,
        directory: Arc<dyn UserDirectory>,
        config: BillingConfig,
    ) -> Self {
        Self {
            store,
            directory,
            config,
        }
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    /// Lists stored bills, hiding any flagged as deleted
    pub async fn list_bills(&self) -> Result<Vec<Bill>, BillingError> {
        let bills = self.store.find_all(None).await?;
        Ok(bills.into_iter().filter(|b| !b.is_deleted()).collect())
    }

    /// Loads one bill
    ///
    /// # Errors
    ///
    /// `BillNotFound` if the store has no bill with this id.
    pub async fn get_bill(&self, id: BillId) -> Result<Bill, BillingError> {
        self.store
            .load(id, None)
            .await
            .map_err(|e| not_found_or_storage(id, e))
    }

    /// Creates and saves a bill with one payment per active member
    ///
    /// The total is split immediately only when `allocate_on_create` is set.
    #[instrument(skip(self, input), fields(bill_type = ?input.bill_type, date = ?input.date))]
    pub async fn create_bill(&self, input: BillFields) -> Result<Bill, BillingError> {
        let active_users = self.directory.get_active_users(None).await?;

        let mut bill =
            Bill::create_with_active_users(input, &active_users, self.config.default_usage_days)?;
        if self.config.allocate_on_create {
            bill.allocate_payments(&self.config.allocator());
        }
        bill.save(self.store.as_ref()).await?;

        info!(
            bill_id = ?bill.id(),
            reference = %bill.reference_name(),
            payments = bill.payments().len(),
            "Bill created"
        );
        Ok(bill)
    }

    /// Applies one member's edit and saves
    #[instrument(skip(self, edit), fields(bill_id = %id, user_id = %edit.user_id))]
    pub async fn update_payment(&self, id: BillId, edit: PaymentEdit) -> Result<Bill, BillingError> {
        let reconciler = self.config.reconciler()?;
        let mut bill = self.get_bill(id).await?;
        bill.apply_single_edit(&reconciler, &edit, self.directory.as_ref())
            .await?;
        bill.save(self.store.as_ref()).await?;
        Ok(bill)
    }

    /// Replaces the bill's payments with the given edits and saves
    ///
    /// A failed reconciliation is not saved, so the stored bill keeps its
    /// previous payments.
    #[instrument(skip(self, edits), fields(bill_id = %id, edits = edits.len()))]
    pub async fn reconcile_payments(
        &self,
        id: BillId,
        edits: &[PaymentEdit],
    ) -> Result<(Bill, ReconcileOutcome), BillingError> {
        let reconciler = self.config.reconciler()?;
        let mut bill = self.get_bill(id).await?;

        let result = if self.config.staged_reconciliation {
            bill.apply_edits_staged(&reconciler, edits, self.directory.as_ref()).await
        } else {
            bill.apply_edits_with(&reconciler, edits, self.directory.as_ref()).await
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(bill_id = %id, error = %e, "Reconciliation failed, bill not saved");
                return Err(e);
            }
        };

        bill.save(self.store.as_ref()).await?;
        info!(
            bill_id = %id,
            inserted = outcome.inserted.len(),
            updated = outcome.updated.len(),
            removed = outcome.removed.len(),
            "Payments reconciled"
        );
        Ok((bill, outcome))
    }

    /// Splits the total across current payments and saves
    #[instrument(skip(self), fields(bill_id = %id))]
    pub async fn allocate_payments(&self, id: BillId) -> Result<Bill, BillingError> {
        let mut bill = self.get_bill(id).await?;
        bill.allocate_payments(&self.config.allocator());
        bill.save(self.store.as_ref()).await?;
        Ok(bill)
    }

    /// Marks the bill as checked by an admin and saves
    #[instrument(skip(self), fields(bill_id = %id))]
    pub async fn confirm_bill(&self, id: BillId) -> Result<Bill, BillingError> {
        let mut bill = self.get_bill(id).await?;
        bill.confirm();
        bill.save(self.store.as_ref()).await?;
        Ok(bill)
    }

    /// Removes the bill and its payments from the store
    #[instrument(skip(self), fields(bill_id = %id))]
    pub async fn delete_bill(&self, id: BillId) -> Result<(), BillingError> {
        self.store
            .delete(id, None)
            .await
            .map_err(|e| not_found_or_storage(id, e))?;
        info!(bill_id = %id, "Bill deleted");
        Ok(())
    }
}

fn not_found_or_storage(id: BillId, error: PortError) -> BillingError {
    if error.is_not_found() {
        BillingError::BillNotFound(id.to_string())
    } else {
        BillingError::Storage(error)
    }
}
