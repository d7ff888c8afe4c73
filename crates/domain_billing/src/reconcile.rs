//! Payment reconciliation
//!
//! Brings a bill's payments into line with a caller-supplied list of edits,
//! using the `UserDirectory` as the source of truth for who exists.
//!
//! # Semantics
//!
//! - Edits apply in input order; a later edit for the same user overwrites
//!   the fields an earlier one set.
//! - An edit for a user with a payment merges the fields it carries.
//! - An edit for a user without a payment inserts one with nothing allocated.
//! - Once every edit has applied, payments for users missing from the edits
//!   are removed. Omission means deletion.
//! - Amounts are never recomputed here; run the allocator afterwards.
//!
//! # Failure
//!
//! `reconcile` applies as it goes. When a lookup fails it stops at once and
//! returns `UserLookup`, leaving the edits before it applied and skipping the
//! removal pass. `reconcile_staged` resolves every user before touching
//! anything, so a failed lookup leaves the payments exactly as they were.

use std::collections::HashSet;

use tracing::{debug, warn};

use core_kernel::UserId;
use domain_household::UserDirectory;

use crate::error::BillingError;
use crate::payment::{BillPayment, PaymentEdit, PaymentSet};
use crate::validation::{validate_usage, MAX_USAGE_DAYS};

/// What a reconciliation changed, by user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Users that got a new payment
    pub inserted: Vec<UserId>,
    /// Users whose existing payment was edited
    pub updated: Vec<UserId>,
    /// Users whose payment was removed
    pub removed: Vec<UserId>,
}

impl ReconcileOutcome {
    /// Returns true if nothing was inserted, updated or removed
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Applies payment edits against a bill's payments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentReconciler {
    default_usage_days: u32,
}

impl PaymentReconciler {
    /// Creates a reconciler giving new payments the full billing period
    pub fn new() -> Self {
        Self {
            default_usage_days: MAX_USAGE_DAYS,
        }
    }

    /// Creates a reconciler giving new payments `days` of usage when an edit omits it
    ///
    /// # Errors
    ///
    /// `UsageOutOfRange` if `days` exceeds the billing period.
    pub fn with_default_usage(days: u32) -> Result<Self, BillingError> {
        validate_usage(days)?;
        Ok(Self {
            default_usage_days: days,
        })
    }

    /// Usage given to inserted payments whose edit carries none
    pub fn default_usage_days(&self) -> u32 {
        self.default_usage_days
    }

    /// Full-replace reconciliation, applied edit by edit
    ///
    /// # Errors
    ///
    /// - `UsageOutOfRange` if any edit carries usage above 31 days; checked
    ///   before anything changes
    /// - `UserLookup` if the directory cannot resolve an edit's user; edits
    ///   before it stay applied
    pub async fn reconcile(
        &self,
        payments: &mut PaymentSet,
        edits: &[PaymentEdit],
        directory: &dyn UserDirectory,
    ) -> Result<ReconcileOutcome, BillingError> {
        check_usages(edits)?;

        let mut outcome = ReconcileOutcome::default();
        let mut seen = HashSet::with_capacity(edits.len());

        for edit in edits {
            resolve(directory, edit.user_id).await?;
            self.apply(payments, edit, &mut outcome)?;
            seen.insert(edit.user_id);
        }

        outcome.removed = payments.retain_users(&seen);
        debug!(
            inserted = outcome.inserted.len(),
            updated = outcome.updated.len(),
            removed = outcome.removed.len(),
            "Reconciled payments"
        );
        Ok(outcome)
    }

    /// Full-replace reconciliation that resolves every user first
    ///
    /// Same result as [`reconcile`](Self::reconcile) on success. On failure
    /// the payments are left untouched.
    pub async fn reconcile_staged(
        &self,
        payments: &mut PaymentSet,
        edits: &[PaymentEdit],
        directory: &dyn UserDirectory,
    ) -> Result<ReconcileOutcome, BillingError> {
        check_usages(edits)?;

        let mut seen = HashSet::with_capacity(edits.len());
        for edit in edits {
            if seen.insert(edit.user_id) {
                resolve(directory, edit.user_id).await?;
            }
        }

        let mut staged = payments.clone();
        let mut outcome = ReconcileOutcome::default();
        for edit in edits {
            self.apply(&mut staged, edit, &mut outcome)?;
        }
        outcome.removed = staged.retain_users(&seen);

        *payments = staged;
        debug!(
            inserted = outcome.inserted.len(),
            updated = outcome.updated.len(),
            removed = outcome.removed.len(),
            "Reconciled payments (staged)"
        );
        Ok(outcome)
    }

    /// Applies one edit without removing anyone else's payment
    pub async fn apply_single(
        &self,
        payments: &mut PaymentSet,
        edit: &PaymentEdit,
        directory: &dyn UserDirectory,
    ) -> Result<ReconcileOutcome, BillingError> {
        check_usages(std::slice::from_ref(edit))?;
        resolve(directory, edit.user_id).await?;

        let mut outcome = ReconcileOutcome::default();
        self.apply(payments, edit, &mut outcome)?;
        Ok(outcome)
    }

    fn apply(
        &self,
        payments: &mut PaymentSet,
        edit: &PaymentEdit,
        outcome: &mut ReconcileOutcome,
    ) -> Result<(), BillingError> {
        match payments.get_mut(edit.user_id) {
            Some(existing) => {
                existing.merge(edit);
                if !outcome.inserted.contains(&edit.user_id) && !outcome.updated.contains(&edit.user_id) {
                    outcome.updated.push(edit.user_id);
                }
            }
            None => {
                let mut payment = BillPayment::new(edit.user_id, self.default_usage_days);
                payment.merge(edit);
                payments.insert(payment)?;
                outcome.inserted.push(edit.user_id);
            }
        }
        Ok(())
    }
}

impl Default for PaymentReconciler {
    fn default() -> Self {
        Self::new()
    }
}

fn check_usages(edits: &[PaymentEdit]) -> Result<(), BillingError> {
    edits
        .iter()
        .filter_map(|edit| edit.usage_in_days)
        .try_for_each(validate_usage)
}

async fn resolve(directory: &dyn UserDirectory, user_id: UserId) -> Result<(), BillingError> {
    match directory.resolve_user(user_id, None).await {
        Ok(user) => {
            debug!(user_id = %user_id, display_name = %user.display_name, "Resolved payment user");
            Ok(())
        }
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Could not resolve payment user");
            Err(BillingError::user_lookup(user_id, e.message()))
        }
    }
}
