//! Billing Domain Ports
//!
//! This module defines the `BillStore` port through which bills are loaded
//! and persisted.
//!
//! # Architecture
//!
//! - **Internal Adapter**: PostgreSQL `bills`/`bill_payments` tables (infra_db)
//! - **Mock Adapter**: In-memory store for tests
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_billing::BillStore;
//! use std::sync::Arc;
//!
//! let store: Arc<dyn BillStore> = Arc::new(PostgresBillStore::new(pool));
//! let bill = store.load(bill_id, None).await?;
//! ```

use async_trait::async_trait;

use core_kernel::{BillId, DomainPort, HealthCheckable, OperationMetadata, PortError};

use crate::bill::Bill;

/// Persistence for bills and their payments
///
/// A bill and its payments are written together; a store never keeps a
/// half-saved bill.
#[async_trait]
pub trait BillStore: DomainPort + HealthCheckable {
    /// Loads a bill by ID
    ///
    /// # Returns
    ///
    /// The bill, or `PortError::NotFound`
    async fn load(
        &self,
        id: BillId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Bill, PortError>;

    /// Inserts or replaces a bill with its full payment list
    ///
    /// A bill without an id is given one; the stored bill is returned.
    async fn save(
        &self,
        bill: Bill,
        metadata: Option<OperationMetadata>,
    ) -> Result<Bill, PortError>;

    /// Removes a bill and its payments
    ///
    /// # Returns
    ///
    /// `PortError::NotFound` if no such bill is stored
    async fn delete(
        &self,
        id: BillId,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    /// Lists every stored bill, oldest first
    async fn find_all(
        &self,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Bill>, PortError>;
}

/// Mock implementation of BillStore for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    /// In-memory mock implementation of BillStore
    ///
    /// Bills are kept in insertion order. Saving can be made to fail so that
    /// callers' error paths are testable.
    #[derive(Debug, Default)]
    pub struct InMemoryBillStore {
        bills: Arc<RwLock<Vec<Bill>>>,
        save_failure: Arc<RwLock<Option<String>>>,
        save_count: Arc<RwLock<usize>>,
    }

    impl InMemoryBillStore {
        /// Creates an empty store
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of successful saves so far
        pub async fn save_count(&self) -> usize {
            *self.save_count.read().await
        }

        /// Number of stored bills
        pub async fn len(&self) -> usize {
            self.bills.read().await.len()
        }

        /// Makes every later save fail with an internal error
        pub async fn fail_saves(&self, message: impl Into<String>) {
            *self.save_failure.write().await = Some(message.into());
        }
    }

    impl DomainPort for InMemoryBillStore {}

    #[async_trait]
    impl HealthCheckable for InMemoryBillStore {
        async fn health_check(&self) -> HealthCheckResult {
            let mut result = HealthCheckResult::healthy("in-memory-bill-store", 0);
            result.message = Some("Mock adapter always healthy".to_string());
            result
        }
    }

    #[async_trait]
    impl BillStore for InMemoryBillStore {
        async fn load(
            &self,
            id: BillId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Bill, PortError> {
            self.bills
                .read()
                .await
                .iter()
                .find(|b| b.id() == Some(id))
                .cloned()
                .ok_or_else(|| PortError::not_found("Bill", id))
        }

        async fn save(
            &self,
            mut bill: Bill,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Bill, PortError> {
            if let Some(message) = self.save_failure.read().await.as_ref() {
                return Err(PortError::internal(message.clone()));
            }

            if bill.id().is_none() {
                bill.assign_id(BillId::new_v7());
            }

            let mut bills = self.bills.write().await;
            match bills.iter_mut().find(|b| b.id() == bill.id()) {
                Some(existing) => *existing = bill.clone(),
                None => bills.push(bill.clone()),
            }
            *self.save_count.write().await += 1;
            Ok(bill)
        }

        async fn delete(
            &self,
            id: BillId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            let mut bills = self.bills.write().await;
            let before = bills.len();
            bills.retain(|b| b.id() != Some(id));
            if bills.len() == before {
                return Err(PortError::not_found("Bill", id));
            }
            Ok(())
        }

        async fn find_all(
            &self,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Bill>, PortError> {
            Ok(self.bills.read().await.clone())
        }
    }
}
