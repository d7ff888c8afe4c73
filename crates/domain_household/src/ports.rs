//! Household Domain Ports
//!
//! This module defines the `UserDirectory` port, the billing domain's only
//! view of household membership.
//!
//! # Architecture
//!
//! - **Internal Adapter**: PostgreSQL `users` table (infra_db)
//! - **Mock Adapter**: In-memory directory for tests
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_household::UserDirectory;
//! use std::sync::Arc;
//!
//! let directory: Arc<dyn UserDirectory> = Arc::new(PostgresUserDirectory::new(pool));
//! let roster = directory.get_active_users(None).await?;
//! ```

use async_trait::async_trait;

use core_kernel::{UserId, PortError, DomainPort, OperationMetadata, HealthCheckable};

use crate::user::User;

/// Source of truth for household membership
///
/// All methods are async and return `Result<T, PortError>` for consistent
/// error handling across adapter implementations.
#[async_trait]
pub trait UserDirectory: DomainPort + HealthCheckable {
    /// Lists every member currently eligible to be billed
    ///
    /// # Arguments
    ///
    /// * `metadata` - Optional operation metadata for tracing/auditing
    ///
    /// # Returns
    ///
    /// Active members in a stable order (oldest first)
    async fn get_active_users(
        &self,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<User>, PortError>;

    /// Resolves a user by ID, active or not
    ///
    /// # Arguments
    ///
    /// * `id` - The user identifier
    /// * `metadata` - Optional operation metadata for tracing/auditing
    ///
    /// # Returns
    ///
    /// The user if known, or `PortError::NotFound`
    async fn resolve_user(
        &self,
        id: UserId,
        metadata: Option<OperationMetadata>,
    ) -> Result<User, PortError>;
}

/// Mock implementation of UserDirectory for testing
///
/// This adapter stores users in memory and can be told to fail lookups for
/// particular ids, which is how reconciliation failure paths are exercised.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    /// In-memory mock implementation of UserDirectory
    #[derive(Debug, Default)]
    pub struct InMemoryUserDirectory {
        users: Arc<RwLock<Vec<User>>>,
        failures: Arc<RwLock<HashMap<UserId, String>>>,
    }

    impl InMemoryUserDirectory {
        /// Creates an empty directory
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with users for testing
        pub async fn with_users(users: Vec<User>) -> Self {
            let directory = Self::new();
            for user in users {
                directory.users.write().await.push(user);
            }
            directory
        }

        /// Adds a user, replacing any user with the same id
        pub async fn add_user(&self, user: User) -> Result<(), PortError> {
            user.validate().map_err(|e| PortError::validation(e.to_string()))?;

            let mut users = self.users.write().await;
            match users.iter_mut().find(|u| u.id == user.id) {
                Some(existing) => *existing = user,
                None => users.push(user),
            }
            Ok(())
        }

        /// Removes a user so later lookups report not-found
        pub async fn remove_user(&self, id: UserId) -> bool {
            let mut users = self.users.write().await;
            let before = users.len();
            users.retain(|u| u.id != id);
            users.len() != before
        }

        /// Makes every lookup of `id` fail with an internal error carrying `message`
        pub async fn fail_lookups_for(&self, id: UserId, message: impl Into<String>) {
            self.failures.write().await.insert(id, message.into());
        }
    }

    impl DomainPort for InMemoryUserDirectory {}

    #[async_trait]
    impl HealthCheckable for InMemoryUserDirectory {
        async fn health_check(&self) -> HealthCheckResult {
            let mut result = HealthCheckResult::healthy("in-memory-user-directory", 0);
            result.message = Some("Mock adapter always healthy".to_string());
            result
        }
    }

    #[async_trait]
    impl UserDirectory for InMemoryUserDirectory {
        async fn get_active_users(
            &self,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<User>, PortError> {
            Ok(self
                .users
                .read()
                .await
                .iter()
                .filter(|u| u.is_active)
                .cloned()
                .collect())
        }

        async fn resolve_user(
            &self,
            id: UserId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<User, PortError> {
            if let Some(message) = self.failures.read().await.get(&id) {
                return Err(PortError::internal(message.clone()));
            }

            self.users
                .read()
                .await
                .iter()
                .find(|u| u.id == id)
                .cloned()
                .ok_or_else(|| PortError::not_found("User", id))
        }
    }
}
