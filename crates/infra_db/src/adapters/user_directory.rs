//! PostgreSQL User Directory Adapter
//!
//! Reads household members from the `users` table.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    DomainPort, HealthCheckResult, HealthCheckable, OperationMetadata, PortError, UserId,
};
use domain_household::{User, UserDirectory};

use crate::error::DatabaseError;
use crate::repositories::users::{UserRepository, UserRow};

/// PostgreSQL-backed implementation of the UserDirectory trait
#[derive(Debug, Clone)]
pub struct PostgresUserDirectory {
    repository: UserRepository,
    pool: PgPool,
}

impl PostgresUserDirectory {
    /// Creates a new PostgreSQL user directory
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: UserRepository::new(pool.clone()),
            pool,
        }
    }

    /// Adds or updates a member
    pub async fn register(&self, user: &User) -> Result<(), PortError> {
        user.validate().map_err(|e| PortError::validation(e.to_string()))?;
        self.repository.upsert(&user_to_row(user)).await?;
        Ok(())
    }
}

impl DomainPort for PostgresUserDirectory {}

#[async_trait]
impl HealthCheckable for PostgresUserDirectory {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, "postgres-user-directory").await
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    #[instrument(skip(self, _metadata))]
    async fn get_active_users(
        &self,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<User>, PortError> {
        let rows = self.repository.find_active().await?;
        debug!(count = rows.len(), "Loaded active users");
        Ok(rows.into_iter().map(row_to_user).collect())
    }

    #[instrument(skip(self, _metadata), fields(user_id = %id))]
    async fn resolve_user(
        &self,
        id: UserId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<User, PortError> {
        self.repository
            .find_by_id(*id.as_uuid())
            .await?
            .map(row_to_user)
            .ok_or_else(|| DatabaseError::not_found("User", id).into())
    }
}

pub(crate) fn row_to_user(row: UserRow) -> User {
    User {
        id: UserId::from_uuid(row.user_id),
        display_name: row.display_name,
        email: row.email,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub(crate) fn user_to_row(user: &User) -> UserRow {
    UserRow {
        user_id: *user.id.as_uuid(),
        display_name: user.display_name.clone(),
        email: user.email.clone(),
        is_active: user.is_active,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_row_round_trip() {
        let mut user = User::new("Alice").with_email("alice@example.com");
        user.deactivate();

        let back = row_to_user(user_to_row(&user));
        assert_eq!(back, user);
    }
}
