//! Household member entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::UserId;

use crate::error::HouseholdError;

/// A member of the household who can be billed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: UserId,
    /// Name shown on bills
    pub display_name: String,
    /// Contact email
    pub email: Option<String>,
    /// Whether the member currently shares the bills
    pub is_active: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new active member
    pub fn new(display_name: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            id: UserId::new_v7(),
            display_name: display_name.into(),
            email: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a member with a known identifier
    pub fn with_id(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            ..Self::new(display_name)
        }
    }

    /// Sets the contact email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Marks the member as moved out; they stop receiving new bills
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    /// Marks the member as active again
    pub fn activate(&mut self) {
        self.is_active = true;
        self.updated_at = Utc::now();
    }

    /// Checks the fields a directory must never store empty
    pub fn validate(&self) -> Result<(), HouseholdError> {
        if self.display_name.trim().is_empty() {
            return Err(HouseholdError::invalid("Display name is required"));
        }
        if let Some(ref email) = self.email {
            if !email.contains('@') {
                return Err(HouseholdError::invalid(format!("Invalid email format: {}", email)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_is_active() {
        let user = User::new("Alice");
        assert!(user.is_active);
        assert!(user.email.is_none());
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_with_id_keeps_id() {
        let id = UserId::new();
        let user = User::with_id(id, "Bob");
        assert_eq!(user.id, id);
        assert_eq!(user.display_name, "Bob");
    }

    #[test]
    fn test_deactivate_and_activate() {
        let mut user = User::new("Carol");
        user.deactivate();
        assert!(!user.is_active);
        user.activate();
        assert!(user.is_active);
    }

    #[test]
    fn test_validate() {
        assert!(User::new("Dan").with_email("dan@example.com").validate().is_ok());
        assert!(User::new("  ").validate().is_err());
        assert!(User::new("Eve").with_email("eve.example.com").validate().is_err());
    }
}
