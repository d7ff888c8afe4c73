//! Pre-built Test Fixtures
//!
//! Provides ready-to-use users, bill fields and adapters. The values are
//! fixed so that expected shares can be written as literals.

use std::sync::Arc;

use rust_decimal_macros::dec;

use domain_billing::{BillFields, BillService, BillingConfig, InMemoryBillStore};
use domain_household::{InMemoryUserDirectory, User};

/// Fixture for household members
pub struct UserFixtures;

impl UserFixtures {
    pub fn alice() -> User {
        User::new("Alice").with_email("alice@example.com")
    }

    pub fn bob() -> User {
        User::new("Bob").with_email("bob@example.com")
    }

    pub fn carol() -> User {
        User::new("Carol")
    }

    /// A member who has moved out
    pub fn former_member() -> User {
        let mut user = User::new("Dave");
        user.deactivate();
        user
    }

    /// Three active members
    pub fn household() -> Vec<User> {
        vec![Self::alice(), Self::bob(), Self::carol()]
    }
}

/// Fixture for bill input
pub struct BillFixtures;

impl BillFixtures {
    /// Water bill for 100.00
    pub fn water_bill_fields() -> BillFields {
        BillFields::new("01-01-20", "water", dec!(100))
    }

    /// Power bill for 90.00
    pub fn power_bill_fields() -> BillFields {
        BillFields::new("15-02-20", "power", dec!(90))
    }

    /// Internet bill whose total does not split evenly in three
    pub fn internet_bill_fields() -> BillFields {
        BillFields::new("28-02-20", "internet", dec!(59.99))
    }
}

/// In-memory adapters wired into a service
pub struct ServiceFixture {
    pub store: Arc<InMemoryBillStore>,
    pub directory: Arc<InMemoryUserDirectory>,
    pub service: BillService,
}

impl ServiceFixture {
    /// Service over the given members with default configuration
    pub async fn with_users(users: Vec<User>) -> Self {
        Self::with_config(users, BillingConfig::default()).await
    }

    /// Service over the given members with explicit configuration
    pub async fn with_config(users: Vec<User>, config: BillingConfig) -> Self {
        let store = Arc::new(InMemoryBillStore::new());
        let directory = Arc::new(InMemoryUserDirectory::with_users(users).await);
        let service = BillService::with_config(store.clone(), directory.clone(), config);
        Self {
            store,
            directory,
            service,
        }
    }
}
