//! Infrastructure Database Layer
//!
//! This crate provides the PostgreSQL infrastructure for household bills,
//! implementing the `BillStore` and `UserDirectory` ports using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: repositories own the SQL and
//! row types, adapters translate rows into domain types and implement the
//! domain ports.
//!
//! # Schema
//!
//! - `users`: household members
//! - `bills`: one row per bill
//! - `bill_payments`: one row per member per bill, ordered by `position`
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{DatabaseConfig, create_pool, run_migrations, PostgresBillStore};
//!
//! let pool = create_pool(DatabaseConfig::from_env()?).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresBillStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, create_pool_from_url, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use adapters::{PostgresBillStore, PostgresUserDirectory};
