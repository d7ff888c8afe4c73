//! Repository implementations for the household bills schema
//!
//! Repositories own SQL and row types. They return raw rows and leave
//! conversion into domain types to the adapters.

pub mod bills;
pub mod users;

pub use bills::{BillRepository, BillRow, BillPaymentRow};
pub use users::{UserRepository, UserRow};
