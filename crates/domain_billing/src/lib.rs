//! Billing Domain - Household Bill Splitting
//!
//! This crate records utility bills shared by a household, splits each bill
//! across members in proportion to how many days they used the service, and
//! keeps the per-member payment list in step with the edits callers submit.
//!
//! # Concepts
//!
//! - **Bill**: a dated bill of one type with a positive total
//! - **Payment**: one member's usage, share and payment status on a bill
//! - **Allocation**: splitting the total by usage so the shares sum exactly
//! - **Reconciliation**: making the payment list match a submitted edit list
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{Bill, BillFields, PaymentAllocator, PaymentEdit};
//!
//! let roster = directory.get_active_users(None).await?;
//! let mut bill = Bill::create_with_active_users(
//!     BillFields::new("01-01-20", "water", dec!(100)),
//!     &roster,
//!     31,
//! )?;
//!
//! bill.apply_edits(&[PaymentEdit::for_user(alice).usage(10)], &directory).await?;
//! bill.allocate_payments(&PaymentAllocator::new());
//! ```

pub mod allocation;
pub mod bill;
pub mod config;
pub mod error;
pub mod payment;
pub mod ports;
pub mod reconcile;
pub mod reference;
pub mod services;
pub mod validation;

pub use allocation::{allocate, PaymentAllocator, DEFAULT_AMOUNT_SCALE};
pub use bill::{Bill, BillFields, BillSnapshot, BillType};
pub use config::BillingConfig;
pub use error::BillingError;
pub use payment::{BillPayment, PaymentEdit, PaymentSet, PaymentStatus};
pub use ports::BillStore;
pub use reconcile::{PaymentReconciler, ReconcileOutcome};
pub use reference::generate_reference;
pub use services::BillService;
pub use validation::{validate_amount, validate_date, validate_type, validate_usage, MAX_USAGE_DAYS};

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::InMemoryBillStore;
