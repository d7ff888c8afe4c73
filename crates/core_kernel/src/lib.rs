//! Core Kernel - Foundational types shared by the household billing crates
//!
//! This crate provides the building blocks used across all domain modules:
//! - Strongly-typed identifiers for bills and users
//! - Port plumbing (errors, health checks, operation metadata) for adapters

pub mod identifiers;
pub mod ports;

pub use identifiers::{BillId, UserId};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
    OperationMetadata,
};
