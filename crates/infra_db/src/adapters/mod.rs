//! Port adapters backed by PostgreSQL

pub mod bill_store;
pub mod user_directory;

pub use bill_store::PostgresBillStore;
pub use user_directory::PostgresUserDirectory;

use std::time::Instant;

use sqlx::PgPool;

use core_kernel::HealthCheckResult;

/// Runs `SELECT 1` and reports the round-trip as a health result
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = Instant::now();

    let result = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await;

    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthCheckResult::healthy(adapter_id, latency_ms),
        Err(e) => HealthCheckResult::unhealthy(adapter_id, latency_ms, format!("Database error: {}", e)),
    }
}
