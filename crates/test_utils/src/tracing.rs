//! Test log output
//!
//! Set `RUST_LOG=debug` to see domain logs while running tests.

use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

static TRACING: Lazy<()> = Lazy::new(|| {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
});

/// Installs the fmt subscriber once per test binary
pub fn init_test_tracing() {
    Lazy::force(&TRACING);
}
