//! Lambda-Chase command-line driver.
//!
//! The `lmc` binary fronts the whole stack: the loader in `lmc_asm`, the
//! machine in `lmc_vm`, and the game harness in `lmc_world`. Command
//! implementations live in [`commands`]; `main.rs` only parses arguments.

use std::sync::Once;

pub mod commands;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=lmc_vm=debug` or `RUST_LOG=lmc_world=debug`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
