//! Tracing setup for the host binary.
//!
//! Library code only emits events; installing a subscriber is the binary's job.
//! Filter with `RUST_LOG`, e.g. `RUST_LOG=raid_insurance::insurance=debug` to see
//! every retention roll.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "raid_insurance=info";

/// Install a stderr fmt subscriber. Safe to call more than once.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // stdout carries the mail JSON, so logs go to stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
