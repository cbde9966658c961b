//! # snaptidy
//!
//! Consolidates scattered photo collections into one tidy tree.
//!
//! ## Core Philosophy
//! - **Everything is undoable** - with logging on, nothing is ever deleted
//!   and every change is recorded in a transaction log
//! - **Preview first** - a dry run shows the full plan and touches nothing
//! - **One failure is not fatal** - per-file problems are reported and the
//!   batch keeps going
//!
//! ## Architecture
//! The library is split into a core engine (front-end agnostic) and presentation layers:
//! - `core` - Scanning, fingerprinting, clustering, planning, execution, recovery
//! - `events` - Event-driven progress reporting
//! - `error` - Error types
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{Result, SnapTidyError};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. `RUST_LOG`
/// overrides the default level, which is `debug` when `verbose` is set and
/// `info` otherwise. Output goes to stderr. A subscriber that is already
/// installed is left in place.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    if let Err(e) = result {
        eprintln!("tracing already initialised: {}", e);
    }
}
