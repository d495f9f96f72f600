//! Shared test setup: opt-in console tracing.
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//!
//! #[test]
//! fn my_test() {
//!     common::init_tracing();
//!     // ... RUST_LOG=radixmap=trace shows mutation events when the
//!     // crate is built with `--features tracing`.
//! }
//! ```

#![allow(dead_code)]

use std::sync::Once;

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Ensures the subscriber is only installed once per test binary.
static INIT: Once = Once::new();

/// Install a console tracing subscriber driven by `RUST_LOG`.
///
/// Safe to call from every test; only the first call takes effect. Without
/// the crate's `tracing` feature the library emits nothing and this is a
/// no-op beyond the subscriber itself.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{}", Level::WARN)));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .try_init();
    });
}
