//! Test utilities for the meshstat crates.
//!
//! - Data generation: data sets with named arrays, categorical arrays and
//!   composite trees
//! - Rank simulation: running a closure once per rank of an in-process group
//!
//! Intended for the test suites of the workspace only.

pub mod data_gen;
pub mod ranks;

pub use ranks::run_ranks;

/// Installs a test logger honoring `RUST_LOG`. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
