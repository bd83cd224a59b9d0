//! Core definitions (errors and result helpers), relied upon by all meshstat-* crates.

pub mod error;
pub mod result;

pub use result::Result;
