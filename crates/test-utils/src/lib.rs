//! Shared test utilities for the climate index workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Catalog, region and result fixtures
//! - A scripted in-memory [`FakeComputeService`]
//! - Helpers for inspecting encoded expression graphs
//!
//! # Usage
//!
//! Add to a crate's `Cargo.toml` and use it from `tests/` integration files:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! ```ignore
//! use test_utils::{fixtures, FakeComputeService, YearScript};
//! ```

pub mod fake;
pub mod fixtures;
pub mod graph;

pub use fake::{CallKind, FakeComputeService, RecordedCall, YearScript};
pub use fixtures::*;
pub use graph::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}
