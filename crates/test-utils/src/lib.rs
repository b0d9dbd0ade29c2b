//! Shared test utilities for the culvert precipitation workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Zarr archive, archive file listing and cell index fixtures
//! - Canned provider payloads (Frost, Locationforecast, NVE, PipeLife)
//! - A local HTTP stub server standing in for provider APIs
//! - Approximate float assertions
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod payloads;
pub mod stub;

pub use fixtures::*;
pub use generators::*;
pub use stub::spawn_stub;

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

/// Element-wise [`assert_approx_eq!`] over two slices of equal length.
#[macro_export]
macro_rules! assert_series_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left = &$left;
        let right = &$right;
        assert_eq!(left.len(), right.len(), "series lengths differ");
        for (l, r) in left.iter().zip(right.iter()) {
            $crate::assert_approx_eq!(*l, *r, $epsilon);
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    fn test_assert_series_approx_eq_passes() {
        assert_series_approx_eq!(vec![1.0001, 2.0], vec![1.0, 2.0001], 0.001);
    }
}
