//! Floating point comparisons built on the `approx` crate. Rates and flows are products and
//! quotients of configured values, so tests and consistency checks compare them with a
//! tolerance rather than exactly.

use approx::{AbsDiffEq, RelativeEq};

/// Default absolute accuracy for comparisons of rates and flows.
pub const ACC: f64 = 1e-10;

/// Compares two floats via `approx::abs_diff_eq` using a maximum absolute difference of `acc`.
#[must_use]
pub fn almost_eq(a: f64, b: f64, acc: f64) -> bool {
    if a.is_infinite() && b.is_infinite() {
        return a == b;
    }
    a.abs_diff_eq(&b, acc)
}

/// Compares two floats via `approx::relative_eq` using a maximum relative difference of
/// `max_relative`. Values within `ACC` of each other are always equal, so zero compares equal to
/// a tiny residue.
#[must_use]
pub fn relative_almost_eq(a: f64, b: f64, max_relative: f64) -> bool {
    a.relative_eq(&b, ACC, max_relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_almost_eq, assert_relative_almost_eq};

    #[test]
    fn almost_eq_within_tolerance() {
        assert!(almost_eq(1.0, 1.0 + 0.5e-10, ACC));
        assert!(!almost_eq(1.0, 1.0 + 2e-10, ACC));
    }

    #[test]
    fn almost_eq_infinities() {
        assert!(almost_eq(f64::INFINITY, f64::INFINITY, ACC));
        assert!(!almost_eq(f64::INFINITY, f64::NEG_INFINITY, ACC));
    }

    #[test]
    fn relative_scales_with_magnitude() {
        assert!(relative_almost_eq(0.048_263_187, 0.048_263_190, 1e-6));
        assert!(!relative_almost_eq(0.048_263_187, 0.048_264_187, 1e-6));
        assert!(relative_almost_eq(1.0e6, 1.0e6 + 0.5, 1e-6));
        assert!(relative_almost_eq(0.0, 1e-12, 1e-6));
    }

    #[test]
    fn assert_macros_pass() {
        assert_almost_eq!(3.14159265, 3.14159264, 1e-7);
        assert_relative_almost_eq!(2.0e-5, 2.000_001e-5, 1e-6);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn assert_almost_eq_macro_panics() {
        assert_almost_eq!(1.0, 1.001, 1e-4);
    }
}
