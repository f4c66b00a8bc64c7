/// Asserts that two floats differ by less than `$prec`.
#[macro_export]
macro_rules! assert_almost_eq {
    ($a:expr, $b:expr, $prec:expr $(,)?) => {
        if !$crate::numeric::almost_eq($a, $b, $prec) {
            panic!(
                "assertion failed: `abs(left - right) < {:e}`, (left: `{}`, right: `{}`)",
                $prec, $a, $b
            );
        }
    };
}
pub use assert_almost_eq;

/// Like `assert_almost_eq!`, but `$prec` bounds the difference relative to the larger magnitude.
#[macro_export]
macro_rules! assert_relative_almost_eq {
    ($a:expr, $b:expr, $prec:expr $(,)?) => {
        if !$crate::numeric::relative_almost_eq($a, $b, $prec) {
            panic!(
                "assertion failed: `abs(left - right) / max(|left|, |right|) < {:e}`, (left: `{}`, right: `{}`)",
                $prec, $a, $b
            );
        }
    };
}
pub use assert_relative_almost_eq;
