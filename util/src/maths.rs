//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Limit a value to the range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    value.max(min).min(max)
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// The return value `r` satisfies `0.0 <= r < rhs.abs()` in most cases. Due to floating point
/// round-off it can give `r == rhs.abs()` when `lhs` is negative and much smaller than `rhs` in
/// magnitude, callers that index with the result must handle that case.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-5.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);
    }

    #[test]
    fn test_rem_euclid() {
        assert_eq!(rem_euclid(7.0, 5.0), 2.0);
        assert_eq!(rem_euclid(-1.0, 5.0), 4.0);
        assert_eq!(rem_euclid(10.0, 5.0), 0.0);
        assert_eq!(rem_euclid(0.0, 5.0), 0.0);
    }
}
