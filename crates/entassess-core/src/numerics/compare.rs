//! Floating-point comparison.
//!
//! [`rel_epsilon_equal`] is the only approved equality test for floating
//! values in the engine; root finders terminate on it and estimators use it
//! wherever two computed doubles are checked for agreement.

/// Approximate equality under an absolute, a relative, and a ULP tolerance.
///
/// Returns true iff any of the following holds:
/// - exact equality (covers matching infinities);
/// - `|a − b| ≤ abs_eps` when either value is subnormal (or zero) or the
///   relative test would underflow;
/// - `|a − b| ≤ |b| · rel_eps`;
/// - `a` and `b` share a sign and are within `ulp_eps` ULPs.
///
/// NaN compares equal to nothing, including itself.
pub fn rel_epsilon_equal(a: f64, b: f64, abs_eps: f64, rel_eps: f64, ulp_eps: u64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    if a == b {
        return true;
    }
    if a.is_infinite() || b.is_infinite() {
        // Unequal infinities, or one infinite operand.
        return false;
    }

    let diff = (a - b).abs();
    let scale = b.abs();
    let subnormal_or_zero = |x: f64| x == 0.0 || x.abs() < f64::MIN_POSITIVE;
    if subnormal_or_zero(a) || subnormal_or_zero(b) || scale * rel_eps < f64::MIN_POSITIVE {
        if diff <= abs_eps {
            return true;
        }
    } else if diff <= scale * rel_eps {
        return true;
    }

    // ULP distance, only meaningful for same-signed finite values.
    if a.is_sign_positive() == b.is_sign_positive() {
        let ua = a.abs().to_bits();
        let ub = b.abs().to_bits();
        let dist = ua.abs_diff(ub);
        if dist <= ulp_eps {
            return true;
        }
    }
    false
}

/// Convenience wrapper with the engine's default tolerances: four ULPs and a
/// relative epsilon of four machine epsilons.
pub fn close_enough(a: f64, b: f64) -> bool {
    rel_epsilon_equal(a, b, f64::MIN_POSITIVE * 4.0, f64::EPSILON * 4.0, 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_equality() {
        assert!(rel_epsilon_equal(1.5, 1.5, 0.0, 0.0, 0));
        assert!(rel_epsilon_equal(
            f64::INFINITY,
            f64::INFINITY,
            0.0,
            0.0,
            0
        ));
    }

    #[test]
    fn nan_never_equal() {
        assert!(!rel_epsilon_equal(f64::NAN, f64::NAN, 1.0, 1.0, 100));
        assert!(!rel_epsilon_equal(f64::NAN, 0.0, 1.0, 1.0, 100));
    }

    #[test]
    fn opposite_infinities_differ() {
        assert!(!rel_epsilon_equal(
            f64::INFINITY,
            f64::NEG_INFINITY,
            1e300,
            1.0,
            u64::MAX
        ));
    }

    #[test]
    fn adjacent_doubles_within_one_ulp() {
        let a = 1.0f64;
        let b = f64::from_bits(a.to_bits() + 1);
        assert!(rel_epsilon_equal(a, b, 0.0, 0.0, 1));
        assert!(!rel_epsilon_equal(a, b, 0.0, 0.0, 0));
    }

    #[test]
    fn relative_tolerance() {
        assert!(rel_epsilon_equal(1000.0, 1000.0001, 0.0, 1e-6, 0));
        assert!(!rel_epsilon_equal(1000.0, 1001.0, 0.0, 1e-6, 0));
    }

    #[test]
    fn subnormal_uses_absolute() {
        let tiny = f64::MIN_POSITIVE / 4.0;
        assert!(rel_epsilon_equal(tiny, 0.0, f64::MIN_POSITIVE, 1e-9, 0));
    }

    #[test]
    fn opposite_signs_no_ulp_shortcut() {
        // -0.0 == 0.0 exactly, but small values across zero must not pass
        // through the ULP path.
        assert!(!rel_epsilon_equal(1e-300, -1e-300, 0.0, 1e-9, 1000));
    }
}
