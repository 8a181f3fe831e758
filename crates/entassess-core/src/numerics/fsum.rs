//! Exact compensated summation (Shewchuk partials).
//!
//! Keeps a list of non-overlapping partial sums so that the final reduction
//! loses at most one rounding step, independent of summation order. A shadow
//! Kahan accumulator runs alongside for diagnostic error reporting.
//!
//! Adding NaN or ±∞ is the caller's responsibility to avoid; the partials
//! invariants do not hold for non-finite values.

/// Adaptive-precision accumulator.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveSum {
    /// Non-overlapping partials, ordered by increasing magnitude.
    partials: Vec<f64>,
    /// Shadow Kahan sum.
    kahan_sum: f64,
    /// Kahan compensation term.
    kahan_c: f64,
    /// Number of values absorbed.
    count: u64,
}

impl AdaptiveSum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb one value.
    pub fn add(&mut self, x: f64) {
        // Kahan shadow.
        let y = x - self.kahan_c;
        let t = self.kahan_sum + y;
        self.kahan_c = (t - self.kahan_sum) - y;
        self.kahan_sum = t;
        self.count += 1;

        // Shewchuk partials: carry the high part forward, keep every
        // non-zero low part.
        let mut x = x;
        let mut i = 0;
        for j in 0..self.partials.len() {
            let mut y = self.partials[j];
            if x.abs() < y.abs() {
                std::mem::swap(&mut x, &mut y);
            }
            let hi = x + y;
            let lo = y - (hi - x);
            if lo != 0.0 {
                self.partials[i] = lo;
                i += 1;
            }
            x = hi;
        }
        self.partials.truncate(i);
        self.partials.push(x);
    }

    /// Absorb every partial of `other` scaled by `alpha`.
    ///
    /// The scaling multiplies partial by partial, so the error introduced is
    /// one rounding per partial rather than one per original addend.
    pub fn add_scaled(&mut self, other: &AdaptiveSum, alpha: f64) {
        let before = self.count;
        for &p in &other.partials {
            self.add(p * alpha);
        }
        self.count = before + other.count;
    }

    /// Number of values absorbed so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Correctly-rounded sum of everything absorbed.
    ///
    /// The final reduction sums partials from smallest to largest magnitude
    /// with the half-even rounding fix-up from CPython's `math.fsum`: when
    /// the exact result sits exactly between two doubles, the sign of the
    /// next-lower partial decides the direction.
    pub fn result(&self) -> f64 {
        let p = &self.partials;
        let mut n = p.len();
        if n == 0 {
            return 0.0;
        }
        let mut hi = p[n - 1];
        n -= 1;
        let mut lo = 0.0;
        while n > 0 {
            let x = hi;
            let y = p[n - 1];
            n -= 1;
            hi = x + y;
            let yr = hi - x;
            lo = y - yr;
            if lo != 0.0 {
                break;
            }
        }
        // Round-half-even fix-up across the remaining partials.
        if n > 0 && ((lo < 0.0 && p[n - 1] < 0.0) || (lo > 0.0 && p[n - 1] > 0.0)) {
            let y = lo * 2.0;
            let x = hi + y;
            let yr = x - hi;
            if y == yr {
                hi = x;
            }
        }
        hi
    }

    /// Shadow Kahan result, for diagnostics.
    pub fn kahan_result(&self) -> f64 {
        self.kahan_sum
    }

    /// Absolute disagreement between the exact and Kahan accumulators.
    pub fn error_estimate(&self) -> f64 {
        (self.result() - self.kahan_sum).abs()
    }
}
