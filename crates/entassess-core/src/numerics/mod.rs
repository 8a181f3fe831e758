//! Numerics kernel: compensated summation, float comparison, and the special
//! functions every estimator bound goes through.

pub mod compare;
pub mod fsum;
pub mod special;

pub use compare::{close_enough, rel_epsilon_equal};
pub use fsum::AdaptiveSum;
pub use special::{
    binomial, binomial_cdf, choose2, gcd, igam, igamc, incbeta, lgamma, ndtr, ndtri,
};
