//! Lag prediction estimate (SP 800-90B §6.3.8).
//!
//! Subpredictors guess the symbol seen `lag` positions back, for lags 1
//! through 128; the scoreboard follows the lag with the most hits so far.

use super::predictor::PredictionTally;
use super::{EstimatorKind, EstimatorResult};
use crate::sequence::TranslatedSeq;

const MAX_LAG: usize = 128;

pub fn estimate(seq: &TranslatedSeq) -> EstimatorResult {
    let data = &seq.data;
    let l = data.len();
    if l < 2 {
        return EstimatorResult::incomplete(EstimatorKind::Lag);
    }

    let mut scores = [0u64; MAX_LAG];
    let mut winner = 0usize; // index = lag − 1
    let mut tally = PredictionTally::new();

    for i in 1..l {
        let prediction = if i > winner { Some(data[i - winner - 1]) } else { None };
        tally.record(prediction == Some(data[i]));
        for lag in 1..=MAX_LAG.min(i) {
            if data[i - lag] == data[i] {
                scores[lag - 1] += 1;
                // Ties promote toward the larger lag.
                if scores[lag - 1] >= scores[winner] {
                    winner = lag - 1;
                }
            }
        }
    }

    tally.finish(EstimatorKind::Lag, seq.k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::Prng;

    #[test]
    fn alternating_bits_are_fully_predicted() {
        // Period 2: lag 2 hits every time once it takes the scoreboard.
        let raw: Vec<u32> = (0..50_000).map(|i| i % 2).collect();
        let seq = TranslatedSeq::translate(&raw).unwrap();
        let r = estimate(&seq);
        assert!(r.completed);
        assert!(r.statistic > 0.99, "hit rate = {}", r.statistic);
        assert_eq!(r.entropy, 0.0);
    }

    #[test]
    fn long_period_is_caught() {
        let raw: Vec<u32> = (0..60_000).map(|i| (i % 97) as u32).collect();
        let seq = TranslatedSeq::translate(&raw).unwrap();
        let r = estimate(&seq);
        assert!(r.statistic > 0.99, "hit rate = {}", r.statistic);
        assert!(r.entropy < 0.01, "entropy = {}", r.entropy);
    }

    #[test]
    fn uniform_bits_stay_near_one_bit() {
        let mut rng = Prng::from_seed(91);
        let raw: Vec<u32> = (0..100_000).map(|_| rng.uniform_range(2)).collect();
        let seq = TranslatedSeq::translate(&raw).unwrap();
        let r = estimate(&seq);
        assert!((r.statistic - 0.5).abs() < 0.02, "hit rate = {}", r.statistic);
        assert!(r.entropy > 0.9 && r.entropy <= 1.0, "entropy = {}", r.entropy);
    }

    #[test]
    fn length_one_is_incomplete() {
        let seq = TranslatedSeq::translate(&[3]).unwrap();
        assert!(!estimate(&seq).completed);
    }
}
