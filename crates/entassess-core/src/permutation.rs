//! IID permutation-testing battery (SP 800-90B §5.1).
//!
//! Nineteen permutation-invariant statistics (nine scalars plus periodicity
//! and covariance at five lags each) are computed over the reference
//! sequence and over shuffled copies; each statistic counts how often a
//! shuffle exceeds, ties, or falls below the reference. Workers pull round
//! indices from a shared counter; statistics that have already passed are
//! skipped and the run stops early once every group passes.

use std::io::Write;
use std::sync::Mutex;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use serde::{Deserialize, Serialize};

use crate::prng::{Prng, sub_seed};
use crate::sequence::TranslatedSeq;

/// Shuffle rounds for a full battery.
pub const PERM_ROUNDS: usize = 10_000;

/// Number of tracked statistics.
pub const STAT_COUNT: usize = 19;

/// Lags for the periodicity and covariance statistics.
pub const LAGS: [usize; 5] = [1, 2, 8, 16, 32];

pub const STAT_NAMES: [&str; STAT_COUNT] = [
    "excursion",
    "directional runs",
    "longest directional run",
    "increases and decreases",
    "median runs",
    "longest median run",
    "mean collision distance",
    "max collision distance",
    "periodicity lag 1",
    "periodicity lag 2",
    "periodicity lag 8",
    "periodicity lag 16",
    "periodicity lag 32",
    "covariance lag 1",
    "covariance lag 2",
    "covariance lag 8",
    "covariance lag 16",
    "covariance lag 32",
    "compressed size",
];

/// Per-statistic tallies across shuffles: greater / equal / less than the
/// reference value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StatCounter {
    pub greater: u64,
    pub equal: u64,
    pub less: u64,
}

impl StatCounter {
    /// NIST two-sided criterion at the given tail cutoff.
    pub fn passed(&self, cutoff: u64) -> bool {
        self.greater + self.equal > cutoff && self.equal + self.less > cutoff
    }
}

/// Full battery outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermutationOutcome {
    pub counters: [StatCounter; STAT_COUNT],
    pub reference: [f64; STAT_COUNT],
    /// Shuffles actually evaluated.
    pub rounds_evaluated: usize,
    /// Round at which every statistic group had passed, if the run
    /// short-circuited.
    pub completing_round: Option<usize>,
    /// The IID verdict: every statistic passed.
    pub passed: bool,
}

/// Tail cutoff derived from the significance level; `alpha = 0.001` over
/// 10,000 rounds gives the NIST `> 5` criterion.
pub fn tail_cutoff(alpha: f64, rounds: usize) -> u64 {
    (alpha * rounds as f64 / 2.0).floor() as u64
}

/// Run the battery over one translated sequence.
///
/// `threads` workers pull shuffle indices from a shared counter; each round
/// is shuffled by a PRNG seeded from `master_seed` and the round index, so
/// the statistics of round `r` do not depend on which worker ran it.
/// `exhaustive` disables both per-statistic skipping and early termination.
pub fn permutation_test(
    seq: &TranslatedSeq,
    rounds: usize,
    alpha: f64,
    threads: usize,
    exhaustive: bool,
    master_seed: u64,
) -> PermutationOutcome {
    let cutoff = tail_cutoff(alpha, rounds);
    let mean = seq.data.iter().map(|&s| s as f64).sum::<f64>() / seq.len().max(1) as f64;

    let all_needed = [true; STAT_COUNT];
    let mut reference = [0.0; STAT_COUNT];
    compute_statistics(&seq.data, seq.k, mean, seq.median, &all_needed, &mut reference);

    struct Shared {
        next_round: usize,
        counters: [StatCounter; STAT_COUNT],
        passed: [bool; STAT_COUNT],
        rounds_evaluated: usize,
        completing_round: Option<usize>,
        done: bool,
    }
    let shared = Mutex::new(Shared {
        next_round: 0,
        counters: [StatCounter::default(); STAT_COUNT],
        passed: [false; STAT_COUNT],
        rounds_evaluated: 0,
        completing_round: None,
        done: false,
    });

    let worker = |_worker_id: usize| {
        let mut scratch = seq.data.clone();
        let mut stats = [0.0; STAT_COUNT];
        loop {
            let (round, needed) = {
                let mut guard = shared.lock().unwrap_or_else(|e| e.into_inner());
                if guard.done || guard.next_round >= rounds {
                    return;
                }
                let round = guard.next_round;
                guard.next_round += 1;
                let needed = if exhaustive {
                    all_needed
                } else {
                    let mut needed = [false; STAT_COUNT];
                    for (n, &p) in needed.iter_mut().zip(&guard.passed) {
                        *n = !p;
                    }
                    needed
                };
                (round, needed)
            };

            scratch.copy_from_slice(&seq.data);
            Prng::from_seed(sub_seed(master_seed, round as u64, 0)).shuffle(&mut scratch);
            compute_statistics(&scratch, seq.k, mean, seq.median, &needed, &mut stats);

            let mut guard = shared.lock().unwrap_or_else(|e| e.into_inner());
            guard.rounds_evaluated += 1;
            for i in 0..STAT_COUNT {
                if !needed[i] {
                    continue;
                }
                let c = &mut guard.counters[i];
                match stats[i].total_cmp(&reference[i]) {
                    std::cmp::Ordering::Greater => c.greater += 1,
                    std::cmp::Ordering::Equal => c.equal += 1,
                    std::cmp::Ordering::Less => c.less += 1,
                }
                if !exhaustive && guard.counters[i].passed(cutoff) {
                    guard.passed[i] = true;
                }
            }
            if !exhaustive && guard.passed.iter().all(|&p| p) && guard.completing_round.is_none()
            {
                log::debug!("permutation: all statistic groups passed at round {round}");
                guard.completing_round = Some(round);
                guard.done = true;
            }
        }
    };

    let workers = threads.max(1).min(rounds.max(1));
    if workers == 1 {
        worker(0);
    } else {
        let worker = &worker;
        std::thread::scope(|scope| {
            for id in 0..workers {
                scope.spawn(move || worker(id));
            }
        });
    }

    let shared = shared.into_inner().unwrap_or_else(|e| e.into_inner());
    let passed = shared.counters.iter().all(|c| c.passed(cutoff));
    PermutationOutcome {
        counters: shared.counters,
        reference,
        rounds_evaluated: shared.rounds_evaluated,
        completing_round: shared.completing_round,
        passed,
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Fill `out[i]` for every statistic with `needed[i]`.
///
/// Binary data runs the directional and periodicity statistics over
/// conversion I (per-byte popcount) and the collision and covariance
/// statistics over conversion II (packed bytes); everything else sees the
/// translated sequence directly.
fn compute_statistics(
    data: &[u32],
    k: usize,
    mean: f64,
    median: f64,
    needed: &[bool; STAT_COUNT],
    out: &mut [f64; STAT_COUNT],
) {
    let binary = k == 2;
    let conv1;
    let conv2;
    let (dir_view, coll_view, coll_domain) = if binary {
        conv1 = popcount_bytes(data);
        conv2 = pack_bytes(data);
        (&conv1[..], &conv2[..], 256)
    } else {
        conv1 = Vec::new();
        conv2 = Vec::new();
        (data, data, k)
    };

    if needed[0] {
        out[0] = excursion(data, mean);
    }
    if needed[1] || needed[2] || needed[3] {
        let (runs, longest, changes) = directional_runs(dir_view);
        out[1] = runs;
        out[2] = longest;
        out[3] = changes;
    }
    if needed[4] || needed[5] {
        let (runs, longest) = median_runs(data, median);
        out[4] = runs;
        out[5] = longest;
    }
    if needed[6] || needed[7] {
        let (mean_dist, max_dist) = collision_distances(coll_view, coll_domain);
        out[6] = mean_dist;
        out[7] = max_dist;
    }
    for (slot, &lag) in LAGS.iter().enumerate() {
        if needed[8 + slot] {
            out[8 + slot] = periodicity(dir_view, lag);
        }
        if needed[13 + slot] {
            out[13 + slot] = covariance(coll_view, lag);
        }
    }
    if needed[18] {
        out[18] = compressed_size(data);
    }
}

/// Conversion I: popcount of each 8-symbol chunk of a binary sequence.
fn popcount_bytes(bits: &[u32]) -> Vec<u32> {
    bits.chunks_exact(8)
        .map(|c| c.iter().sum::<u32>())
        .collect()
}

/// Conversion II: each 8-symbol chunk packed into a byte, MSB first.
fn pack_bytes(bits: &[u32]) -> Vec<u32> {
    bits.chunks_exact(8)
        .map(|c| c.iter().fold(0u32, |acc, &b| acc << 1 | b))
        .collect()
}

/// Statistic 1: maximum deviation of the running sum from the mean line.
fn excursion(data: &[u32], mean: f64) -> f64 {
    let mut sum = 0.0f64;
    let mut max = 0.0f64;
    for &x in data {
        sum += x as f64 - mean;
        max = max.max(sum.abs());
    }
    max
}

/// Statistics 2–4 over the signs of first differences: number of runs,
/// longest run, and the larger of the increase and decrease counts.
fn directional_runs(data: &[u32]) -> (f64, f64, f64) {
    if data.len() < 2 {
        return (0.0, 0.0, 0.0);
    }
    let mut runs = 1u64;
    let mut longest = 1u64;
    let mut current = 0u64;
    let mut increases = 0u64;
    let mut prev_up = None;
    for w in data.windows(2) {
        let up = w[0] < w[1];
        if up {
            increases += 1;
        }
        match prev_up {
            Some(p) if p == up => current += 1,
            Some(_) => {
                runs += 1;
                current = 1;
            }
            None => current = 1,
        }
        prev_up = Some(up);
        longest = longest.max(current);
    }
    let decreases = data.len() as u64 - 1 - increases;
    (runs as f64, longest as f64, increases.max(decreases) as f64)
}

/// Statistics 5–6: runs of symbols at or above the median.
fn median_runs(data: &[u32], median: f64) -> (f64, f64) {
    if data.is_empty() {
        return (0.0, 0.0);
    }
    let mut runs = 1u64;
    let mut longest = 1u64;
    let mut current = 1u64;
    let mut prev = data[0] as f64 >= median;
    for &x in &data[1..] {
        let above = x as f64 >= median;
        if above == prev {
            current += 1;
        } else {
            runs += 1;
            current = 1;
            prev = above;
        }
        longest = longest.max(current);
    }
    (runs as f64, longest as f64)
}

/// Statistics 7–8: distances until a value re-occurs, restarting after each
/// collision.
fn collision_distances(data: &[u32], domain: usize) -> (f64, f64) {
    let mut seen = vec![0u32; domain];
    let mut epoch = 0u32;
    let mut count = 0u64;
    let mut sum = 0u64;
    let mut max = 0u64;
    let mut i = 0usize;
    while i < data.len() {
        epoch += 1;
        let mut j = i;
        let mut collided = false;
        while j < data.len() {
            let v = data[j] as usize;
            if seen[v] == epoch {
                let dist = (j - i + 1) as u64;
                sum += dist;
                max = max.max(dist);
                count += 1;
                collided = true;
                break;
            }
            seen[v] = epoch;
            j += 1;
        }
        if !collided {
            break;
        }
        i = j + 1;
    }
    if count == 0 {
        (0.0, 0.0)
    } else {
        (sum as f64 / count as f64, max as f64)
    }
}

/// Statistic 9: positions matching themselves `lag` steps later.
fn periodicity(data: &[u32], lag: usize) -> f64 {
    if data.len() <= lag {
        return 0.0;
    }
    data.windows(lag + 1)
        .filter(|w| w[0] == w[lag])
        .count() as f64
}

/// Statistic 10: lagged self-product sum.
fn covariance(data: &[u32], lag: usize) -> f64 {
    if data.len() <= lag {
        return 0.0;
    }
    data.iter()
        .zip(&data[lag..])
        .map(|(&a, &b)| a as f64 * b as f64)
        .sum()
}

/// Statistic 11: zlib-compressed size of the decimal rendering.
fn compressed_size(data: &[u32]) -> f64 {
    use std::fmt::Write as _;
    let mut text = String::with_capacity(data.len() * 3);
    for (i, v) in data.iter().enumerate() {
        if i > 0 {
            text.push(' ');
        }
        let _ = write!(text, "{v}");
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    if encoder.write_all(text.as_bytes()).is_err() {
        log::warn!("permutation: compression statistic failed to encode");
        return 0.0;
    }
    match encoder.finish() {
        Ok(bytes) => bytes.len() as f64,
        Err(e) => {
            log::warn!("permutation: compression statistic failed: {e}");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::Prng;

    fn bits(n: usize, seed: u64) -> TranslatedSeq {
        let mut rng = Prng::from_seed(seed);
        let raw: Vec<u32> = (0..n).map(|_| rng.uniform_range(2)).collect();
        TranslatedSeq::translate(&raw).unwrap()
    }

    #[test]
    fn cutoff_matches_nist_criterion() {
        assert_eq!(tail_cutoff(0.001, 10_000), 5);
        assert_eq!(tail_cutoff(0.001, 500), 0);
    }

    #[test]
    fn directional_runs_hand_checked() {
        // Differences: + + − + −  → runs ++ / − / + / −.
        let (runs, longest, changes) = directional_runs(&[1, 2, 3, 1, 4, 2]);
        assert_eq!(runs, 4.0);
        assert_eq!(longest, 2.0);
        assert_eq!(changes, 3.0); // 3 increases vs 2 decreases
    }

    #[test]
    fn median_runs_hand_checked() {
        let (runs, longest) = median_runs(&[0, 0, 1, 1, 1, 0], 0.5);
        assert_eq!(runs, 3.0);
        assert_eq!(longest, 3.0);
    }

    #[test]
    fn collision_distances_hand_checked() {
        // 1 2 1 | 3 3 | 4 5 → collisions at distance 3 and 2, tail open.
        let (mean, max) = collision_distances(&[1, 2, 1, 3, 3, 4, 5], 8);
        assert_eq!(mean, 2.5);
        assert_eq!(max, 3.0);
    }

    #[test]
    fn periodicity_and_covariance_hand_checked() {
        let data = [1u32, 0, 1, 0, 1, 0];
        assert_eq!(periodicity(&data, 2), 4.0);
        assert_eq!(periodicity(&data, 1), 0.0);
        assert_eq!(covariance(&data, 2), 2.0);
    }

    #[test]
    fn excursion_of_balanced_pattern() {
        let data = [0u32, 1, 0, 1];
        assert_eq!(excursion(&data, 0.5), 0.5);
    }

    #[test]
    fn constant_sequence_passes_on_ties() {
        let raw = vec![5u32; 4000];
        let seq = TranslatedSeq::translate(&raw).unwrap();
        let outcome = permutation_test(&seq, 200, 0.05, 1, true, 1234);
        assert!(outcome.passed);
        for (i, c) in outcome.counters.iter().enumerate() {
            assert_eq!(c.equal, 200, "{}", STAT_NAMES[i]);
            assert_eq!(c.greater + c.equal + c.less, 200);
        }
    }

    #[test]
    fn exhaustive_counters_total_rounds() {
        let seq = bits(2048, 121);
        let outcome = permutation_test(&seq, 100, 0.001, 2, true, 77);
        assert_eq!(outcome.rounds_evaluated, 100);
        for c in &outcome.counters {
            assert_eq!(c.greater + c.equal + c.less, 100);
        }
    }

    #[test]
    fn uniform_bits_mostly_pass() {
        // Each statistic has an alpha-sized false-fail chance by design, so
        // the assertion tolerates a stray extreme reference quantile.
        let seq = bits(4096, 122);
        let outcome = permutation_test(&seq, 300, 0.001, 4, false, 99);
        let cutoff = tail_cutoff(0.001, 300);
        let failed = outcome.counters.iter().filter(|c| !c.passed(cutoff)).count();
        assert!(failed <= 2, "failed = {failed}, counters = {:?}", outcome.counters);
    }

    #[test]
    fn short_circuit_stops_early_on_ties() {
        let raw = vec![3u32; 2000];
        let seq = TranslatedSeq::translate(&raw).unwrap();
        let outcome = permutation_test(&seq, 10_000, 0.001, 1, false, 7);
        assert!(outcome.passed);
        let round = outcome.completing_round.expect("all ties pass immediately");
        // Every statistic ties every round; the battery closes right after
        // the tail cutoff is cleared.
        assert_eq!(round as u64, tail_cutoff(0.001, 10_000));
        assert!(outcome.rounds_evaluated < 100);
    }

    #[test]
    fn alternating_bits_fail_periodicity() {
        let raw: Vec<u32> = (0..4096).map(|i| i % 2).collect();
        let seq = TranslatedSeq::translate(&raw).unwrap();
        let outcome = permutation_test(&seq, 200, 0.001, 1, true, 55);
        assert!(!outcome.passed);
        // Lag-2 periodicity of the reference is maximal; no shuffle reaches
        // it.
        let lag2 = &outcome.counters[9];
        assert_eq!(lag2.greater + lag2.equal, 0, "{lag2:?}");
    }

    #[test]
    fn deterministic_given_seed() {
        let seq = bits(1024, 123);
        let a = permutation_test(&seq, 50, 0.001, 1, true, 42);
        let b = permutation_test(&seq, 50, 0.001, 1, true, 42);
        for (x, y) in a.counters.iter().zip(&b.counters) {
            assert_eq!(x.greater, y.greater);
            assert_eq!(x.equal, y.equal);
            assert_eq!(x.less, y.less);
        }
    }
}
