//! Symbol sequences: translation, median, and bitstring expansion.
//!
//! Every estimator that indexes arrays by symbol consumes the translated
//! sequence, never raw input. Translation maps the distinct symbols of the
//! input onto `{0, …, k−1}` in ascending numeric order, so it is a bijection
//! and re-translating a translated sequence is the identity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A translated symbol sequence.
#[derive(Debug, Clone)]
pub struct TranslatedSeq {
    /// Symbols relabelled onto `0..k`.
    pub data: Vec<u32>,
    /// Alphabet cardinality after translation.
    pub k: usize,
    /// Rank → original symbol.
    pub symbol_map: Vec<u32>,
    /// Median of the translated data; exactly 0.5 when `k = 2`.
    pub median: f64,
}

impl TranslatedSeq {
    /// Translate a raw symbol buffer.
    ///
    /// Fails on empty input. A single-symbol alphabet translates fine
    /// (`k = 1`); the orchestrator is responsible for flagging it degenerate.
    pub fn translate(raw: &[u32]) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::InvalidInput("empty symbol sequence".to_string()));
        }
        let mut ranks: BTreeMap<u32, u32> = BTreeMap::new();
        for &s in raw {
            ranks.entry(s).or_insert(0);
        }
        let symbol_map: Vec<u32> = ranks.keys().copied().collect();
        for (rank, (_, v)) in ranks.iter_mut().enumerate() {
            *v = rank as u32;
        }
        let data: Vec<u32> = raw.iter().map(|s| ranks[s]).collect();
        let k = symbol_map.len();
        let median = Self::compute_median(&data, k);
        Ok(Self {
            data,
            k,
            symbol_map,
            median,
        })
    }

    fn compute_median(data: &[u32], k: usize) -> f64 {
        if k == 2 {
            return 0.5;
        }
        let mut counts = vec![0u64; k];
        for &s in data {
            counts[s as usize] += 1;
        }
        let n = data.len() as u64;
        let mut cum = 0u64;
        let mut lower = 0u32;
        let mut upper = 0u32;
        // Order statistics at ceil(n/2) and ceil((n+1)/2).
        let lo_target = n.div_ceil(2);
        let hi_target = (n + 1).div_ceil(2).max(n / 2 + 1);
        for (sym, &c) in counts.iter().enumerate() {
            let next = cum + c;
            if cum < lo_target && lo_target <= next {
                lower = sym as u32;
            }
            if cum < hi_target && hi_target <= next {
                upper = sym as u32;
            }
            cum = next;
        }
        if n % 2 == 0 {
            (lower as f64 + upper as f64) / 2.0
        } else {
            upper as f64
        }
    }

    /// Sequence length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Map a translated symbol back to its original value.
    pub fn untranslate(&self, rank: u32) -> u32 {
        self.symbol_map[rank as usize]
    }

    /// A view of a disjoint block, re-translated so the block's own alphabet
    /// is dense.
    pub fn block(&self, start: usize, len: usize) -> Result<TranslatedSeq> {
        let raw: Vec<u32> = self.data[start..start + len]
            .iter()
            .map(|&s| self.untranslate(s))
            .collect();
        Self::translate(&raw)
    }
}

// ---------------------------------------------------------------------------
// Bitstring expansion
// ---------------------------------------------------------------------------

/// A symbol buffer re-expanded into its varying bit positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bitstring {
    /// One 0/1 symbol per active bit per input symbol.
    pub bits: Vec<u32>,
    /// Mask of bit positions that vary over the input.
    pub active: u32,
    /// popcount(active).
    pub width: u32,
    /// The constant bits every symbol shares (inactive positions).
    pub base: u32,
    /// Bit order within a symbol.
    pub little_endian: bool,
}

impl Bitstring {
    /// Expand `raw` into a binary sequence over its active bit positions.
    pub fn expand(raw: &[u32], little_endian: bool) -> Self {
        let or = raw.iter().fold(0u32, |acc, &x| acc | x);
        let and = raw.iter().fold(u32::MAX, |acc, &x| acc & x);
        let active = or & !and;
        let base = and & !active;
        let width = active.count_ones();

        let positions = Self::positions(active, little_endian);
        let mut bits = Vec::with_capacity(raw.len() * width as usize);
        for &sym in raw {
            for &p in &positions {
                bits.push((sym >> p) & 1);
            }
        }
        Self {
            bits,
            active,
            width,
            base,
            little_endian,
        }
    }

    /// Contract back into symbols; exact inverse of [`Bitstring::expand`].
    pub fn contract(&self) -> Vec<u32> {
        if self.width == 0 {
            return Vec::new();
        }
        let positions = Self::positions(self.active, self.little_endian);
        self.bits
            .chunks_exact(self.width as usize)
            .map(|chunk| {
                let mut sym = self.base;
                for (&bit, &p) in chunk.iter().zip(&positions) {
                    sym |= bit << p;
                }
                sym
            })
            .collect()
    }

    fn positions(active: u32, little_endian: bool) -> Vec<u32> {
        let mut positions: Vec<u32> = (0..32).filter(|&p| active >> p & 1 == 1).collect();
        if !little_endian {
            positions.reverse();
        }
        positions
    }
}

// ---------------------------------------------------------------------------
// Serial XOR compression (s:1)
// ---------------------------------------------------------------------------

/// XOR-fold every `s` consecutive symbols into one. A trailing partial group
/// is dropped. `s = 1` is the identity.
pub fn serial_xor(raw: &[u32], s: usize) -> Vec<u32> {
    if s <= 1 {
        return raw.to_vec();
    }
    raw.chunks_exact(s)
        .map(|chunk| chunk.iter().fold(0u32, |acc, &x| acc ^ x))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_is_order_preserving_and_dense() {
        let raw = [40u32, 10, 30, 10, 40, 20];
        let t = TranslatedSeq::translate(&raw).unwrap();
        assert_eq!(t.k, 4);
        assert_eq!(t.data, vec![3, 0, 2, 0, 3, 1]);
        assert_eq!(t.symbol_map, vec![10, 20, 30, 40]);
    }

    #[test]
    fn translate_roundtrip() {
        let raw = [7u32, 700, 7, 42, 700];
        let t = TranslatedSeq::translate(&raw).unwrap();
        let back: Vec<u32> = t.data.iter().map(|&s| t.untranslate(s)).collect();
        assert_eq!(back, raw);
    }

    #[test]
    fn retranslating_translated_is_identity() {
        let raw = [3u32, 1, 4, 1, 5, 9, 2, 6];
        let t = TranslatedSeq::translate(&raw).unwrap();
        let tt = TranslatedSeq::translate(&t.data).unwrap();
        assert_eq!(t.data, tt.data);
        assert_eq!(tt.k, t.k);
    }

    #[test]
    fn empty_input_rejected() {
        assert!(TranslatedSeq::translate(&[]).is_err());
    }

    #[test]
    fn binary_median_is_half() {
        let t = TranslatedSeq::translate(&[0u32, 1, 1, 1, 1, 1]).unwrap();
        assert_eq!(t.median, 0.5);
    }

    #[test]
    fn odd_length_median() {
        let t = TranslatedSeq::translate(&[0u32, 10, 20, 30, 40]).unwrap();
        assert_eq!(t.median, 2.0);
    }

    #[test]
    fn even_length_median_averages() {
        let t = TranslatedSeq::translate(&[0u32, 10, 20, 30]).unwrap();
        assert_eq!(t.median, 1.5);
    }

    #[test]
    fn single_symbol_alphabet_translates() {
        let t = TranslatedSeq::translate(&[9u32; 5]).unwrap();
        assert_eq!(t.k, 1);
        assert!(t.data.iter().all(|&s| s == 0));
    }

    #[test]
    fn bitstring_active_bits() {
        // Bits 0 and 2 vary; bit 4 constant 1.
        let raw = [0b10001u32, 0b10100, 0b10101, 0b10000];
        let b = Bitstring::expand(&raw, false);
        assert_eq!(b.active, 0b00101);
        assert_eq!(b.base, 0b10000);
        assert_eq!(b.width, 2);
        assert_eq!(b.bits.len(), raw.len() * 2);
    }

    #[test]
    fn bitstring_big_endian_order() {
        let raw = [0b00u32, 0b01, 0b10, 0b11];
        let b = Bitstring::expand(&raw, false);
        // Big-endian: high bit first.
        assert_eq!(b.bits, vec![0, 0, 0, 1, 1, 0, 1, 1]);
    }

    #[test]
    fn bitstring_little_endian_order() {
        let raw = [0b00u32, 0b01, 0b10, 0b11];
        let b = Bitstring::expand(&raw, true);
        assert_eq!(b.bits, vec![0, 0, 1, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn bitstring_roundtrip_both_endians() {
        let raw = [0xdeadu32 & 0xff, 0xbe, 0xef, 0x01, 0x80, 0xff];
        for le in [false, true] {
            let b = Bitstring::expand(&raw, le);
            assert_eq!(b.contract(), raw, "little_endian = {le}");
        }
    }

    #[test]
    fn constant_input_has_no_active_bits() {
        let b = Bitstring::expand(&[5u32; 10], false);
        assert_eq!(b.width, 0);
        assert!(b.bits.is_empty());
    }

    #[test]
    fn serial_xor_folds() {
        assert_eq!(serial_xor(&[1, 2, 3, 4], 2), vec![3, 7]);
        assert_eq!(serial_xor(&[1, 2, 3], 2), vec![3]);
        assert_eq!(serial_xor(&[1, 2, 3], 1), vec![1, 2, 3]);
    }
}
