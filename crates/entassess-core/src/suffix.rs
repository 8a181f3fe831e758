//! Suffix array and LCP construction for symbol sequences.
//!
//! SA-IS induced sorting, linear in the input length, with Kasai's algorithm
//! for the LCP array. The t-tuple and LRS estimators are the consumers; they
//! build this once per block and release it before the next.

/// Suffix array plus LCP over a translated sequence.
#[derive(Debug, Clone)]
pub struct SuffixArray {
    /// Lexicographic order of suffixes: `sa[i]` is the start of the i-th
    /// smallest suffix.
    pub sa: Vec<u32>,
    /// `lcp[i]` = longest common prefix of the suffixes at `sa[i-1]` and
    /// `sa[i]`; `lcp[0] = 0`.
    pub lcp: Vec<u32>,
}

impl SuffixArray {
    /// Build over a translated sequence with alphabet size `k`.
    pub fn build(data: &[u32], k: usize) -> Self {
        let n = data.len();
        if n == 0 {
            return Self {
                sa: Vec::new(),
                lcp: Vec::new(),
            };
        }
        // Shift the alphabet up one and append a unique smallest sentinel;
        // SA-IS wants the string to end in its minimum.
        let mut s: Vec<usize> = Vec::with_capacity(n + 1);
        s.extend(data.iter().map(|&c| c as usize + 1));
        s.push(0);
        let sa_full = sais(&s, k + 1);
        // Drop the sentinel suffix (always first).
        let sa: Vec<u32> = sa_full[1..].iter().map(|&i| i as u32).collect();
        let lcp = kasai(data, &sa);
        Self { sa, lcp }
    }

    /// Length of the underlying sequence.
    pub fn len(&self) -> usize {
        self.sa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sa.is_empty()
    }

    /// Longest repeated substring length (the maximum LCP value).
    pub fn longest_repeat(&self) -> u32 {
        self.lcp.iter().copied().max().unwrap_or(0)
    }
}

/// SA-IS on a string whose last character is a unique minimum.
fn sais(s: &[usize], k: usize) -> Vec<usize> {
    let n = s.len();
    let mut sa = vec![usize::MAX; n];
    if n == 1 {
        sa[0] = 0;
        return sa;
    }

    // Suffix type classification: S-type iff lexicographically smaller than
    // the following suffix.
    let mut is_s = vec![false; n];
    is_s[n - 1] = true;
    for i in (0..n - 1).rev() {
        is_s[i] = s[i] < s[i + 1] || (s[i] == s[i + 1] && is_s[i + 1]);
    }
    let is_lms = |i: usize| i > 0 && is_s[i] && !is_s[i - 1];

    let mut bkt = vec![0usize; k];
    for &c in s {
        bkt[c] += 1;
    }
    let bucket_starts = |bkt: &[usize]| -> Vec<usize> {
        let mut starts = vec![0usize; bkt.len()];
        let mut sum = 0;
        for (i, &b) in bkt.iter().enumerate() {
            starts[i] = sum;
            sum += b;
        }
        starts
    };
    let bucket_ends = |bkt: &[usize]| -> Vec<usize> {
        let mut ends = vec![0usize; bkt.len()];
        let mut sum = 0;
        for (i, &b) in bkt.iter().enumerate() {
            sum += b;
            ends[i] = sum;
        }
        ends
    };

    let induce = |sa: &mut [usize], lms_sorted: &[usize]| {
        sa.fill(usize::MAX);
        // Seed LMS suffixes at their bucket ends, in the given order.
        let mut ends = bucket_ends(&bkt);
        for &i in lms_sorted.iter().rev() {
            let c = s[i];
            ends[c] -= 1;
            sa[ends[c]] = i;
        }
        // Induce L-type from the left.
        let mut starts = bucket_starts(&bkt);
        for idx in 0..n {
            let j = sa[idx];
            if j != usize::MAX && j > 0 && !is_s[j - 1] {
                let c = s[j - 1];
                sa[starts[c]] = j - 1;
                starts[c] += 1;
            }
        }
        // Induce S-type from the right.
        let mut ends = bucket_ends(&bkt);
        for idx in (0..n).rev() {
            let j = sa[idx];
            if j != usize::MAX && j > 0 && is_s[j - 1] {
                let c = s[j - 1];
                ends[c] -= 1;
                sa[ends[c]] = j - 1;
            }
        }
    };

    // First pass: LMS positions in text order are enough to sort LMS
    // substrings by induced sorting.
    let lms_positions: Vec<usize> = (0..n).filter(|&i| is_lms(i)).collect();
    induce(&mut sa, &lms_positions);

    // Name LMS substrings in sorted order.
    let lms_count = lms_positions.len();
    let mut sorted_lms: Vec<usize> = sa.iter().copied().filter(|&i| is_lms(i)).collect();
    let mut names = vec![usize::MAX; n];
    let mut name = 0usize;
    if lms_count > 0 {
        names[sorted_lms[0]] = 0;
        for w in 1..sorted_lms.len() {
            let (a, b) = (sorted_lms[w - 1], sorted_lms[w]);
            if !lms_substring_equal(s, &is_s, a, b) {
                name += 1;
            }
            names[sorted_lms[w]] = name;
        }
    }

    if name + 1 < lms_count {
        // Names collide: sort the reduced string recursively.
        let reduced: Vec<usize> = lms_positions.iter().map(|&i| names[i]).collect();
        let reduced_sa = sais(&reduced, name + 1);
        sorted_lms = reduced_sa.iter().map(|&r| lms_positions[r]).collect();
    } else {
        // Unique names: sorted order falls straight out of the name ranks.
        sorted_lms = vec![0; lms_count];
        for &i in &lms_positions {
            sorted_lms[names[i]] = i;
        }
    }

    induce(&mut sa, &sorted_lms);
    sa
}

/// Compare two LMS substrings for exact equality.
fn lms_substring_equal(s: &[usize], is_s: &[bool], a: usize, b: usize) -> bool {
    let n = s.len();
    if a == b {
        return true;
    }
    let is_lms = |i: usize| i > 0 && is_s[i] && !is_s[i - 1];
    let mut i = 0;
    loop {
        let ai = a + i;
        let bi = b + i;
        if ai >= n || bi >= n {
            return false;
        }
        if s[ai] != s[bi] {
            return false;
        }
        if i > 0 {
            let a_end = is_lms(ai);
            let b_end = is_lms(bi);
            if a_end || b_end {
                return a_end && b_end;
            }
        }
        i += 1;
    }
}

/// Kasai's LCP construction: O(n) using the inverse suffix array.
fn kasai(data: &[u32], sa: &[u32]) -> Vec<u32> {
    let n = data.len();
    let mut rank = vec![0u32; n];
    for (i, &p) in sa.iter().enumerate() {
        rank[p as usize] = i as u32;
    }
    let mut lcp = vec![0u32; n];
    let mut h = 0usize;
    for i in 0..n {
        let r = rank[i] as usize;
        if r > 0 {
            let j = sa[r - 1] as usize;
            while i + h < n && j + h < n && data[i + h] == data[j + h] {
                h += 1;
            }
            lcp[r] = h as u32;
            h = h.saturating_sub(1);
        } else {
            h = 0;
        }
    }
    lcp
}
