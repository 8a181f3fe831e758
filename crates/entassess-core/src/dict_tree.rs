//! Dictionary tree with modulus-hashed pages and a segmented page pool.
//!
//! Each node ("page") maps symbols to `(count, child)` pairs in a small
//! open-addressed array whose length walks a fixed prime ladder. A path of
//! length `d` from the root spells the last `d` symbols seen, most recent
//! first, so one tree serves both the MultiMMC context predictor and the
//! LZ78Y prefix dictionary: `count` is the continuation tally for the node's
//! context, `child` descends one symbol further into the past.
//!
//! Pages live in fixed-size pool segments addressed by `u32` id; tearing the
//! tree down frees the segment chain at once.

/// Hash-array lengths, in rehash order.
pub const MODULUS_LADDER: [u32; 7] = [1, 2, 5, 11, 31, 67, 127];

/// Pages per pool segment.
const SEGMENT_SIZE: usize = 1024;

/// Vacant-slot marker. Translated alphabets are dense from zero, so the top
/// value never appears as a real symbol for any practical `k`.
const EMPTY: u32 = u32::MAX;

/// Absent child page.
pub const NO_PAGE: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
struct Slot {
    symbol: u32,
    count: u32,
    child: u32,
}

impl Slot {
    const VACANT: Slot = Slot {
        symbol: EMPTY,
        count: 0,
        child: NO_PAGE,
    };
}

#[derive(Debug)]
struct Page {
    /// Index into [`MODULUS_LADDER`].
    modulus_idx: u8,
    /// Whether the prefix ending at this node has been observed with a
    /// continuation.
    prefix_found: bool,
    /// Most frequent continuation symbol and its count.
    max_symbol: u32,
    max_count: u32,
    /// Occupied slots.
    occupied: u32,
    slots: Vec<Slot>,
}

impl Page {
    fn new() -> Self {
        Self {
            modulus_idx: 0,
            prefix_found: false,
            max_symbol: EMPTY,
            max_count: 0,
            occupied: 0,
            slots: vec![Slot::VACANT; MODULUS_LADDER[0] as usize],
        }
    }

    fn modulus(&self) -> u32 {
        MODULUS_LADDER[self.modulus_idx as usize]
    }

    /// Slot index for `symbol`, or the vacant slot it would occupy, or None
    /// when the probe sequence exhausts the array.
    fn probe(&self, symbol: u32) -> Option<usize> {
        let m = self.modulus();
        let mut idx = (symbol % m) as usize;
        for _ in 0..m {
            let slot = &self.slots[idx];
            if slot.symbol == symbol || slot.symbol == EMPTY {
                return Some(idx);
            }
            idx += 1;
            if idx as u32 == m {
                idx = 0;
            }
        }
        None
    }

    /// Probe length that lookup of `symbol` would need.
    fn probe_len(&self, symbol: u32) -> u32 {
        let m = self.modulus();
        let mut idx = (symbol % m) as usize;
        for step in 0..m {
            let slot = &self.slots[idx];
            if slot.symbol == symbol || slot.symbol == EMPTY {
                return step + 1;
            }
            idx += 1;
            if idx as u32 == m {
                idx = 0;
            }
        }
        m
    }

    /// Rehash is due when the load factor passes 2/3 of the modulus or a
    /// probe sequence exceeds a quarter of it, and a longer modulus exists.
    fn wants_rehash(&self, probe_len: u32) -> bool {
        if self.modulus_idx as usize + 1 >= MODULUS_LADDER.len() {
            return false;
        }
        let m = self.modulus();
        3 * (self.occupied + 1) > 2 * m || probe_len > m / 4
    }

    fn rehash(&mut self) {
        self.modulus_idx += 1;
        let new_m = self.modulus() as usize;
        let old = std::mem::replace(&mut self.slots, vec![Slot::VACANT; new_m]);
        self.occupied = 0;
        for slot in old {
            if slot.symbol == EMPTY {
                continue;
            }
            // Re-insert; the fresh array always has room.
            let idx = self
                .probe(slot.symbol)
                .expect("rehash target cannot be full");
            self.slots[idx] = slot;
            self.occupied += 1;
        }
    }
}

/// Segmented page pool plus the root page.
#[derive(Debug)]
pub struct DictTree {
    segments: Vec<Vec<Page>>,
    pages: u32,
}

impl Default for DictTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DictTree {
    /// Root page id.
    pub const ROOT: u32 = 0;

    pub fn new() -> Self {
        let mut tree = Self {
            segments: Vec::new(),
            pages: 0,
        };
        let root = tree.alloc();
        debug_assert_eq!(root, Self::ROOT);
        tree
    }

    /// Total allocated pages.
    pub fn page_count(&self) -> u32 {
        self.pages
    }

    fn alloc(&mut self) -> u32 {
        let id = self.pages;
        let seg = (id as usize) / SEGMENT_SIZE;
        if seg == self.segments.len() {
            self.segments.push(Vec::with_capacity(SEGMENT_SIZE));
        }
        self.segments[seg].push(Page::new());
        self.pages += 1;
        id
    }

    fn page(&self, id: u32) -> &Page {
        &self.segments[id as usize / SEGMENT_SIZE][id as usize % SEGMENT_SIZE]
    }

    fn page_mut(&mut self, id: u32) -> &mut Page {
        &mut self.segments[id as usize / SEGMENT_SIZE][id as usize % SEGMENT_SIZE]
    }

    /// Child of `page` along `symbol`, without creating anything.
    pub fn child(&self, page: u32, symbol: u32) -> Option<u32> {
        let p = self.page(page);
        match p.probe(symbol) {
            Some(idx) if p.slots[idx].symbol == symbol && p.slots[idx].child != NO_PAGE => {
                Some(p.slots[idx].child)
            }
            _ => None,
        }
    }

    /// Child of `page` along `symbol`, creating the entry and the child page
    /// if absent. Returns None only when the page is saturated at the top
    /// modulus, in which case novel symbols are dropped.
    pub fn child_or_create(&mut self, page: u32, symbol: u32) -> Option<u32> {
        if let Some(existing) = self.child(page, symbol) {
            return Some(existing);
        }
        let idx = self.ensure_slot(page, symbol)?;
        if self.page(page).slots[idx].child == NO_PAGE {
            let child = self.alloc();
            self.page_mut(page).slots[idx].child = child;
        }
        Some(self.page(page).slots[idx].child)
    }

    /// Record continuation `symbol` observed after the prefix ending at
    /// `page`: bump its count, refresh the page's max entry, mark the prefix
    /// observed. Returns the new count (0 when the page is saturated).
    pub fn record(&mut self, page: u32, symbol: u32) -> u32 {
        let Some(idx) = self.ensure_slot(page, symbol) else {
            return 0;
        };
        let p = self.page_mut(page);
        p.slots[idx].count += 1;
        let count = p.slots[idx].count;
        // Ties keep the earlier max; only a strictly greater count moves it.
        if count > p.max_count {
            p.max_count = count;
            p.max_symbol = symbol;
        }
        p.prefix_found = true;
        count
    }

    /// Whether the prefix ending at `page` has been observed.
    pub fn prefix_found(&self, page: u32) -> bool {
        self.page(page).prefix_found
    }

    /// The page's most frequent continuation, if any.
    pub fn max_entry(&self, page: u32) -> Option<(u32, u32)> {
        let p = self.page(page);
        if p.max_count == 0 {
            None
        } else {
            Some((p.max_symbol, p.max_count))
        }
    }

    /// Continuation count for `symbol` at `page`.
    pub fn count(&self, page: u32, symbol: u32) -> u32 {
        let p = self.page(page);
        match p.probe(symbol) {
            Some(idx) if p.slots[idx].symbol == symbol => p.slots[idx].count,
            _ => 0,
        }
    }

    /// Find or create the slot for `symbol`, rehashing along the ladder as
    /// the load factor or probe length demands.
    fn ensure_slot(&mut self, page: u32, symbol: u32) -> Option<usize> {
        loop {
            let p = self.page(page);
            let probe_len = p.probe_len(symbol);
            let idx = p.probe(symbol)?;
            if p.slots[idx].symbol == symbol {
                return Some(idx);
            }
            if p.wants_rehash(probe_len) {
                self.page_mut(page).rehash();
                continue;
            }
            let p = self.page_mut(page);
            p.slots[idx] = Slot {
                symbol,
                count: 0,
                child: NO_PAGE,
            };
            p.occupied += 1;
            return Some(idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn record_tracks_max_entry() {
        let mut t = DictTree::new();
        t.record(DictTree::ROOT, 3);
        t.record(DictTree::ROOT, 5);
        t.record(DictTree::ROOT, 5);
        assert_eq!(t.max_entry(DictTree::ROOT), Some((5, 2)));
        assert_eq!(t.count(DictTree::ROOT, 3), 1);
        assert!(t.prefix_found(DictTree::ROOT));
    }

    #[test]
    fn fresh_page_has_no_prefix() {
        let mut t = DictTree::new();
        let child = t.child_or_create(DictTree::ROOT, 7).unwrap();
        assert!(!t.prefix_found(child));
        assert_eq!(t.max_entry(child), None);
    }

    #[test]
    fn child_lookup_vs_create() {
        let mut t = DictTree::new();
        assert_eq!(t.child(DictTree::ROOT, 1), None);
        let c = t.child_or_create(DictTree::ROOT, 1).unwrap();
        assert_eq!(t.child(DictTree::ROOT, 1), Some(c));
        assert_eq!(t.child_or_create(DictTree::ROOT, 1), Some(c));
        assert_eq!(t.page_count(), 2);
    }

    #[test]
    fn modulus_ladder_advances_under_load() {
        let mut t = DictTree::new();
        // 90 distinct symbols force the page through the ladder to 127.
        for s in 0..90u32 {
            t.record(DictTree::ROOT, s);
        }
        for s in 0..90u32 {
            assert_eq!(t.count(DictTree::ROOT, s), 1, "symbol {s}");
        }
    }

    #[test]
    fn saturated_top_modulus_drops_novel_symbols() {
        let mut t = DictTree::new();
        for s in 0..200u32 {
            t.record(DictTree::ROOT, s);
        }
        // At most 127 slots exist; established symbols still update.
        let live: u32 = (0..200u32)
            .map(|s| u32::from(t.count(DictTree::ROOT, s) > 0))
            .sum();
        assert_eq!(live, 127);
        assert_eq!(t.record(DictTree::ROOT, 0), 2);
    }

    #[test]
    fn counts_survive_rehash() {
        let mut t = DictTree::new();
        let mut rng = StdRng::seed_from_u64(0xd1c7);
        let mut reference = std::collections::HashMap::new();
        for _ in 0..2000 {
            let s = rng.random_range(0..60u32);
            t.record(DictTree::ROOT, s);
            *reference.entry(s).or_insert(0u32) += 1;
        }
        for (&s, &c) in &reference {
            assert_eq!(t.count(DictTree::ROOT, s), c);
        }
        let (max_s, max_c) = t.max_entry(DictTree::ROOT).unwrap();
        assert_eq!(reference[&max_s], max_c);
        assert_eq!(max_c, *reference.values().max().unwrap());
    }

    #[test]
    fn paths_spell_recent_history() {
        let mut t = DictTree::new();
        // Context "b a" (most recent first), continuation "c".
        let depth1 = t.child_or_create(DictTree::ROOT, 1).unwrap();
        let depth2 = t.child_or_create(depth1, 0).unwrap();
        t.record(depth2, 2);
        assert_eq!(t.max_entry(depth2), Some((2, 1)));
        assert_eq!(t.page_count(), 3);
    }
}
