//! Arena-backed red-black tree keyed by symbol.
//!
//! Backs the sliding-window frequency maps of the MultiMCW predictor, where
//! the alphabet can be the full u32 range and fixed count arrays don't scale.
//! Node identity is a `u32` index into a per-tree arena; index 0 is the
//! reserved NIL sentinel, and teardown is a single arena free.
//!
//! Counts are incremented and decremented as the window slides; a count that
//! reaches zero leaves its node in place (structural deletion is never
//! needed, the node count for one window is bounded by the distinct symbols
//! ever resident).

const NIL: u32 = 0;

#[derive(Debug, Clone)]
struct Node {
    key: u32,
    count: u32,
    /// Position stamp of the most recent increment; mode ties break toward
    /// the most recently observed symbol.
    last_seen: u64,
    left: u32,
    right: u32,
    parent: u32,
    red: bool,
}

/// Symbol → (count, last-seen) map.
#[derive(Debug, Clone)]
pub struct RbTree {
    nodes: Vec<Node>,
    root: u32,
}

impl Default for RbTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RbTree {
    pub fn new() -> Self {
        // Slot 0 is the sentinel: black, self-parented.
        let sentinel = Node {
            key: 0,
            count: 0,
            last_seen: 0,
            left: NIL,
            right: NIL,
            parent: NIL,
            red: false,
        };
        Self {
            nodes: vec![sentinel],
            root: NIL,
        }
    }

    /// Number of live nodes (excluding the sentinel).
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current count for `key`, zero if absent.
    pub fn count(&self, key: u32) -> u32 {
        let idx = self.find(key);
        if idx == NIL { 0 } else { self.nodes[idx as usize].count }
    }

    fn find(&self, key: u32) -> u32 {
        let mut cur = self.root;
        while cur != NIL {
            let node = &self.nodes[cur as usize];
            cur = match key.cmp(&node.key) {
                std::cmp::Ordering::Equal => return cur,
                std::cmp::Ordering::Less => node.left,
                std::cmp::Ordering::Greater => node.right,
            };
        }
        NIL
    }

    /// Bump `key`, stamping it as seen at `stamp`. Returns the new count.
    pub fn increment(&mut self, key: u32, stamp: u64) -> u32 {
        // Walk to the insertion point.
        let mut parent = NIL;
        let mut cur = self.root;
        while cur != NIL {
            parent = cur;
            let node = &mut self.nodes[cur as usize];
            match key.cmp(&node.key) {
                std::cmp::Ordering::Equal => {
                    node.count += 1;
                    node.last_seen = stamp;
                    return node.count;
                }
                std::cmp::Ordering::Less => cur = node.left,
                std::cmp::Ordering::Greater => cur = node.right,
            }
        }
        // New node, red, attached under `parent`.
        let idx = self.nodes.len() as u32;
        self.nodes.push(Node {
            key,
            count: 1,
            last_seen: stamp,
            left: NIL,
            right: NIL,
            parent,
            red: true,
        });
        if parent == NIL {
            self.root = idx;
        } else if key < self.nodes[parent as usize].key {
            self.nodes[parent as usize].left = idx;
        } else {
            self.nodes[parent as usize].right = idx;
        }
        self.insert_fixup(idx);
        1
    }

    /// Drop one occurrence of `key`. Returns the new count. The node stays
    /// in the tree at count zero.
    pub fn decrement(&mut self, key: u32) -> u32 {
        let idx = self.find(key);
        debug_assert_ne!(idx, NIL, "decrement of absent key");
        if idx == NIL {
            return 0;
        }
        let node = &mut self.nodes[idx as usize];
        node.count = node.count.saturating_sub(1);
        node.count
    }

    /// The (key, count) with the highest count among live entries, ties
    /// broken toward the most recent stamp. None when every count is zero.
    pub fn mode(&self) -> Option<(u32, u32)> {
        let mut best: Option<(u32, u32, u64)> = None;
        // Inorder walk via explicit stack; arena indices, no recursion.
        let mut stack = Vec::new();
        let mut cur = self.root;
        while cur != NIL || !stack.is_empty() {
            while cur != NIL {
                stack.push(cur);
                cur = self.nodes[cur as usize].left;
            }
            cur = stack.pop().unwrap_or(NIL);
            let node = &self.nodes[cur as usize];
            if node.count > 0 {
                let better = match best {
                    None => true,
                    Some((_, c, seen)) => {
                        node.count > c || (node.count == c && node.last_seen > seen)
                    }
                };
                if better {
                    best = Some((node.key, node.count, node.last_seen));
                }
            }
            cur = self.nodes[cur as usize].right;
        }
        best.map(|(k, c, _)| (k, c))
    }

    fn rotate_left(&mut self, x: u32) {
        let y = self.nodes[x as usize].right;
        let y_left = self.nodes[y as usize].left;
        self.nodes[x as usize].right = y_left;
        if y_left != NIL {
            self.nodes[y_left as usize].parent = x;
        }
        let x_parent = self.nodes[x as usize].parent;
        self.nodes[y as usize].parent = x_parent;
        if x_parent == NIL {
            self.root = y;
        } else if self.nodes[x_parent as usize].left == x {
            self.nodes[x_parent as usize].left = y;
        } else {
            self.nodes[x_parent as usize].right = y;
        }
        self.nodes[y as usize].left = x;
        self.nodes[x as usize].parent = y;
    }

    fn rotate_right(&mut self, x: u32) {
        let y = self.nodes[x as usize].left;
        let y_right = self.nodes[y as usize].right;
        self.nodes[x as usize].left = y_right;
        if y_right != NIL {
            self.nodes[y_right as usize].parent = x;
        }
        let x_parent = self.nodes[x as usize].parent;
        self.nodes[y as usize].parent = x_parent;
        if x_parent == NIL {
            self.root = y;
        } else if self.nodes[x_parent as usize].left == x {
            self.nodes[x_parent as usize].left = y;
        } else {
            self.nodes[x_parent as usize].right = y;
        }
        self.nodes[y as usize].right = x;
        self.nodes[x as usize].parent = y;
    }

    fn insert_fixup(&mut self, mut z: u32) {
        while self.nodes[self.nodes[z as usize].parent as usize].red {
            let parent = self.nodes[z as usize].parent;
            let grand = self.nodes[parent as usize].parent;
            if parent == self.nodes[grand as usize].left {
                let uncle = self.nodes[grand as usize].right;
                if self.nodes[uncle as usize].red {
                    self.nodes[parent as usize].red = false;
                    self.nodes[uncle as usize].red = false;
                    self.nodes[grand as usize].red = true;
                    z = grand;
                } else {
                    if z == self.nodes[parent as usize].right {
                        z = parent;
                        self.rotate_left(z);
                    }
                    let parent = self.nodes[z as usize].parent;
                    let grand = self.nodes[parent as usize].parent;
                    self.nodes[parent as usize].red = false;
                    self.nodes[grand as usize].red = true;
                    self.rotate_right(grand);
                }
            } else {
                let uncle = self.nodes[grand as usize].left;
                if self.nodes[uncle as usize].red {
                    self.nodes[parent as usize].red = false;
                    self.nodes[uncle as usize].red = false;
                    self.nodes[grand as usize].red = true;
                    z = grand;
                } else {
                    if z == self.nodes[parent as usize].left {
                        z = parent;
                        self.rotate_right(z);
                    }
                    let parent = self.nodes[z as usize].parent;
                    let grand = self.nodes[parent as usize].parent;
                    self.nodes[parent as usize].red = false;
                    self.nodes[grand as usize].red = true;
                    self.rotate_left(grand);
                }
            }
            if z == self.root {
                break;
            }
        }
        let root = self.root;
        self.nodes[root as usize].red = false;
    }

    #[cfg(test)]
    fn check_invariants(&self) {
        // Root black, no red-red edge, equal black heights.
        if self.root == NIL {
            return;
        }
        assert!(!self.nodes[self.root as usize].red, "red root");
        self.check_node(self.root);
    }

    #[cfg(test)]
    fn check_node(&self, idx: u32) -> usize {
        if idx == NIL {
            return 1;
        }
        let node = &self.nodes[idx as usize];
        if node.red {
            assert!(!self.nodes[node.left as usize].red, "red-red edge");
            assert!(!self.nodes[node.right as usize].red, "red-red edge");
        }
        if node.left != NIL {
            assert!(self.nodes[node.left as usize].key < node.key, "order");
        }
        if node.right != NIL {
            assert!(self.nodes[node.right as usize].key > node.key, "order");
        }
        let lh = self.check_node(node.left);
        let rh = self.check_node(node.right);
        assert_eq!(lh, rh, "black height mismatch");
        lh + usize::from(!node.red)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn counts_accumulate() {
        let mut t = RbTree::new();
        assert_eq!(t.increment(5, 0), 1);
        assert_eq!(t.increment(5, 1), 2);
        assert_eq!(t.increment(3, 2), 1);
        assert_eq!(t.count(5), 2);
        assert_eq!(t.count(3), 1);
        assert_eq!(t.count(99), 0);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn decrement_to_zero_keeps_node() {
        let mut t = RbTree::new();
        t.increment(7, 0);
        assert_eq!(t.decrement(7), 0);
        assert_eq!(t.count(7), 0);
        assert_eq!(t.len(), 1);
        assert_eq!(t.mode(), None);
    }

    #[test]
    fn mode_prefers_higher_count_then_recency() {
        let mut t = RbTree::new();
        t.increment(1, 0);
        t.increment(1, 1);
        t.increment(2, 2);
        assert_eq!(t.mode(), Some((1, 2)));
        t.increment(2, 3);
        // Tie at 2; symbol 2 seen more recently.
        assert_eq!(t.mode(), Some((2, 2)));
    }

    #[test]
    fn invariants_hold_under_random_inserts() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut t = RbTree::new();
        let mut reference = std::collections::HashMap::new();
        for stamp in 0..5000u64 {
            let key = rng.random_range(0..500u32);
            t.increment(key, stamp);
            *reference.entry(key).or_insert(0u32) += 1;
        }
        t.check_invariants();
        for (&key, &count) in &reference {
            assert_eq!(t.count(key), count);
        }
        assert_eq!(t.len(), reference.len());
    }

    #[test]
    fn ascending_inserts_stay_balanced() {
        let mut t = RbTree::new();
        for i in 0..4096u32 {
            t.increment(i, i as u64);
        }
        t.check_invariants();
        assert_eq!(t.len(), 4096);
    }
}
