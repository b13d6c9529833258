//! Indexed binary min-heap over collapse candidates.
//!
//! Edge identities are stable integer indices into the connectivity arrays.
//! A parallel `position[edge] -> slot` table makes `update` and `remove`
//! O(log n) instead of an O(n) scan, which the decimation driver relies on
//! when it rescores a collapsed vertex's one-ring.

const NOT_IN_HEAP: usize = usize::MAX;

/// Array-backed binary min-heap keyed by `f64` cost with position tracking.
///
/// Costs must not be NaN; infinite costs are legal (the driver uses `+inf`
/// as "never collapse" and discards such entries on pop).
#[derive(Debug, Clone)]
pub struct EdgeHeap {
    /// `(cost, edge)` pairs in heap order.
    heap: Vec<(f64, u32)>,
    /// `pos[edge]` is the slot of `edge` in `heap`, or [`NOT_IN_HEAP`].
    pos: Vec<usize>,
}

impl EdgeHeap {
    /// Create an empty heap able to track `edge_count` edge indices.
    #[must_use]
    pub fn new(edge_count: usize) -> Self {
        Self {
            heap: Vec::with_capacity(edge_count),
            pos: vec![NOT_IN_HEAP; edge_count],
        }
    }

    /// Bulk-build a heap from per-edge costs in O(n).
    ///
    /// Non-finite costs are skipped: an edge that can never collapse has no
    /// business occupying heap slots.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_costs(costs: &[f64]) -> Self {
        let mut heap = Vec::with_capacity(costs.len());
        let mut pos = vec![NOT_IN_HEAP; costs.len()];
        for (e, &cost) in costs.iter().enumerate() {
            if cost.is_finite() {
                pos[e] = heap.len();
                heap.push((cost, e as u32));
            }
        }

        let mut this = Self { heap, pos };
        // Floyd heapify: sift down from the last internal node.
        for i in (0..this.heap.len() / 2).rev() {
            this.sift_down(i);
        }
        this
    }

    /// Number of queued edges.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// True when no edges are queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// True when `edge` is currently queued.
    #[inline]
    #[must_use]
    pub fn contains(&self, edge: u32) -> bool {
        self.pos[edge as usize] != NOT_IN_HEAP
    }

    /// Queue `edge` with `cost`. Must not already be queued.
    pub fn insert(&mut self, edge: u32, cost: f64) {
        debug_assert!(!self.contains(edge), "edge {edge} already queued");
        let slot = self.heap.len();
        self.heap.push((cost, edge));
        self.pos[edge as usize] = slot;
        self.sift_up(slot);
    }

    /// Pop the cheapest edge, or `None` when the queue is exhausted.
    pub fn extract_min(&mut self) -> Option<(u32, f64)> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.swap_slots(0, last);
        let (cost, edge) = self.heap.pop()?;
        self.pos[edge as usize] = NOT_IN_HEAP;
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some((edge, cost))
    }

    /// Change the cost of a queued edge (decrease or increase), or queue it
    /// if absent.
    pub fn update(&mut self, edge: u32, cost: f64) {
        let slot = self.pos[edge as usize];
        if slot == NOT_IN_HEAP {
            self.insert(edge, cost);
            return;
        }
        let old = self.heap[slot].0;
        self.heap[slot].0 = cost;
        if cost < old {
            self.sift_up(slot);
        } else {
            self.sift_down(slot);
        }
    }

    /// Drop a queued edge; no-op when absent.
    pub fn remove(&mut self, edge: u32) {
        let slot = self.pos[edge as usize];
        if slot == NOT_IN_HEAP {
            return;
        }
        let last = self.heap.len() - 1;
        self.swap_slots(slot, last);
        self.heap.pop();
        self.pos[edge as usize] = NOT_IN_HEAP;
        if slot < self.heap.len() {
            // The swapped-in entry may need to move either way.
            let moved = self.heap[slot].1;
            self.sift_up(slot);
            self.sift_down(self.pos[moved as usize]);
        }
    }

    #[inline]
    fn swap_slots(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.heap.swap(a, b);
        self.pos[self.heap[a].1 as usize] = a;
        self.pos[self.heap[b].1 as usize] = b;
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.heap[slot].0 < self.heap[parent].0 {
                self.swap_slots(slot, parent);
                slot = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut smallest = slot;
            if left < self.heap.len() && self.heap[left].0 < self.heap[smallest].0 {
                smallest = left;
            }
            if right < self.heap.len() && self.heap[right].0 < self.heap[smallest].0 {
                smallest = right;
            }
            if smallest == slot {
                break;
            }
            self.swap_slots(slot, smallest);
            slot = smallest;
        }
    }
}
