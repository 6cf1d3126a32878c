//! Min-priority queue shared by the best-first solvers.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

struct Entry<P, N> {
    priority: P,
    seq: u64,
    node: N,
}

impl<P: Ord, N> PartialEq for Entry<P, N> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl<P: Ord, N> Eq for Entry<P, N> {}

impl<P: Ord, N> PartialOrd for Entry<P, N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P: Ord, N> Ord for Entry<P, N> {
    // Reversed: BinaryHeap is a max-heap.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Append-only min-queue. Equal priorities pop in insertion order.
///
/// There is no decrease-key: callers push a fresh entry and skip stale
/// ones when they pop, using the sequence number returned by `push`.
pub(crate) struct Frontier<P, N> {
    heap: BinaryHeap<Entry<P, N>>,
    next_seq: u64,
}

impl<P: Ord, N> Frontier<P, N> {
    pub(crate) fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Queue `node` and return the sequence number of the entry.
    pub(crate) fn push(&mut self, priority: P, node: N) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            priority,
            seq,
            node,
        });
        seq
    }

    /// Pop the entry with the least priority.
    pub(crate) fn pop(&mut self) -> Option<(P, u64, N)> {
        self.heap
            .pop()
            .map(|entry| (entry.priority, entry.seq, entry.node))
    }
}
