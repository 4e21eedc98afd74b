//! Bounded priority queue for exact top-k selection.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::VectorId;

/// A candidate result: vector id plus its distance to the query.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor {
    pub distance: f32,
    pub id: VectorId,
}

impl Neighbor {
    pub fn new(id: VectorId, distance: f32) -> Self {
        Self { distance, id }
    }
}

impl PartialEq for Neighbor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Distance first, then id, so equal distances rank the older vector first.
impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Max-heap holding at most `limit` neighbors; the worst kept candidate sits on top.
#[derive(Debug)]
pub struct TopK {
    heap: BinaryHeap<Neighbor>,
    limit: usize,
}

impl TopK {
    pub fn new(limit: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(limit.saturating_add(1).min(1024)),
            limit,
        }
    }

    /// Offer a candidate, evicting the current worst if the queue is full.
    pub fn push(&mut self, n: Neighbor) {
        if self.limit == 0 {
            return;
        }
        if self.heap.len() < self.limit {
            self.heap.push(n);
        } else if let Some(worst) = self.heap.peek() {
            if n < *worst {
                self.heap.pop();
                self.heap.push(n);
            }
        }
    }

    /// Merge another queue into this one.
    pub fn merge(mut self, other: TopK) -> Self {
        for n in other.heap {
            self.push(n);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drain into a Vec sorted ascending by (distance, id).
    pub fn into_sorted_vec(self) -> Vec<Neighbor> {
        self.heap.into_sorted_vec()
    }
}
