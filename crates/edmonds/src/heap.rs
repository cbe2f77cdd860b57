//! Min-priority queue for the heuristic warm-start.
//!
//! Thin wrapper over `std::collections::BinaryHeap` with reversed ordering.
//! Ties on the key are broken arbitrarily; the matching engine only relies on
//! ascending-key delivery, not on any secondary order.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Min-heap of `(key, id)` pairs popped in ascending key order.
#[derive(Clone, Debug, Default)]
pub struct MinHeap {
    data: BinaryHeap<Reverse<(usize, usize)>>,
}

impl MinHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            data: BinaryHeap::with_capacity(cap),
        }
    }

    #[inline]
    pub fn insert(&mut self, key: usize, id: usize) {
        self.data.push(Reverse((key, id)));
    }

    /// Pop the id with the smallest key, or `None` when empty.
    #[inline]
    pub fn delete_min(&mut self) -> Option<usize> {
        self.data.pop().map(|Reverse((_, id))| id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_ascending_key_order() {
        let mut h = MinHeap::new();
        h.insert(3, 30);
        h.insert(1, 10);
        h.insert(2, 20);
        assert_eq!(h.len(), 3);
        assert_eq!(h.delete_min(), Some(10));
        assert_eq!(h.delete_min(), Some(20));
        assert_eq!(h.delete_min(), Some(30));
        assert_eq!(h.delete_min(), None);
        assert!(h.is_empty());
    }
}
