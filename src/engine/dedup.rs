// ============================================================================
// Processed Order Window
// Bounded memory of recently matched NEW_ORDER hashes
// ============================================================================

use std::collections::{HashSet, VecDeque};

use crate::domain::OrderHash;

/// Remembers the last `capacity` order hashes, evicting the oldest first.
/// A capacity of zero remembers nothing.
#[derive(Debug)]
pub(crate) struct ProcessedOrders {
    capacity: usize,
    arrival: VecDeque<OrderHash>,
    seen: HashSet<OrderHash>,
}

impl ProcessedOrders {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            arrival: VecDeque::with_capacity(capacity.min(1024)),
            seen: HashSet::with_capacity(capacity.min(1024)),
        }
    }

    pub(crate) fn contains(&self, hash: &OrderHash) -> bool {
        self.seen.contains(hash)
    }

    pub(crate) fn insert(&mut self, hash: OrderHash) {
        if self.capacity == 0 || !self.seen.insert(hash.clone()) {
            return;
        }

        self.arrival.push_back(hash);
        while self.arrival.len() > self.capacity {
            if let Some(evicted) = self.arrival.pop_front() {
                self.seen.remove(&evicted);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oldest_hash_is_evicted() {
        let mut window = ProcessedOrders::new(2);
        window.insert(OrderHash::new("0x01"));
        window.insert(OrderHash::new("0x02"));
        window.insert(OrderHash::new("0x01"));
        assert_eq!(window.arrival.len(), 2);

        window.insert(OrderHash::new("0x03"));
        assert!(!window.contains(&OrderHash::new("0x01")));
        assert!(window.contains(&OrderHash::new("0x02")));
        assert!(window.contains(&OrderHash::new("0x03")));
    }

    #[test]
    fn test_zero_capacity_disables_window() {
        let mut window = ProcessedOrders::new(0);
        window.insert(OrderHash::new("0x01"));
        assert!(!window.contains(&OrderHash::new("0x01")));
        assert!(window.arrival.is_empty());
    }
}
