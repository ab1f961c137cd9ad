//! Fixed-capacity history buffers.
//!
//! Pushing into a full buffer drops the oldest entry, so the movement and
//! position histories never grow past their configured length.

use std::collections::vec_deque::Iter;
use std::collections::VecDeque;

/// Bounded drop-oldest buffer
#[derive(Debug, Clone)]
pub struct History<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> History<T> {
    /// Create a buffer holding at most `capacity` items (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an item, evicting the oldest one when full
    pub fn push(&mut self, item: T) {
        if self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest
    pub fn iter(&self) -> Iter<'_, T> {
        self.items.iter()
    }

    /// Most recent item
    pub fn back(&self) -> Option<&T> {
        self.items.back()
    }

    /// The two most recent items as (older, newer)
    pub fn last_pair(&self) -> Option<(&T, &T)> {
        let n = self.items.len();
        if n < 2 {
            return None;
        }
        Some((&self.items[n - 2], &self.items[n - 1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_oldest_when_full() {
        let mut history = History::new(3);
        assert!(history.is_empty());
        for i in 0..5 {
            history.push(i);
        }
        assert_eq!(history.len(), 3);
        assert!(!history.is_empty());
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_last_pair() {
        let mut history = History::new(4);
        assert!(history.last_pair().is_none());
        history.push(1);
        assert!(history.last_pair().is_none());
        history.push(2);
        history.push(3);
        assert_eq!(history.last_pair(), Some((&2, &3)));
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut history = History::new(0);
        history.push('a');
        history.push('b');
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.back(), Some(&'b'));
    }
}
