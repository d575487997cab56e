use std::collections::VecDeque;

use crate::canvas::UndoEntry;

// ============================================================================
// UNDO STACK - bounded LIFO of full-buffer checkpoints
// ============================================================================

/// Linear undo history.  Entries are pushed immediately before each
/// mutation; once `capacity` is exceeded the oldest entry is dropped.
pub struct UndoStack {
    entries: VecDeque<UndoEntry>,
    capacity: usize,
    total_memory: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_UNDO_CAPACITY)
    }
}

impl UndoStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(64) + 1),
            capacity,
            total_memory: 0,
        }
    }

    pub fn push(&mut self, entry: UndoEntry) {
        self.total_memory += entry.memory_size();
        self.entries.push_back(entry);
        self.enforce_limits();
    }

    /// Remove and return the most recent checkpoint, or `None` when there is
    /// nothing to undo.
    pub fn pop(&mut self) -> Option<UndoEntry> {
        let entry = self.entries.pop_back()?;
        self.total_memory -= entry.memory_size();
        Some(entry)
    }

    pub fn peek(&self) -> Option<&UndoEntry> {
        self.entries.back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_memory = 0;
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the bound; excess oldest entries are evicted immediately.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.enforce_limits();
    }

    /// Bytes held by all checkpoints.
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    fn enforce_limits(&mut self) {
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                self.total_memory -= evicted.memory_size();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::RasterBuffer;

    /// 1×1 snapshot whose red channel tags it.
    fn entry(tag: u8) -> UndoEntry {
        RasterBuffer::from_raw(1, 1, vec![tag, 0, 0, 255]).unwrap().snapshot()
    }

    #[test]
    fn starts_empty() {
        let mut stack = UndoStack::new(16);
        assert!(!stack.can_undo());
        assert!(stack.pop().is_none());
        assert_eq!(stack.memory_usage(), 0);
    }

    #[test]
    fn push_then_pop_returns_identical_entry() {
        let mut stack = UndoStack::new(16);
        let e = entry(42);
        stack.push(e.clone());
        assert!(stack.can_undo());
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.pop(), Some(e));
        assert!(!stack.can_undo());
    }

    #[test]
    fn pops_in_lifo_order() {
        let mut stack = UndoStack::new(16);
        for tag in 1..=3 {
            stack.push(entry(tag));
        }
        let order: Vec<u8> = std::iter::from_fn(|| stack.pop())
            .map(|e| e.pixels()[0])
            .collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let mut stack = UndoStack::new(16);
        for tag in 0..17 {
            stack.push(entry(tag));
        }
        assert_eq!(stack.len(), 16);
        let mut remaining = Vec::new();
        while let Some(e) = stack.pop() {
            remaining.push(e.pixels()[0]);
        }
        assert_eq!(remaining.len(), 16);
        assert!(!remaining.contains(&0));
        assert_eq!(remaining.first(), Some(&16));
        assert_eq!(remaining.last(), Some(&1));
    }

    #[test]
    fn evicts_k_oldest_in_insertion_order() {
        let mut stack = UndoStack::new(4);
        for tag in 0..7 {
            stack.push(entry(tag));
        }
        assert_eq!(stack.len(), 4);
        assert_eq!(stack.memory_usage(), 16);
        let mut remaining: Vec<u8> = std::iter::from_fn(|| stack.pop())
            .map(|e| e.pixels()[0])
            .collect();
        remaining.reverse();
        assert_eq!(remaining, vec![3, 4, 5, 6]);
    }

    #[test]
    fn clear_disables_undo() {
        let mut stack = UndoStack::new(16);
        stack.push(entry(1));
        stack.push(entry(2));
        stack.clear();
        assert!(!stack.can_undo());
        assert_eq!(stack.memory_usage(), 0);
    }

    #[test]
    fn shrinking_capacity_evicts_oldest() {
        let mut stack = UndoStack::new(64);
        for tag in 0..10 {
            stack.push(entry(tag));
        }
        stack.set_capacity(3);
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.peek().map(|e| e.pixels()[0]), Some(9));
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut stack = UndoStack::new(0);
        stack.push(entry(1));
        assert!(!stack.can_undo());
    }
}
