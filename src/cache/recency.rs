//! Write Order Module
//!
//! Tracks the order in which keys were last written, for oldest-first eviction.

use std::collections::VecDeque;

// == Write Order ==
/// Keys ordered by last write.
///
/// Keys are stored in a VecDeque where:
/// - Front = Most recently written
/// - Back = Least recently written
#[derive(Debug, Default)]
pub struct WriteOrder {
    order: VecDeque<String>,
}

impl WriteOrder {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Record Write ==
    /// Marks a key as the most recently written.
    ///
    /// Rewriting an existing key moves it to the front.
    pub fn record_write(&mut self, key: &str) {
        self.remove(key);
        self.order.push_front(key.to_string());
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Oldest First ==
    /// Returns the tracked keys from least to most recently written.
    pub fn oldest_first(&self) -> Vec<String> {
        self.order.iter().rev().cloned().collect()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
