use crate::core::constants::DynamicsConstants;
use std::collections::VecDeque;

/// Bounded FIFO of recent smoothed forces, oldest evicted first.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceHistory {
    values: VecDeque<f64>,
    capacity: usize,
}

impl Default for ForceHistory {
    fn default() -> Self {
        Self::with_capacity(DynamicsConstants::MAX_FORCE_HISTORY)
    }
}

impl ForceHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn append(&mut self, value: f64) {
        self.values.push_back(value);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    /// The last `count` values in chronological order, or all of them if fewer exist.
    pub fn get_recent(&self, count: usize) -> Vec<f64> {
        let skip = self.values.len().saturating_sub(count);
        self.values.iter().skip(skip).copied().collect()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
