use std::collections::VecDeque;

use serde_json::Value;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Bounded chat log for one room; oldest entries fall off the front.
#[derive(Debug, Clone)]
pub struct History {
    cap: usize,
    entries: VecDeque<Value>,
}

impl History {
    pub fn new(cap: usize) -> Self {
        Self { cap, entries: VecDeque::with_capacity(cap.min(DEFAULT_HISTORY_LIMIT)) }
    }

    pub fn push(&mut self, entry: Value) {
        if self.cap == 0 {
            return;
        }
        while self.entries.len() >= self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Entries oldest → newest.
    pub fn snapshot(&self) -> Vec<Value> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_insertion_order() {
        let mut h = History::default();
        h.push(json!("a"));
        h.push(json!("b"));
        assert_eq!(h.snapshot(), vec![json!("a"), json!("b")]);
    }

    #[test]
    fn fifty_first_entry_evicts_the_first() {
        let mut h = History::default();
        for i in 1..=51 {
            h.push(json!(format!("m{i}")));
        }
        let snap = h.snapshot();
        assert_eq!(snap.len(), 50);
        assert_eq!(snap.first(), Some(&json!("m2")));
        assert_eq!(snap.last(), Some(&json!("m51")));
    }

    #[test]
    fn zero_capacity_retains_nothing() {
        let mut h = History::new(0);
        h.push(json!("gone"));
        assert!(h.is_empty());
    }
}
