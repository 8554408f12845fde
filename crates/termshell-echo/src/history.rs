//! Entered-line history with up/down navigation.

use std::collections::VecDeque;

/// Bounded list of entered lines.
///
/// Navigation keeps a cursor that `older` moves toward older entries and
/// `newer` moves back toward the line being edited.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
    /// Index into `entries` while navigating, `None` when editing a new line.
    cursor: Option<usize>,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
            cursor: None,
        }
    }

    /// Record an entered line. Blank lines and repeats of the last entry are
    /// skipped; the oldest entry is dropped once capacity is reached.
    pub fn push(&mut self, line: &str) {
        self.cursor = None;
        let line = line.trim();
        if line.is_empty() || self.capacity == 0 {
            return;
        }
        if self.entries.back().is_some_and(|last| last == line) {
            return;
        }
        self.entries.push_back(line.to_string());
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Step to an older entry.
    pub fn older(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let idx = match self.cursor {
            None => self.entries.len() - 1,
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.cursor = Some(idx);
        self.entries.get(idx).map(String::as_str)
    }

    /// Step to a newer entry. Returns `Some("")` when stepping past the
    /// newest entry back to an empty line.
    pub fn newer(&mut self) -> Option<&str> {
        let i = self.cursor?;
        if i + 1 >= self.entries.len() {
            self.cursor = None;
            return Some("");
        }
        self.cursor = Some(i + 1);
        self.entries.get(i + 1).map(String::as_str)
    }

    /// Forget the navigation position.
    pub fn reset_cursor(&mut self) {
        self.cursor = None;
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_skips_blank_and_duplicate() {
        let mut h = History::new(10);
        h.push("ls");
        h.push("   ");
        h.push("ls");
        h.push("echo hi");
        assert_eq!(h.entries().collect::<Vec<_>>(), vec!["ls", "echo hi"]);
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut h = History::new(2);
        h.push("a");
        h.push("b");
        h.push("c");
        assert_eq!(h.entries().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut h = History::new(0);
        h.push("a");
        assert!(h.is_empty());
    }

    #[test]
    fn navigate_back_and_forth() {
        let mut h = History::new(10);
        h.push("one");
        h.push("two");
        assert_eq!(h.older(), Some("two"));
        assert_eq!(h.older(), Some("one"));
        assert_eq!(h.older(), Some("one"));
        assert_eq!(h.newer(), Some("two"));
        assert_eq!(h.newer(), Some(""));
        assert_eq!(h.newer(), None);
    }

    #[test]
    fn older_on_empty() {
        let mut h = History::new(10);
        assert_eq!(h.older(), None);
    }

    #[test]
    fn push_resets_navigation() {
        let mut h = History::new(10);
        h.push("one");
        h.older();
        h.push("two");
        assert_eq!(h.older(), Some("two"));
    }
}
