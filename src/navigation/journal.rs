//! Per-region navigation journal.
//!
//! The journal records committed navigations only. A new forward
//! navigation clears the forward stack; back and forward move the
//! current entry between the two stacks.

use rustc_hash::FxHashMap;

/// String key/value payload carried by a navigation request and handed
/// to the target view's lifecycle hooks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationParameters {
    values: FxHashMap<String, String>,
}

impl NavigationParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|v| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEntry {
    pub target: String,
    pub parameters: NavigationParameters,
    pub sequence: u64,
}

#[derive(Debug, Default)]
pub struct NavigationJournal {
    back: Vec<NavigationEntry>,
    forward: Vec<NavigationEntry>,
    current: Option<NavigationEntry>,
    next_sequence: u64,
}

impl NavigationJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&NavigationEntry> {
        self.current.as_ref()
    }

    pub fn can_go_back(&self) -> bool {
        !self.back.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }

    pub fn back_len(&self) -> usize {
        self.back.len()
    }

    pub fn forward_len(&self) -> usize {
        self.forward.len()
    }

    /// Commits a fresh navigation: the previous current entry moves to
    /// the back stack and the forward stack is discarded.
    pub fn record(&mut self, target: &str, parameters: NavigationParameters) {
        if let Some(previous) = self.current.take() {
            self.back.push(previous);
        }
        self.forward.clear();
        self.current = Some(NavigationEntry {
            target: target.to_string(),
            parameters,
            sequence: self.next_sequence,
        });
        self.next_sequence += 1;
    }

    /// Entry a back navigation would land on, without committing.
    pub fn peek_back(&self) -> Option<&NavigationEntry> {
        self.back.last()
    }

    pub fn peek_forward(&self) -> Option<&NavigationEntry> {
        self.forward.last()
    }

    /// Commits a back step. Caller confirms the move first via
    /// `peek_back`.
    pub fn go_back(&mut self) -> Option<&NavigationEntry> {
        let entry = self.back.pop()?;
        if let Some(current) = self.current.take() {
            self.forward.push(current);
        }
        self.current = Some(entry);
        self.current.as_ref()
    }

    pub fn go_forward(&mut self) -> Option<&NavigationEntry> {
        let entry = self.forward.pop()?;
        if let Some(current) = self.current.take() {
            self.back.push(current);
        }
        self.current = Some(entry);
        self.current.as_ref()
    }
}
