//! Collected Items
//!
//! State for a `collect` scene: a draft entry and the chips committed from
//! it. Created empty when the scene is entered and dropped when it is left.

/// Entry draft plus committed items
#[derive(Clone, Debug, PartialEq)]
pub struct CollectState {
    items: Vec<String>,
    draft: String,
    min: usize,
    max_items: usize,
    max_item_chars: usize,
}

impl CollectState {
    pub fn new(min: usize, max_items: usize, max_item_chars: usize) -> Self {
        Self {
            items: Vec::new(),
            draft: String::new(),
            min,
            max_items: max_items.max(min),
            max_item_chars,
        }
    }

    /// Append a character to the draft, respecting the per-item cap
    pub fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() || self.draft.chars().count() >= self.max_item_chars {
            return false;
        }
        self.draft.push(ch);
        true
    }

    /// Delete from the draft; on an empty draft remove the last item instead
    pub fn backspace(&mut self) -> Option<String> {
        if self.draft.pop().is_some() {
            return None;
        }
        self.items.pop()
    }

    /// Commit the trimmed draft as an item
    ///
    /// Blank drafts are ignored without any state change.
    pub fn commit(&mut self) -> bool {
        let trimmed = self.draft.trim();
        if trimmed.is_empty() || self.items.len() >= self.max_items {
            return false;
        }
        self.items.push(trimmed.to_string());
        self.draft.clear();
        true
    }

    pub fn can_continue(&self) -> bool {
        self.items.len() >= self.min
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn min(&self) -> usize {
        self.min
    }

    /// How many more items are needed before continue unlocks
    pub fn remaining(&self) -> usize {
        self.min.saturating_sub(self.items.len())
    }
}
