//! Conversation history window.
//!
//! Only the most recent turns are kept; older ones are dropped first.

use std::collections::VecDeque;

use taxbot_core::{HistoryEntry, Role};

/// Number of turns kept per user unless configured otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

/// Bounded, strictly ordered sequence of past turns.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<HistoryEntry>,
    max_entries: usize,
}

impl HistoryBuffer {
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries.saturating_add(1)),
            max_entries,
        }
    }

    /// Push a turn to the back, evicting from the front down to the limit.
    pub fn append(&mut self, role: Role, text: impl Into<String>) {
        self.entries.push_back(HistoryEntry {
            role,
            text: text.into(),
        });
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    /// Role-prefixed transcript, one turn per line, oldest first.
    #[must_use]
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|entry| {
                let prefix = match entry.role {
                    Role::User => "Пользователь",
                    Role::Assistant => "Бот",
                };
                format!("{prefix}: {}", entry.text)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn max_entries(&self) -> usize {
        self.max_entries
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
