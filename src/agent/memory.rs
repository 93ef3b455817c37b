//! Sliding-window conversation memory.

use std::collections::VecDeque;

use crate::types::ModelMessage;

/// Exchanges kept when no capacity is configured.
pub const DEFAULT_MEMORY_WINDOW: usize = 10;

/// One user input and the answer it received.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub user: ModelMessage,
    pub assistant: ModelMessage,
}

/// Keeps the last `capacity` exchanges; older ones are evicted first.
///
/// Only whole exchanges are stored, so the rendered history always
/// alternates user/assistant and holds at most `2 * capacity` messages.
#[derive(Debug, Clone)]
pub struct MemoryWindow {
    capacity: usize,
    exchanges: VecDeque<Exchange>,
}

impl Default for MemoryWindow {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_WINDOW)
    }
}

impl MemoryWindow {
    /// A capacity of 0 keeps nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            exchanges: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored exchanges.
    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        while self.exchanges.len() >= self.capacity {
            self.exchanges.pop_front();
        }
        self.exchanges.push_back(Exchange {
            user: ModelMessage::user(user),
            assistant: ModelMessage::assistant(assistant),
        });
    }

    pub fn exchanges(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter()
    }

    /// History in chronological order, ready to prepend to a prompt.
    pub fn messages(&self) -> Vec<ModelMessage> {
        self.exchanges
            .iter()
            .flat_map(|e| [e.user.clone(), e.assistant.clone()])
            .collect()
    }

    pub fn clear(&mut self) {
        self.exchanges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn evicts_oldest_exchange_first() {
        let mut memory = MemoryWindow::new(2);
        memory.push_exchange("q1", "a1");
        memory.push_exchange("q2", "a2");
        memory.push_exchange("q3", "a3");

        let texts: Vec<String> = memory.messages().iter().map(|m| m.text()).collect();
        assert_eq!(texts, vec!["q2", "a2", "q3", "a3"]);
    }

    #[test]
    fn messages_alternate_roles() {
        let mut memory = MemoryWindow::default();
        memory.push_exchange("hello", "hi");
        let roles: Vec<Role> = memory.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut memory = MemoryWindow::new(0);
        memory.push_exchange("q", "a");
        assert!(memory.is_empty());
        assert!(memory.messages().is_empty());
    }

    #[test]
    fn clear_empties_window_but_keeps_capacity() {
        let mut memory = MemoryWindow::new(3);
        memory.push_exchange("q", "a");
        memory.clear();
        assert!(memory.is_empty());
        assert_eq!(memory.capacity(), 3);
    }
}
