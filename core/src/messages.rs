//! Outbound combat message sink.

use std::collections::VecDeque;

/// Ordered sink retaining only the most recent combat messages.
#[derive(Clone, Debug)]
pub struct CombatLog {
    retained: usize,
    messages: VecDeque<String>,
}

impl CombatLog {
    /// Creates a sink retaining the last `retained` messages (at least one).
    #[must_use]
    pub fn new(retained: usize) -> Self {
        let retained = retained.max(1);
        Self {
            retained,
            messages: VecDeque::with_capacity(retained),
        }
    }

    /// Appends a message, discarding the oldest once the retention limit is hit.
    pub fn add_combat_message(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("combat: {message}");
        self.messages.push_back(message);
        while self.messages.len() > self.retained {
            let _ = self.messages.pop_front();
        }
    }

    /// Retained messages, oldest first.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    /// Most recent message, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&str> {
        self.messages.back().map(String::as_str)
    }

    /// Reports whether any retained message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|message| message.contains(needle))
    }

    /// Number of retained messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Reports whether no message has been retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for CombatLog {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::CombatLog;

    #[test]
    fn retains_only_latest_messages() {
        let mut log = CombatLog::new(3);
        for index in 0..5 {
            log.add_combat_message(format!("message {index}"));
        }

        let retained: Vec<_> = log.messages().collect();
        assert_eq!(retained, vec!["message 2", "message 3", "message 4"]);
        assert_eq!(log.latest(), Some("message 4"));
    }

    #[test]
    fn zero_retention_still_keeps_latest_message() {
        let mut log = CombatLog::new(0);
        log.add_combat_message("first");
        log.add_combat_message("second");

        assert_eq!(log.len(), 1);
        assert!(log.contains("second"));
    }
}
