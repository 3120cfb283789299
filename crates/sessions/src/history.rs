//! Ordered, append-only conversation log.
//!
//! The log never enforces user/assistant alternation. Truncation is the only
//! way messages leave it, and the orchestrator only ever truncates a copy
//! so the displayed transcript keeps growing.

use cm_domain::{Message, Role, Turn};

/// Default number of user/assistant pairs kept when prompting.
pub const DEFAULT_KEEP_TURNS: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message to the end. No role validation.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Drop everything but the last `2 * keep_turns` messages, in place.
    pub fn truncate(&mut self, keep_turns: usize) {
        let max = keep_turns.saturating_mul(2);
        if self.messages.len() > max {
            self.messages.drain(..self.messages.len() - max);
        }
    }

    /// Copy of the last `2 * keep_turns` messages; `self` is left untouched.
    pub fn truncated(&self, keep_turns: usize) -> Vec<Message> {
        let max = keep_turns.saturating_mul(2);
        let start = self.messages.len().saturating_sub(max);
        self.messages[start..].to_vec()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Render the full log as display turns.
    pub fn turns(&self) -> Vec<Turn> {
        render_turns(&self.messages)
    }
}

impl From<Vec<Message>> for History {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

/// Pair messages strictly by position.
///
/// A user message takes the assistant message directly after it, or `""`
/// when the next message is missing or is another user message. Assistant
/// messages with no user message in front of them are skipped.
pub fn render_turns(messages: &[Message]) -> Vec<Turn> {
    let mut turns = Vec::with_capacity(messages.len() / 2 + 1);
    let mut i = 0;
    while i < messages.len() {
        let msg = &messages[i];
        if msg.role() != Role::User {
            i += 1;
            continue;
        }
        match messages.get(i + 1) {
            Some(next) if next.role() == Role::Assistant => {
                turns.push(Turn::new(msg.content(), next.content()));
                i += 2;
            }
            _ => {
                turns.push(Turn::new(msg.content(), ""));
                i += 1;
            }
        }
    }
    turns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> History {
        let mut h = History::new();
        for i in 0..n {
            if i % 2 == 0 {
                h.append(Message::user(format!("m{i}")));
            } else {
                h.append(Message::assistant(format!("m{i}")));
            }
        }
        h
    }

    #[test]
    fn truncated_keeps_min_of_len_and_window() {
        for n in [0, 1, 5, 12, 13, 30] {
            let h = numbered(n);
            let kept = h.truncated(DEFAULT_KEEP_TURNS);
            assert_eq!(kept.len(), n.min(12), "n = {n}");
            // Always the most recent ones, in order.
            let expected: Vec<String> = (n.saturating_sub(12)..n).map(|i| format!("m{i}")).collect();
            let got: Vec<&str> = kept.iter().map(|m| m.content()).collect();
            assert_eq!(got, expected);
            // The source is never touched.
            assert_eq!(h.len(), n);
        }
    }

    #[test]
    fn truncate_in_place() {
        let mut h = numbered(15);
        h.truncate(2);
        let got: Vec<&str> = h.messages().iter().map(|m| m.content()).collect();
        assert_eq!(got, vec!["m11", "m12", "m13", "m14"]);
    }

    #[test]
    fn truncate_zero_turns_empties() {
        let mut h = numbered(3);
        h.truncate(0);
        assert!(h.is_empty());
    }

    #[test]
    fn pairs_by_position() {
        let h = History::from(vec![
            Message::user("A"),
            Message::assistant("B"),
            Message::user("C"),
        ]);
        assert_eq!(h.turns(), vec![Turn::new("A", "B"), Turn::new("C", "")]);
    }

    #[test]
    fn leading_assistant_is_skipped() {
        let h = History::from(vec![Message::assistant("X"), Message::user("Y")]);
        assert_eq!(h.turns(), vec![Turn::new("Y", "")]);
    }

    #[test]
    fn consecutive_users_each_get_a_turn() {
        let h = History::from(vec![
            Message::user("a"),
            Message::user("b"),
            Message::assistant("c"),
            Message::assistant("d"),
        ]);
        assert_eq!(h.turns(), vec![Turn::new("a", ""), Turn::new("b", "c")]);
    }

    #[test]
    fn empty_history_renders_nothing() {
        assert!(History::new().turns().is_empty());
    }
}
