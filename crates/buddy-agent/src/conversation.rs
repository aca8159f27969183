//! Conversation memory for follow-up questions.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Buddy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

/// Bounded chat history plus what the last forecast was about.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: VecDeque<Turn>,
    max_turns: usize,
    last_location: Option<String>,
    last_summary: Option<String>,
}

impl Conversation {
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(max_turns),
            max_turns,
            ..Self::default()
        }
    }

    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        if self.max_turns == 0 {
            return;
        }
        while self.turns.len() >= self.max_turns {
            self.turns.pop_front();
        }
        self.turns.push_back(Turn {
            speaker,
            text: text.into(),
        });
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Record a successful forecast so follow-ups can reuse its location.
    pub fn remember(&mut self, location: impl Into<String>, summary: impl Into<String>) {
        self.last_location = Some(location.into());
        self.last_summary = Some(summary.into());
    }

    pub fn last_location(&self) -> Option<&str> {
        self.last_location.as_deref()
    }

    pub fn last_summary(&self) -> Option<&str> {
        self.last_summary.as_deref()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.last_location = None;
        self.last_summary = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_bounded() {
        let mut conversation = Conversation::new(3);
        for i in 0..5 {
            conversation.push(Speaker::User, format!("message {i}"));
        }
        assert_eq!(conversation.len(), 3);
        let texts: Vec<_> = conversation.turns().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["message 2", "message 3", "message 4"]);
    }

    #[test]
    fn zero_turns_keeps_nothing() {
        let mut conversation = Conversation::new(0);
        conversation.push(Speaker::Buddy, "hello");
        assert!(conversation.is_empty());
    }

    #[test]
    fn remember_and_clear() {
        let mut conversation = Conversation::new(4);
        conversation.remember("Toronto", "Toronto, afternoon: about 10°C");
        assert_eq!(conversation.last_location(), Some("Toronto"));
        assert!(conversation.last_summary().unwrap().starts_with("Toronto"));

        conversation.clear();
        assert_eq!(conversation.last_location(), None);
        assert_eq!(conversation.last_summary(), None);
    }
}
