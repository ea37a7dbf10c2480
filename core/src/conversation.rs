//! Conversation history for the interactive chat

use crate::llm::LlmMessage;

/// Ordered, append-only list of conversation turns
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<LlmMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user<S: Into<String>>(&mut self, text: S) {
        self.messages.push(LlmMessage::user(text));
    }

    pub fn push_assistant<S: Into<String>>(&mut self, text: S) {
        self.messages.push(LlmMessage::assistant(text));
    }

    pub fn messages(&self) -> &[LlmMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MessageRole;

    #[test]
    fn test_each_exchange_adds_two_turns() {
        let mut conversation = Conversation::new();
        assert!(conversation.is_empty());

        conversation.push_user("hi");
        conversation.push_assistant("hello");
        assert_eq!(conversation.len(), 2);

        conversation.push_user("hi");
        conversation.push_assistant("hello again");
        assert_eq!(conversation.len(), 4);

        let roles: Vec<MessageRole> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant
            ]
        );
        assert_eq!(conversation.messages()[2].get_text().as_deref(), Some("hi"));
    }
}
