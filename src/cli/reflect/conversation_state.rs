use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Role name as the chat completions API expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Short label used when printing the conversation history
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Assistant => "AI",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the conversation. Fields are private so a message cannot
/// change after it is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Append-only message history shared by the generate and reflect nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    /// Start a conversation from the seed request.
    pub fn seeded(request: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(request)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Most recent message carrying `role`
    pub fn last_from(&self, role: Role) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == role)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_state_holds_one_user_message() {
        let state = ConversationState::seeded("Make this tweet better: \"hello world\"");

        assert_eq!(state.len(), 1);
        assert!(!state.is_empty());
        let seed = state.last().unwrap();
        assert_eq!(seed.role(), Role::User);
        assert_eq!(seed.content(), "Make this tweet better: \"hello world\"");
    }

    #[test]
    fn push_preserves_insertion_order() {
        let mut state = ConversationState::seeded("seed");
        state.push(Message::assistant("draft"));
        state.push(Message::user("critique"));
        state.push(Message::assistant("revision"));

        let contents: Vec<&str> = state.messages().iter().map(Message::content).collect();
        assert_eq!(contents, vec!["seed", "draft", "critique", "revision"]);
        assert_eq!(state.last().unwrap().content(), "revision");
    }

    #[test]
    fn last_from_finds_latest_message_of_role() {
        let mut state = ConversationState::seeded("seed");
        assert!(state.last_from(Role::Assistant).is_none());

        state.push(Message::assistant("first draft"));
        state.push(Message::user("critique"));
        state.push(Message::assistant("second draft"));
        state.push(Message::user("more critique"));

        assert_eq!(state.last_from(Role::Assistant).unwrap().content(), "second draft");
        assert_eq!(state.last_from(Role::User).unwrap().content(), "more critique");
    }

    #[test]
    fn role_names_match_chat_api() {
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!(Role::User.label(), "USER");
        assert_eq!(Role::Assistant.label(), "AI");
    }
}
