use std::fmt;

use crate::ValidationError;

pub const WELCOME_GREETING: &str = "Hello! I'm your AI assistant. How can I help you?";
pub const CLEARED_GREETING: &str = "Chat history cleared. How can I help you?";

pub fn service_greeting(service: &str) -> String {
    format!("Switched to the {service} service. How can I help you?")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Ai,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::User => "User",
            Role::Ai => "AI",
            Role::System => "System",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub session_id: String,
}

/// Ordered, append-only record of one chat session. Only [`ChatLog::clear`]
/// removes messages, and it always leaves a single system greeting behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLog {
    session_id: String,
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    /// A new log holding the welcome greeting.
    pub fn start(session_id: impl Into<String>) -> Self {
        let mut log = Self {
            session_id: session_id.into(),
            messages: Vec::new(),
        };
        log.append(Role::System, WELCOME_GREETING);
        log
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) -> &ChatMessage {
        self.messages.push(ChatMessage {
            role,
            content: content.into(),
            session_id: self.session_id.clone(),
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn clear(&mut self, greeting: impl Into<String>) {
        self.messages.clear();
        self.append(Role::System, greeting);
    }

    /// Plain-text export: `Role: content` per message, separated by blank
    /// lines.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}\n", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Trims a message typed by the user; blank input is refused.
pub fn prepare_outgoing(text: &str) -> Result<&str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyMessage);
    }
    Ok(trimmed)
}
