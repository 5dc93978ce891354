//! Parser types shared across all platform parsers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a conversation turn.
///
/// Share pages expose more roles than this (tool, system), but only user
/// and assistant turns survive extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Map a role marker from page data to a `Role`. Claude pages say
    /// "human" where ChatGPT pages say "user".
    pub fn from_marker(s: &str) -> Option<Role> {
        match s {
            "user" | "human" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// The opposite role, used by the alternation fallback.
    pub fn other(&self) -> Role {
        match self {
            Role::User => Role::Assistant,
            Role::Assistant => Role::User,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted conversation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedMessage {
    /// Node id from the page data, or a synthetic id when the page
    /// format carries none
    pub id: String,

    /// Turn author
    pub role: Role,

    /// Plain-text content; never empty after trimming
    pub content: String,

    /// Rendered HTML for the turn when extraction came from the DOM;
    /// empty when content is plain text
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub html: String,
}

/// Result of a successful extraction: one per parse call, immutable
/// once built
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResult {
    /// Conversation title
    pub title: String,

    /// The share URL the conversation was extracted from
    pub source_url: String,

    /// Name of the platform parser that produced this result
    pub platform: String,

    /// Ordered conversation turns, root-first
    pub messages: Vec<ParsedMessage>,
}

/// Input for the share store, built directly from a `ParseResult`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShareInput {
    pub title: String,
    pub source_url: String,
    pub messages: Vec<ParsedMessage>,
    pub created_at: DateTime<Utc>,
}

impl From<&ParseResult> for CreateShareInput {
    fn from(result: &ParseResult) -> Self {
        CreateShareInput {
            title: result.title.clone(),
            source_url: result.source_url.clone(),
            messages: result.messages.clone(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_marker() {
        assert_eq!(Role::from_marker("user"), Some(Role::User));
        assert_eq!(Role::from_marker("human"), Some(Role::User));
        assert_eq!(Role::from_marker("assistant"), Some(Role::Assistant));
        assert_eq!(Role::from_marker("tool"), None);
        assert_eq!(Role::from_marker("system"), None);
    }

    #[test]
    fn test_role_other() {
        assert_eq!(Role::User.other(), Role::Assistant);
        assert_eq!(Role::Assistant.other(), Role::User);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_share_input_from_parse_result() {
        let result = ParseResult {
            title: "Demo".to_string(),
            source_url: "https://chatgpt.com/share/abc".to_string(),
            platform: "chatgpt".to_string(),
            messages: vec![ParsedMessage {
                id: "m1".to_string(),
                role: Role::User,
                content: "Hello there".to_string(),
                html: String::new(),
            }],
        };
        let input = CreateShareInput::from(&result);
        assert_eq!(input.title, "Demo");
        assert_eq!(input.messages.len(), 1);
    }
}
