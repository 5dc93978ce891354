//! Plain exports of a parsed conversation
//!
//! Markdown, plain text, and JSON renderings for the CLI. Styling,
//! rasterization, and persistence belong to downstream consumers; this
//! stays deliberately thin.

use crate::error::Result;
use crate::parser::types::{ParseResult, Role};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Text,
    Json,
}

impl ExportFormat {
    /// Parse from string (matches the config/CLI spelling)
    pub fn parse_format(s: &str) -> Option<Self> {
        match s {
            "markdown" | "md" => Some(Self::Markdown),
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Render a parse result in the requested format.
pub fn render(result: &ParseResult, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Markdown => Ok(to_markdown(result)),
        ExportFormat::Text => Ok(to_text(result)),
        ExportFormat::Json => Ok(serde_json::to_string_pretty(result)?),
    }
}

fn speaker_label(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    }
}

fn to_markdown(result: &ParseResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", result.title));
    out.push_str(&format!("> Source: {}\n\n", result.source_url));

    for message in &result.messages {
        out.push_str(&format!("## {}\n\n", speaker_label(message.role)));
        out.push_str(message.content.trim());
        out.push_str("\n\n");
    }

    out
}

fn to_text(result: &ParseResult) -> String {
    let mut out = String::new();
    out.push_str(&result.title);
    out.push('\n');
    out.push_str(&result.source_url);
    out.push('\n');

    for message in &result.messages {
        out.push_str(&format!("\n--- {} ---\n", speaker_label(message.role)));
        out.push_str(message.content.trim());
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::types::ParsedMessage;

    fn sample() -> ParseResult {
        ParseResult {
            title: "Sorting help".to_string(),
            source_url: "https://chatgpt.com/share/abc".to_string(),
            platform: "chatgpt".to_string(),
            messages: vec![
                ParsedMessage {
                    id: "u1".to_string(),
                    role: Role::User,
                    content: "How do I sort?".to_string(),
                    html: String::new(),
                },
                ParsedMessage {
                    id: "a1".to_string(),
                    role: Role::Assistant,
                    content: "Call .sort() on the vector.".to_string(),
                    html: String::new(),
                },
            ],
        }
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(ExportFormat::parse_format("markdown"), Some(ExportFormat::Markdown));
        assert_eq!(ExportFormat::parse_format("md"), Some(ExportFormat::Markdown));
        assert_eq!(ExportFormat::parse_format("json"), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::parse_format("pdf"), None);
    }

    #[test]
    fn test_markdown_shape() {
        let md = render(&sample(), ExportFormat::Markdown).unwrap();
        assert!(md.starts_with("# Sorting help"));
        assert!(md.contains("## You"));
        assert!(md.contains("## Assistant"));
        assert!(md.contains("Call .sort() on the vector."));
    }

    #[test]
    fn test_text_shape() {
        let text = render(&sample(), ExportFormat::Text).unwrap();
        assert!(text.contains("--- You ---"));
        assert!(text.contains("--- Assistant ---"));
    }

    #[test]
    fn test_json_roundtrip() {
        let json = render(&sample(), ExportFormat::Json).unwrap();
        let parsed: ParseResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.messages.len(), 2);
        assert_eq!(parsed.title, "Sorting help");
    }
}
