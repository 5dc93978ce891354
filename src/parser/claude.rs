//! Claude share-page parser
//!
//! Claude pages carry the conversation as literal JSON under a
//! `chat_messages` array rather than a compacted heap, so this parser
//! uses a generic JSON-array search followed by manual recovery.

use crate::classify;
use crate::config::HttpConfig;
use crate::error::{ExtractError, Result};
use crate::extract::{manual, Extraction, FallbackChain};
use crate::fetch::PageFetcher;
use crate::parser::types::{ParseResult, ParsedMessage, Role};
use crate::parser::PlatformParser;
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

const URL_PATTERNS: &[&str] = &["claude.ai/share/"];

/// Title used when the page carries none.
const DEFAULT_TITLE: &str = "Claude Conversation";

/// Parser for Claude share pages
pub struct ClaudeParser {
    fetcher: PageFetcher,
}

impl ClaudeParser {
    pub fn new(http: &HttpConfig) -> Result<Self> {
        Ok(Self {
            fetcher: PageFetcher::new(http)?,
        })
    }
}

#[async_trait]
impl PlatformParser for ClaudeParser {
    fn name(&self) -> &'static str {
        "claude"
    }

    fn url_patterns(&self) -> &'static [&'static str] {
        URL_PATTERNS
    }

    fn extract_from_document(&self, url: &str, html: &str) -> Result<ParseResult> {
        let chain = FallbackChain::new()
            .with("chat-messages", extract_chat_messages)
            .with("manual", manual::extract);

        let (extraction, outcome) = chain.run(html);
        match extraction {
            Some(extraction) => {
                info!(
                    strategy = outcome.winner.as_deref().unwrap_or("unknown"),
                    messages = extraction.messages.len(),
                    "extraction succeeded"
                );
                Ok(ParseResult {
                    title: extraction
                        .title
                        .or_else(|| manual::page_title(html))
                        .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
                    source_url: url.to_string(),
                    platform: self.name().to_string(),
                    messages: extraction.messages,
                })
            }
            None => Err(ExtractError::NoMessagesFound {
                title: manual::page_title(html),
                attempted: outcome.attempted,
                errors: outcome.errors,
            }),
        }
    }

    async fn parse(&self, url: &str) -> Result<ParseResult> {
        let html = self.fetcher.fetch(url).await?;
        self.extract_from_document(url, &html)
    }
}

/// Find the embedded `chat_messages` array and convert each entry.
/// Claude says "human" where the normalized model says user.
fn extract_chat_messages(html: &str) -> Result<Extraction> {
    let Some(key_pos) = html.find("\"chat_messages\"") else {
        return Ok(Extraction::empty());
    };
    let Some(array_text) = balanced_json_array(&html[key_pos..]) else {
        return Ok(Extraction::empty());
    };
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(array_text) else {
        return Ok(Extraction::empty());
    };

    let messages = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let role = item
                .get("sender")
                .or_else(|| item.get("role"))
                .and_then(|s| s.as_str())
                .and_then(Role::from_marker)?;
            let content = message_text(item)?;
            let trimmed = content.trim();
            if trimmed.is_empty() || !classify::is_valid_message_content(trimmed) {
                return None;
            }
            let id = item
                .get("uuid")
                .and_then(|u| u.as_str())
                .map(|u| u.to_string())
                .unwrap_or_else(|| format!("claude-{index}"));
            Some(ParsedMessage {
                id,
                role,
                content: trimmed.to_string(),
                html: String::new(),
            })
        })
        .collect();

    Ok(Extraction {
        title: None,
        messages,
    })
}

/// Message text is either a plain `text` field or an array of typed
/// content blocks.
fn message_text(item: &Value) -> Option<String> {
    if let Some(text) = item.get("text").and_then(|t| t.as_str()) {
        return Some(text.to_string());
    }
    let blocks = item.get("content")?.as_array()?;
    let joined = blocks
        .iter()
        .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
        .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
        .collect::<Vec<_>>()
        .join("\n\n");
    (!joined.is_empty()).then_some(joined)
}

/// Slice out the first balanced `[...]` after the current position,
/// respecting string literals and escapes.
fn balanced_json_array(s: &str) -> Option<&str> {
    let start = s.find('[')?;
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'[' if !in_string => depth += 1,
            b']' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
