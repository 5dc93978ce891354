//! Manual extraction from markup and loose embedded JSON
//!
//! Last resort when neither the streamed heap nor the graph encoding is
//! usable. Three ordered attempts, first success wins: a regex scan for
//! repeating `"parts": [...]` shapes in script bodies, a literal
//! hydration-JSON walk of `data.mapping`, and finally the rendered DOM
//! itself.

use crate::classify;
use crate::error::Result;
use crate::extract::chain::Extraction;
use crate::extract::structured;
use crate::parser::types::{ParsedMessage, Role};
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>(.*?)</script>").unwrap());

static PARTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""parts"\s*:\s*\[\s*"((?:[^"\\]|\\.)*)""#).unwrap());

/// Recursion depth for the hydration-JSON mapping search.
const HYDRATION_SEARCH_DEPTH: usize = 12;

/// Elements that render conversation turns, in probe order.
const TURN_SELECTORS: &[&str] = &[
    "[data-message-author-role]",
    "[data-testid^=\"conversation-turn\"]",
    "[data-message-id]",
];

pub fn extract(html: &str) -> Result<Extraction> {
    let title = page_title(html);

    if let Some(messages) = extract_from_script_parts(html) {
        debug!(messages = messages.len(), "script parts scan matched");
        return Ok(Extraction {
            title,
            messages,
        });
    }

    if let Some(messages) = extract_from_hydration_json(html) {
        debug!(messages = messages.len(), "hydration JSON walk matched");
        return Ok(Extraction {
            title,
            messages,
        });
    }

    let messages = extract_from_dom(html);
    Ok(Extraction {
        title,
        messages,
    })
}

/// Attempt (a): repeating `"parts": ["..."]` shapes inside script bodies.
/// Roles are unknowable here, so turns alternate starting at user.
fn extract_from_script_parts(html: &str) -> Option<Vec<ParsedMessage>> {
    let mut messages = Vec::new();
    let mut role = Role::User;

    for script in SCRIPT_RE.captures_iter(html) {
        let body = script.get(1).map_or("", |m| m.as_str());
        for caps in PARTS_RE.captures_iter(body) {
            let Some(escaped) = caps.get(1) else {
                continue;
            };
            let Ok(text) = serde_json::from_str::<String>(&format!("\"{}\"", escaped.as_str()))
            else {
                continue;
            };
            if !classify::is_valid_message_content(&text) {
                continue;
            }
            messages.push(ParsedMessage {
                id: format!("script-{}", messages.len()),
                role,
                content: text.trim().to_string(),
                html: String::new(),
            });
            role = role.other();
        }
    }

    (!messages.is_empty()).then_some(messages)
}

/// Attempt (b): a hydration-data script block holding literal JSON.
/// When it carries a `mapping` node map, the structured walk applies
/// as-is, minus the pointer decoding.
fn extract_from_hydration_json(html: &str) -> Option<Vec<ParsedMessage>> {
    for script in SCRIPT_RE.captures_iter(html) {
        let body = script.get(1).map_or("", |m| m.as_str()).trim();
        if !(body.starts_with('{') || body.starts_with('[')) {
            continue;
        }
        let Ok(value) = serde_json::from_str::<Value>(body) else {
            continue;
        };
        if let Some(messages) = find_mapping_walk(&value, HYDRATION_SEARCH_DEPTH) {
            if !messages.is_empty() {
                return Some(messages);
            }
        }
    }
    None
}

/// Depth-bounded search for an object holding a `mapping` key; its
/// sibling `current_node` seeds the walk when present.
fn find_mapping_walk(value: &Value, depth: usize) -> Option<Vec<ParsedMessage>> {
    if depth == 0 {
        return None;
    }
    match value {
        Value::Object(map) => {
            if let Some(mapping) = map.get("mapping").and_then(|m| m.as_object()) {
                let current = map.get("current_node").and_then(|c| c.as_str());
                return Some(structured::messages_from_mapping(mapping, current));
            }
            map.values()
                .find_map(|v| find_mapping_walk(v, depth - 1))
        }
        Value::Array(items) => items.iter().find_map(|v| find_mapping_walk(v, depth - 1)),
        _ => None,
    }
}

/// Attempt (c): the rendered document structure. Role comes from the
/// element's role attribute when present, otherwise turns alternate by
/// position starting at user.
fn extract_from_dom(html: &str) -> Vec<ParsedMessage> {
    let document = Html::parse_document(html);
    let mut messages = Vec::new();

    for selector_str in TURN_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        let mut fallback_role = Role::User;

        for element in document.select(&selector) {
            let text = element.text().collect::<String>();
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }
            let role = element
                .value()
                .attr("data-message-author-role")
                .and_then(Role::from_marker)
                .unwrap_or(fallback_role);
            fallback_role = role.other();

            messages.push(ParsedMessage {
                id: format!("dom-{}", messages.len()),
                role,
                content: trimmed.to_string(),
                html: element.inner_html(),
            });
        }

        if !messages.is_empty() {
            break;
        }
    }

    messages
}

/// Best-effort page title from meta tags, used both for extraction
/// results and for failure diagnostics.
pub fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let og = Selector::parse("meta[property=\"og:title\"]").ok()?;
    if let Some(content) = document
        .select(&og)
        .next()
        .and_then(|el| el.value().attr("content"))
    {
        let trimmed = content.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }

    let title = Selector::parse("title").ok()?;
    document
        .select(&title)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_script_parts_alternate_roles() {
        let html = r#"
            <html><body><script>
                push({"parts": ["What does the borrow checker do?"]});
                push({"parts": ["It rejects aliasing violations at compile time."]});
            </script></body></html>
        "#;

        let extraction = extract(html).unwrap();
        assert_eq!(extraction.messages.len(), 2);
        assert_eq!(extraction.messages[0].role, Role::User);
        assert_eq!(extraction.messages[1].role, Role::Assistant);
    }

    #[test]
    fn test_script_parts_skips_invalid_content() {
        let html = r#"<script>{"parts": ["user"]} {"parts": ["A real question, with substance?"]}</script>"#;
        let extraction = extract(html).unwrap();
        assert_eq!(extraction.messages.len(), 1);
        assert!(extraction.messages[0].content.starts_with("A real question"));
    }

    #[test]
    fn test_hydration_json_mapping_walk() {
        let state = json!({
            "props": {
                "conversation": {
                    "current_node": "a1",
                    "mapping": {
                        "u1": {
                            "children": ["a1"],
                            "message": {
                                "author": { "role": "user" },
                                "content": { "content_type": "text", "parts": ["Hydrated question text"] }
                            }
                        },
                        "a1": {
                            "parent": "u1",
                            "children": [],
                            "message": {
                                "author": { "role": "assistant" },
                                "content": { "content_type": "text", "parts": ["Hydrated answer text"] }
                            }
                        }
                    }
                }
            }
        });
        let html = format!(
            "<html><body><script type=\"application/json\">{state}</script></body></html>"
        );

        let messages = extract_from_hydration_json(&html).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "Hydrated question text");
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[test]
    fn test_dom_turns_with_role_attributes() {
        let html = r#"
            <html><head><title>Chat - Shared</title></head><body>
                <div data-message-author-role="user">Could you review my diff?</div>
                <div data-message-author-role="assistant">Sure, paste it here.</div>
            </body></html>
        "#;

        let extraction = extract(html).unwrap();
        assert_eq!(extraction.messages.len(), 2);
        assert_eq!(extraction.messages[0].role, Role::User);
        assert_eq!(extraction.messages[1].role, Role::Assistant);
        assert_eq!(extraction.title.as_deref(), Some("Chat - Shared"));
    }

    #[test]
    fn test_dom_alternation_without_role_attributes() {
        let html = r#"
            <html><body>
                <div data-message-id="1">First turn text</div>
                <div data-message-id="2">Second turn text</div>
                <div data-message-id="3">Third turn text</div>
            </body></html>
        "#;

        let extraction = extract(html).unwrap();
        assert_eq!(extraction.messages.len(), 3);
        assert_eq!(extraction.messages[0].role, Role::User);
        assert_eq!(extraction.messages[1].role, Role::Assistant);
        assert_eq!(extraction.messages[2].role, Role::User);
    }

    #[test]
    fn test_og_title_preferred() {
        let html = r#"
            <html><head>
                <meta property="og:title" content="Weekend planning chat" />
                <title>Fallback title</title>
            </head><body></body></html>
        "#;
        assert_eq!(page_title(html).as_deref(), Some("Weekend planning chat"));
    }

    #[test]
    fn test_empty_page_yields_empty_extraction() {
        let extraction = extract("<html><body><p>Nothing here</p></body></html>").unwrap();
        assert!(extraction.messages.is_empty());
    }
}
