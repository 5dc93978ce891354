//! Structured extraction via the conversation-graph encoding
//!
//! ChatGPT share pages embed a server-response envelope inside the
//! streamed heap. Decoding the envelope yields `data.mapping`: a node map
//! keyed by id, where each node optionally carries a message plus
//! parent/children links, forming a tree of edits. The active conversation path
//! is recovered by walking `parent` pointers up from `current_node`,
//! which correctly follows the most recently edited branch.

use crate::decode::{payload, HeapDecoder};
use crate::error::Result;
use crate::extract::chain::Extraction;
use crate::parser::types::{ParsedMessage, Role};
use serde_json::{Map, Value};
use tracing::debug;

/// Top-level marker distinguishing the conversation fragment from the
/// page's other streamed chunks.
pub const SERVER_RESPONSE_MARKER: &str = "serverResponse";

/// Title used when the envelope carries none.
pub const DEFAULT_TITLE: &str = "ChatGPT Conversation";

/// Well-known synthetic root inserted by the client above the first
/// real turn.
const SYNTHETIC_ROOT_ID: &str = "client-created-root";

/// Hard cap on tree-walk iterations so malformed graphs terminate.
const MAX_WALK_STEPS: usize = 2048;

/// Recover the conversation from the graph encoding. Returns an empty
/// extraction (not an error) when the page has no marker fragment or the
/// walk yields zero messages, so the orchestrator moves on.
pub fn extract(html: &str) -> Result<Extraction> {
    let Some(heap) = payload::fragment_with_marker(html, SERVER_RESPONSE_MARKER) else {
        return Ok(Extraction::empty());
    };

    let Some(envelope) = decode_envelope(&heap) else {
        return Ok(Extraction::empty());
    };

    let Some(data) = envelope.get("data") else {
        return Ok(Extraction::empty());
    };
    let Some(mapping) = data.get("mapping").and_then(|m| m.as_object()) else {
        return Ok(Extraction::empty());
    };

    let title = data
        .get("title")
        .or_else(|| envelope.get("title"))
        .and_then(|t| t.as_str())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE)
        .to_string();

    let current_node = data.get("current_node").and_then(|c| c.as_str());
    let messages = messages_from_mapping(mapping, current_node);
    debug!(nodes = mapping.len(), messages = messages.len(), "graph walk complete");

    Ok(Extraction {
        title: Some(title),
        messages,
    })
}

/// Find the heap index holding the marker string, then decode the
/// pointer object that references it to obtain the envelope.
fn decode_envelope(heap: &[Value]) -> Option<Value> {
    let marker_idx = heap
        .iter()
        .position(|v| v.as_str() == Some(SERVER_RESPONSE_MARKER))?;
    let pointer_key = format!("_{marker_idx}");

    let mut decoder = HeapDecoder::new(heap);
    for index in 0..heap.len() {
        let has_key = heap[index]
            .as_object()
            .is_some_and(|m| m.contains_key(&pointer_key));
        if !has_key {
            continue;
        }
        let decoded = decoder.decode(index);
        if let Some(envelope) = decoded.get(SERVER_RESPONSE_MARKER) {
            if envelope.is_object() {
                return Some(envelope.clone());
            }
        }
    }
    None
}

/// Walk the node map and convert the active path into ordered messages.
/// Shared with the manual extractor's hydration-JSON path, which feeds
/// a literal (already-decoded) mapping through the same rules.
pub fn messages_from_mapping(
    mapping: &Map<String, Value>,
    current_node: Option<&str>,
) -> Vec<ParsedMessage> {
    conversation_path(mapping, current_node)
        .iter()
        .filter_map(|id| message_from_node(id, mapping.get(id)?))
        .collect()
}

/// Node ids along the active conversation path, root-first.
fn conversation_path(mapping: &Map<String, Value>, current_node: Option<&str>) -> Vec<String> {
    if let Some(current) = current_node.filter(|c| mapping.contains_key(*c)) {
        // Walk parent pointers leaf -> root, then reverse.
        let mut path = Vec::new();
        let mut cursor = Some(current.to_string());
        let mut steps = 0;
        while let Some(id) = cursor {
            if steps >= MAX_WALK_STEPS || path.contains(&id) {
                break;
            }
            steps += 1;
            cursor = mapping
                .get(&id)
                .and_then(|n| n.get("parent"))
                .and_then(|p| p.as_str())
                .map(|p| p.to_string());
            path.push(id);
        }
        path.reverse();
        return path;
    }

    // No resolvable current node: descend from the synthetic root,
    // preferring the last (most recent) child at each level.
    let mut path = Vec::new();
    let mut cursor = SYNTHETIC_ROOT_ID.to_string();
    let mut steps = 0;
    while steps < MAX_WALK_STEPS {
        steps += 1;
        let Some(node) = mapping.get(&cursor) else {
            break;
        };
        path.push(cursor.clone());
        let next = node
            .get("children")
            .and_then(|c| c.as_array())
            .and_then(|c| c.last())
            .and_then(|c| c.as_str())
            .map(|c| c.to_string());
        match next {
            Some(child) if !path.contains(&child) => cursor = child,
            _ => break,
        }
    }
    path
}

/// A node contributes a message only when its author role is a
/// conversation role, its content is plain text, and its joined parts
/// are non-blank. Anything else is skipped without aborting the walk.
fn message_from_node(id: &str, node: &Value) -> Option<ParsedMessage> {
    let message = node.get("message")?;

    let role = message
        .get("author")
        .and_then(|a| a.get("role"))
        .and_then(|r| r.as_str())
        .and_then(|r| match r {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        })?;

    let content = message.get("content")?;
    if content.get("content_type").and_then(|t| t.as_str()) != Some("text") {
        return None;
    }

    let joined = content
        .get("parts")?
        .as_array()?
        .iter()
        .filter_map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        return None;
    }

    Some(ParsedMessage {
        id: id.to_string(),
        role,
        content: trimmed.to_string(),
        html: String::new(),
    })
}
