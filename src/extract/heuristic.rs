//! Heuristic extraction from the flat heap
//!
//! When the graph encoding is absent or fails to decode, messages can
//! still be recovered positionally: in the flat encoding a message body
//! shows up as a single-element array immediately followed by its content
//! string. Candidates are filtered through the content classifier, roles
//! are inferred from nearby role pointers, and near-duplicates are
//! collapsed by content prefix.

use crate::classify;
use crate::decode::payload;
use crate::error::Result;
use crate::extract::chain::Extraction;
use crate::parser::types::{ParsedMessage, Role};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Fragments shorter than this cannot hold a conversation.
const MIN_FRAGMENT_LEN: usize = 512;

/// Elements scanned backward from a candidate when resolving its role.
const ROLE_LOOKBACK: usize = 48;

/// Candidates sharing this content prefix are considered duplicates.
const DEDUP_PREFIX_LEN: usize = 200;

/// Recover messages by positional pattern-matching over the largest
/// streamed fragment. Returns empty when no candidates survive
/// filtering.
pub fn extract(html: &str) -> Result<Extraction> {
    let Some(heap) = payload::largest_fragment(html, MIN_FRAGMENT_LEN) else {
        return Ok(Extraction::empty());
    };

    // Precomputed role lookup: heap index -> role, for every slot that
    // holds a bare role marker.
    let role_indices: HashMap<usize, Role> = heap
        .iter()
        .enumerate()
        .filter_map(|(i, v)| {
            v.as_str()
                .and_then(Role::from_marker)
                .map(|role| (i, role))
        })
        .collect();

    // The pointer key that tags a role property in compacted objects:
    // "_<index of the literal "role" string>".
    let role_pointer_key = heap
        .iter()
        .position(|v| v.as_str() == Some("role"))
        .map(|i| format!("_{i}"));

    let mut seen_prefixes = HashSet::new();
    let mut candidates: Vec<(Option<Role>, String)> = Vec::new();

    for i in 0..heap.len().saturating_sub(1) {
        let single_element = heap[i].as_array().is_some_and(|a| a.len() == 1);
        if !single_element {
            continue;
        }
        let Some(text) = heap[i + 1].as_str() else {
            continue;
        };
        if !classify::is_valid_message_content(text) {
            continue;
        }
        if classify::is_reasoning_context(&heap, i + 1)
            || classify::is_filtered_context(&heap, i + 1)
            || classify::looks_like_standalone_code(text)
        {
            continue;
        }

        // Keep the first occurrence of near-identical content.
        let prefix: String = text.chars().take(DEDUP_PREFIX_LEN).collect();
        if !seen_prefixes.insert(prefix) {
            continue;
        }

        let role = detect_role(&heap, i, &role_indices, role_pointer_key.as_deref());
        candidates.push((role, text.trim().to_string()));
    }

    debug!(candidates = candidates.len(), "heuristic scan complete");

    // Candidates with no detected role alternate from the last known
    // role, starting at user. This is a guess and a known source of
    // misattribution when detection fails on every turn.
    let mut last_role: Option<Role> = None;
    let messages = candidates
        .into_iter()
        .enumerate()
        .map(|(index, (detected, content))| {
            let role = detected.unwrap_or_else(|| match last_role {
                Some(prev) => prev.other(),
                None => Role::User,
            });
            last_role = Some(role);
            ParsedMessage {
                id: format!("heuristic-{index}"),
                role,
                content,
                html: String::new(),
            }
        })
        .collect();

    Ok(Extraction {
        title: None,
        messages,
    })
}

/// Resolve a candidate's role by scanning backward within the window.
/// A pointer object carrying the role-pointer key wins; failing that,
/// the nearest bare role keyword is used.
fn detect_role(
    heap: &[Value],
    position: usize,
    role_indices: &HashMap<usize, Role>,
    role_pointer_key: Option<&str>,
) -> Option<Role> {
    let start = position.saturating_sub(ROLE_LOOKBACK);

    if let Some(key) = role_pointer_key {
        for slot in heap[start..position].iter().rev() {
            let Some(obj) = slot.as_object() else {
                continue;
            };
            let Some(target) = obj.get(key).and_then(|v| v.as_u64()) else {
                continue;
            };
            if let Some(role) = role_indices.get(&(target as usize)) {
                return Some(*role);
            }
        }
    }

    for slot in heap[start..position].iter().rev() {
        if let Some(role) = slot.as_str().and_then(Role::from_marker) {
            return Some(role);
        }
    }

    None
}
