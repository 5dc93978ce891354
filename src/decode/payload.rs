//! Streaming payload discovery
//!
//! Share pages stream their data as script calls of the shape
//! `controller.enqueue("...")` where the string literal is an escaped JSON
//! array, the flat heap the decoder works on. A page usually carries
//! several fragments (bootstrap chunks, router state, the conversation
//! itself); selection keeps the longest fragment that survives
//! double-decoding: outer JSON-string unescape, then JSON-array parse.
//! Fragments failing either step are discarded, never fatal.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static ENQUEUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\.enqueue\("((?:[^"\\]|\\.)*)"\)"#).unwrap());

/// Unescape the captured string literal and parse it as a JSON array.
fn decode_fragment(escaped: &str) -> Option<Vec<Value>> {
    // Re-quote so serde performs the string unescape for us.
    let unescaped: String = serde_json::from_str(&format!("\"{escaped}\"")).ok()?;
    match serde_json::from_str::<Value>(&unescaped).ok()? {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

/// All decodable heap fragments in document order, paired with the length
/// of their escaped source text (the completeness measure used for
/// selection).
fn fragments(html: &str) -> Vec<(usize, Vec<Value>)> {
    ENQUEUE_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let escaped = caps.get(1)?.as_str();
            decode_fragment(escaped).map(|heap| (escaped.len(), heap))
        })
        .collect()
}

/// Longest decodable fragment, ties broken by first occurrence. Fragments
/// whose escaped source is shorter than `min_len` are rejected.
pub fn largest_fragment(html: &str, min_len: usize) -> Option<Vec<Value>> {
    let mut best: Option<(usize, Vec<Value>)> = None;
    for (len, heap) in fragments(html) {
        if len < min_len {
            continue;
        }
        // Strictly-greater keeps the first occurrence on ties.
        if best.as_ref().map_or(true, |(b, _)| len > *b) {
            best = Some((len, heap));
        }
    }
    best.map(|(_, heap)| heap)
}

/// Longest decodable fragment whose heap contains `marker` as a
/// top-level string element.
pub fn fragment_with_marker(html: &str, marker: &str) -> Option<Vec<Value>> {
    let mut best: Option<(usize, Vec<Value>)> = None;
    for (len, heap) in fragments(html) {
        if !heap.iter().any(|v| v.as_str() == Some(marker)) {
            continue;
        }
        if best.as_ref().map_or(true, |(b, _)| len > *b) {
            best = Some((len, heap));
        }
    }
    best.map(|(_, heap)| heap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Embed a heap value as an escaped enqueue literal.
    fn enqueue_script(heap: &Value) -> String {
        let inner = serde_json::to_string(heap).unwrap();
        let literal = serde_json::to_string(&inner).unwrap();
        format!("<script>c.enqueue({literal});</script>")
    }

    #[test]
    fn test_single_fragment_found() {
        let html = enqueue_script(&json!(["a", "b", 3]));
        let heap = largest_fragment(&html, 0).unwrap();
        assert_eq!(heap, vec![json!("a"), json!("b"), json!(3)]);
    }

    #[test]
    fn test_longest_fragment_wins() {
        let short = enqueue_script(&json!([1]));
        let long = enqueue_script(&json!(["a much longer fragment", "with", "more", "slots"]));
        let html = format!("{short}{long}");
        let heap = largest_fragment(&html, 0).unwrap();
        assert_eq!(heap.len(), 4);
    }

    #[test]
    fn test_corrupted_fragment_discarded() {
        // Valid escape, invalid JSON once unescaped.
        let html = r#"<script>c.enqueue("[1, 2,");</script>"#;
        assert!(largest_fragment(html, 0).is_none());
    }

    #[test]
    fn test_non_array_root_discarded() {
        let html = enqueue_script(&json!({"root": "object"}));
        assert!(largest_fragment(&html, 0).is_none());
    }

    #[test]
    fn test_min_length_gate() {
        let html = enqueue_script(&json!([1, 2]));
        assert!(largest_fragment(&html, 4096).is_none());
    }

    #[test]
    fn test_marker_selection_skips_unmarked() {
        let unmarked = enqueue_script(&json!([
            "padding padding padding padding padding",
            "noise"
        ]));
        let marked = enqueue_script(&json!(["serverResponse", "payload"]));
        let html = format!("{unmarked}{marked}");
        let heap = fragment_with_marker(&html, "serverResponse").unwrap();
        assert_eq!(heap[0], json!("serverResponse"));
        assert!(fragment_with_marker(&html, "absentMarker").is_none());
    }

    #[test]
    fn test_escaped_quotes_survive_roundtrip() {
        let heap = json!(["He said \"hi\"", {"k": "v\nw"}]);
        let html = enqueue_script(&heap);
        let decoded = largest_fragment(&html, 0).unwrap();
        assert_eq!(decoded[0], json!("He said \"hi\""));
        assert_eq!(decoded[1], json!({"k": "v\nw"}));
    }
}
