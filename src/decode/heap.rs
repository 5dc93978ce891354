//! Pointer-compacted heap decoder
//!
//! Streamed share payloads arrive as one flat array (the "heap") in which
//! nested structures are flattened into pointer objects: a map whose keys
//! look like `_<N>` where `N` is the heap index holding the real property
//! name, and whose values are heap indices of the property values. This
//! module reconstructs the original nested value from a heap index.
//!
//! Decoding is memoized per call through an index -> value cache. A null
//! placeholder is seeded into the cache before recursing into an index, so
//! self-referential structures resolve to the placeholder instead of
//! recursing forever. Once an index finishes decoding, the real value
//! replaces the placeholder in the cache.

use serde_json::{Map, Value};
use std::collections::HashMap;

/// Decoder over one heap. The cache lives for one decoder instance;
/// callers allocate a fresh decoder per payload.
pub struct HeapDecoder<'a> {
    heap: &'a [Value],
    cache: HashMap<usize, Value>,
}

impl<'a> HeapDecoder<'a> {
    pub fn new(heap: &'a [Value]) -> Self {
        Self {
            heap,
            cache: HashMap::new(),
        }
    }

    /// Fully resolve the value at `index`. Out-of-range indices decode
    /// to null rather than failing.
    pub fn decode(&mut self, index: usize) -> Value {
        if index >= self.heap.len() {
            return Value::Null;
        }
        if let Some(cached) = self.cache.get(&index) {
            return cached.clone();
        }

        // Placeholder first: a cycle back into this index resolves to
        // null instead of recursing.
        self.cache.insert(index, Value::Null);

        let raw = self.heap[index].clone();
        let decoded = self.decode_value(&raw);
        self.cache.insert(index, decoded.clone());
        decoded
    }

    /// Decode a value structurally: arrays treat numeric elements as heap
    /// indices, objects with `_`-prefixed keys are pointer objects, and
    /// everything else passes through unchanged.
    fn decode_value(&mut self, raw: &Value) -> Value {
        match raw {
            Value::Array(items) => {
                let decoded = items.iter().map(|el| self.decode_element(el)).collect();
                Value::Array(decoded)
            }
            Value::Object(map) => {
                if map.keys().any(|k| k.starts_with('_')) {
                    self.decode_pointer_object(map)
                } else {
                    // Opaque literal the encoding did not compact
                    raw.clone()
                }
            }
            _ => raw.clone(),
        }
    }

    /// Array elements that are in-range integers are indices; anything
    /// else (including an out-of-range number) is kept as a literal.
    fn decode_element(&mut self, el: &Value) -> Value {
        if let Some(idx) = el.as_u64() {
            let idx = idx as usize;
            if idx < self.heap.len() {
                return self.decode(idx);
            }
        }
        self.decode_value(el)
    }

    /// Rewrite a pointer object into a plain object. Entries whose
    /// property-name index is out of range or not a string are skipped.
    fn decode_pointer_object(&mut self, map: &Map<String, Value>) -> Value {
        let mut out = Map::new();
        for (key, val) in map {
            let Some(name_idx) = key.strip_prefix('_').and_then(|n| n.parse::<usize>().ok())
            else {
                continue;
            };
            let Some(name) = self.heap.get(name_idx).and_then(|v| v.as_str()) else {
                continue;
            };
            let value = match val.as_u64() {
                Some(idx) if (idx as usize) < self.heap.len() => self.decode(idx as usize),
                _ => self.decode_value(val),
            };
            out.insert(name.to_string(), value);
        }
        Value::Object(out)
    }
}

/// Decode one index with a fresh cache. Convenience for callers that
/// only need a single root.
pub fn decode(heap: &[Value], root_index: usize) -> Value {
    HeapDecoder::new(heap).decode(root_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn heap(v: Value) -> Vec<Value> {
        v.as_array().unwrap().clone()
    }

    #[test]
    fn test_scalar_decodes_to_itself() {
        let h = heap(json!(["hello", 42, null, true]));
        assert_eq!(decode(&h, 0), json!("hello"));
        assert_eq!(decode(&h, 1), json!(42));
        assert_eq!(decode(&h, 2), Value::Null);
        assert_eq!(decode(&h, 3), json!(true));
    }

    #[test]
    fn test_pointer_object_resolves_names_and_values() {
        // {"title": "My chat"}
        let h = heap(json!([{ "_1": 2 }, "title", "My chat"]));
        assert_eq!(decode(&h, 0), json!({"title": "My chat"}));
    }

    #[test]
    fn test_nested_pointer_objects() {
        // {"data": {"title": "Nested"}}
        let h = heap(json!([
            { "_1": 2 },
            "data",
            { "_3": 4 },
            "title",
            "Nested"
        ]));
        assert_eq!(decode(&h, 0), json!({"data": {"title": "Nested"}}));
    }

    #[test]
    fn test_array_elements_are_indices() {
        let h = heap(json!([[1, 2], "first", "second"]));
        assert_eq!(decode(&h, 0), json!(["first", "second"]));
    }

    #[test]
    fn test_array_out_of_range_number_kept_literal() {
        let h = heap(json!([[1, 99], "first"]));
        assert_eq!(decode(&h, 0), json!(["first", 99]));
    }

    #[test]
    fn test_plain_object_passes_through() {
        let h = heap(json!([{ "already": "plain", "n": 7 }]));
        assert_eq!(decode(&h, 0), json!({"already": "plain", "n": 7}));
    }

    #[test]
    fn test_bad_name_index_skipped_not_fatal() {
        // "_99" points past the heap; "_1" resolves to a non-string.
        let h = heap(json!([{ "_99": 2, "_1": 2, "_3": 2 }, 42, "value", "good"]));
        assert_eq!(decode(&h, 0), json!({"good": "value"}));
    }

    #[test]
    fn test_self_reference_terminates() {
        // heap[0] points at itself through its only property
        let h = heap(json!([{ "_1": 0 }, "me"]));
        let decoded = decode(&h, 0);
        assert_eq!(decoded, json!({"me": null}));
    }

    #[test]
    fn test_mutual_cycle_terminates() {
        // 0 -> {"a": 2}, 2 -> {"b": 0}
        let h = heap(json!([{ "_1": 2 }, "a", { "_3": 0 }, "b"]));
        let decoded = decode(&h, 0);
        // Inner reference back to 0 resolves to the placeholder.
        assert_eq!(decoded, json!({"a": {"b": null}}));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let h = heap(json!([
            { "_1": 2, "_3": 4 },
            "mapping",
            { "_3": 4 },
            "title",
            "Stable"
        ]));
        assert_eq!(decode(&h, 0), decode(&h, 0));
    }

    #[test]
    fn test_placeholder_not_returned_after_completion() {
        // Decoding index 1 first must not poison a later decode of 0.
        let h = heap(json!([{ "_1": 2 }, "name", "v"]));
        let mut decoder = HeapDecoder::new(&h);
        assert_eq!(decoder.decode(2), json!("v"));
        assert_eq!(decoder.decode(0), json!({"name": "v"}));
        // Second lookup of a completed index returns the real value.
        assert_eq!(decoder.decode(0), json!({"name": "v"}));
    }

    #[test]
    fn test_out_of_range_root_is_null() {
        let h = heap(json!(["only"]));
        assert_eq!(decode(&h, 5), Value::Null);
    }
}
