//! Content classification heuristics
//!
//! Pure functions that decide whether a candidate string pulled out of a
//! flat heap is real message content, standalone code, reasoning output,
//! or serialization noise. The keyword and pattern sets are compiled once
//! as immutable statics; nothing here holds state between calls.

use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;
use uuid::Uuid;

/// Elements scanned backward from a candidate when looking for
/// tool/system/code markers.
pub const CONTEXT_LOOKBACK: usize = 40;

/// Elements scanned forward from a candidate.
pub const CONTEXT_LOOKAHEAD: usize = 12;

/// Backward window for reasoning-block detection.
const REASONING_LOOKBACK: usize = 25;

/// Line-classification threshold: above this code-line ratio a
/// multi-line string counts as code.
const CODE_RATIO_THRESHOLD: f64 = 0.7;

/// Text lines tolerated inside a code classification (docstrings,
/// stray prose).
const TEXT_LINE_CAP: usize = 2;

/// Serialization vocabulary that shows up as standalone heap strings.
static METADATA_KEYWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "user",
        "assistant",
        "system",
        "tool",
        "author",
        "role",
        "content",
        "content_type",
        "parts",
        "message",
        "messages",
        "metadata",
        "mapping",
        "children",
        "parent",
        "text",
        "title",
        "model",
        "status",
        "weight",
        "create_time",
        "update_time",
        "finished_successfully",
        "in_progress",
        "absolute",
        "hidden",
        "visible",
        "auto",
        "all",
        "none",
        "root",
        "stop",
        "done",
        "pending",
        "success",
        "unknown",
        "default",
        "thoughts",
        "reasoning_recap",
        "serverResponse",
        "canvas",
        "python",
        "multimodal_text",
        "execution_output",
    ])
});

/// Roles whose turns never become messages.
static FILTERED_ROLES: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| HashSet::from(["tool", "system"]));

/// Content-type markers for turns that are not plain conversation text.
static FILTERED_CONTENT_TYPES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "code",
        "execution_output",
        "system_error",
        "tether_quote",
        "tether_browsing_display",
        "model_editable_context",
        "user_editable_context",
        "memories",
        "multimodal_text",
    ])
});

/// Markers for reasoning/thinking blocks.
static REASONING_MARKERS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "thoughts",
        "reasoning_recap",
        "reasoning_status",
        "summaries",
    ])
});

static INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());

static DECIMAL_TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\d+$").unwrap());

static MODEL_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(gpt|chatgpt|o[0-9]|claude|gemini|davinci)([.:_-][0-9a-z.:_-]*)?$").unwrap()
});

static OPAQUE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{6,32}$").unwrap());

static DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*(\.[a-z0-9][a-z0-9-]*)+$").unwrap());

// First-line signals that short-circuit straight to "code".
static STRONG_CODE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(import\s+[\w.]+|from\s+[\w.]+\s+import\b|def\s+\w+\s*\(|class\s+\w+\s*[:(]|@\w+)")
        .unwrap()
});

static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*•]\s+").unwrap());
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{1,6}\s").unwrap());
static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[.)]\s+").unwrap());
static PROBLEM_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Problem|Example|Question|Answer|Note|Step|Solution|Hint)\b").unwrap()
});
static CAP_SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z'’]+[,;]?\s+\w").unwrap());
static FOR_PROSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^for\s+\w+\s+\w+").unwrap());

static ASSIGNMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][\w.\[\]]*\s*=[^=]").unwrap());
static CONTROL_FLOW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(if|elif|else|while|return|try|except|finally|with|switch|case|const|let|var|fn|func)\b")
        .unwrap()
});
static FOR_IN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^for\b.*\bin\b").unwrap());
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#|//|/\*)").unwrap());
static DEF_IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(def|class|import|from)\b").unwrap());
static DOTTED_CALL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w\.\w+\(").unwrap());
static BARE_CALL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w.]+\(.*\)\s*$").unwrap());
static BRACKET_LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\[{].*[\]}],?$").unwrap());
static TUPLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\(.*,.*\)$").unwrap());

static EXPRESSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9\s+*/%^().=x<>!-]+$").unwrap());

/// Decide whether `candidate` looks like actual conversation content
/// rather than an identifier, keyword, or other serialization noise.
pub fn is_valid_message_content(candidate: &str) -> bool {
    let trimmed = candidate.trim();
    if trimmed.chars().count() < 2 {
        return false;
    }

    let lower = trimmed.to_lowercase();
    if METADATA_KEYWORDS.contains(trimmed) || METADATA_KEYWORDS.contains(lower.as_str()) {
        return false;
    }
    if Uuid::parse_str(trimmed).is_ok() {
        return false;
    }
    if INTEGER_RE.is_match(trimmed) || DECIMAL_TIMESTAMP_RE.is_match(trimmed) {
        return false;
    }
    if MODEL_NAME_RE.is_match(trimmed) {
        return false;
    }
    if OPAQUE_ID_RE.is_match(trimmed) && trimmed.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    if is_domain_list(&lower) {
        return false;
    }
    if trimmed.starts_with('_') || trimmed.starts_with('$') {
        return false;
    }

    // Must look like prose or code, not an identifier.
    trimmed.chars().any(|c| {
        c.is_whitespace() || is_cjk_or_hangul(c) || matches!(c, '{' | '}' | '(' | ')' | ';' | '=' | '<' | '>' | '[' | ']')
    })
}

/// A single domain name or a comma-joined list of them.
fn is_domain_list(lower: &str) -> bool {
    let mut parts = lower.split(',').map(str::trim).peekable();
    if parts.peek().is_none() {
        return false;
    }
    parts.clone().all(|p| !p.is_empty() && DOMAIN_RE.is_match(p))
}

fn is_cjk_or_hangul(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30FF}'   // Hiragana + Katakana
        | '\u{3400}'..='\u{4DBF}' // CJK extension A
        | '\u{4E00}'..='\u{9FFF}' // CJK unified
        | '\u{AC00}'..='\u{D7AF}' // Hangul syllables
    )
}

/// Heuristic for text that is a code block serialized on its own rather
/// than a prose answer that happens to mention code.
pub fn looks_like_standalone_code(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }

    let first_line = trimmed.lines().next().unwrap_or("").trim();
    if STRONG_CODE_LINE_RE.is_match(first_line) {
        return true;
    }

    let mut code_lines = 0usize;
    let mut text_lines = 0usize;
    let mut total = 0usize;
    for line in trimmed.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        total += 1;
        if is_text_line(line) {
            text_lines += 1;
        } else if is_code_line(line) {
            code_lines += 1;
        }
    }

    if total > 0 {
        let ratio = code_lines as f64 / total as f64;
        if ratio > CODE_RATIO_THRESHOLD && text_lines <= TEXT_LINE_CAP {
            return true;
        }
    }

    // Bare expressions and lone assignments with no natural-language
    // line around them.
    if text_lines == 0 && total <= 2 {
        if EXPRESSION_RE.is_match(trimmed) && trimmed.chars().any(|c| c.is_ascii_digit()) {
            return true;
        }
        if total == 1 && ASSIGNMENT_RE.is_match(first_line) {
            return true;
        }
    }

    false
}

fn is_text_line(line: &str) -> bool {
    BULLET_RE.is_match(line)
        || HEADING_RE.is_match(line)
        || NUMBERED_RE.is_match(line)
        || line.starts_with('\\')
        || PROBLEM_LABEL_RE.is_match(line)
        || (FOR_PROSE_RE.is_match(line) && !line.contains(" in "))
        || CAP_SENTENCE_RE.is_match(line)
}

fn is_code_line(line: &str) -> bool {
    COMMENT_RE.is_match(line)
        || DEF_IMPORT_RE.is_match(line)
        || CONTROL_FLOW_RE.is_match(line)
        || FOR_IN_RE.is_match(line)
        || ASSIGNMENT_RE.is_match(line)
        || DOTTED_CALL_RE.is_match(line)
        || BARE_CALL_RE.is_match(line)
        || BRACKET_LITERAL_RE.is_match(line)
        || TUPLE_RE.is_match(line)
}

/// Scan the flat heap around `position` for markers that place the
/// candidate inside a tool/system turn, a code-execution block, or a
/// filtered content type. Scanning stops at the nearest role boundary in
/// each direction; markers beyond it belong to a different turn.
pub fn is_filtered_context(heap: &[Value], position: usize) -> bool {
    let start = position.saturating_sub(CONTEXT_LOOKBACK);
    for slot in heap[start..position].iter().rev() {
        if let Some(s) = slot.as_str() {
            if s == "user" || s == "assistant" {
                break;
            }
            if FILTERED_ROLES.contains(s) || FILTERED_CONTENT_TYPES.contains(s) {
                return true;
            }
        }
    }

    let end = (position + 1 + CONTEXT_LOOKAHEAD).min(heap.len());
    if position + 1 < end {
        for slot in heap[position + 1..end].iter() {
            if let Some(s) = slot.as_str() {
                if s == "user" || s == "assistant" {
                    break;
                }
                if FILTERED_ROLES.contains(s) || FILTERED_CONTENT_TYPES.contains(s) {
                    return true;
                }
            }
        }
    }

    false
}

/// True when the candidate sits inside a reasoning/thinking block.
pub fn is_reasoning_context(heap: &[Value], position: usize) -> bool {
    let start = position.saturating_sub(REASONING_LOOKBACK);
    for slot in heap[start..position].iter().rev() {
        if let Some(s) = slot.as_str() {
            if s == "user" || s == "assistant" {
                return false;
            }
            if REASONING_MARKERS.contains(s) {
                return true;
            }
        }
    }
    false
}
