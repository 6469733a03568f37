use serde_json::{Map, Value};

use super::action_registry::{normalize_action_name, resolve_action, ActionKind};
use crate::codec;

/// Model replies longer than this are only scanned up to the limit.
pub const MAX_SCAN_BYTES: usize = 256 * 1024;
/// Upper bound on balanced `{...}` spans tried by the brace fallback.
pub const MAX_BRACE_CANDIDATES: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    pub kind: ActionKind,
    /// Normalized identifier as it appeared in the payload.
    pub action: String,
    pub params: Map<String, Value>,
}

/// Recovers the first action payload from raw model text.
///
/// Tried in order, first hit wins: the whole text, the whole text with
/// `\"` and `\n` de-escaped, each fenced code block (raw, then de-escaped),
/// then balanced top-level `{...}` spans found by brace-depth counting.
/// `None` means the reply carried no edit request.
pub fn extract_action(raw: &str) -> Option<ActionRequest> {
    let text = clip_to_scan_limit(raw);

    if let Some(found) = decode_candidate(text) {
        return Some(found);
    }
    for block in fenced_blocks(text) {
        if let Some(found) = decode_candidate(block) {
            return Some(found);
        }
    }
    balanced_object_spans(text)
        .into_iter()
        .take(MAX_BRACE_CANDIDATES)
        .find_map(decode_candidate)
}

/// Undoes one level of string escaping, for payloads a model embedded
/// inside another JSON string.
pub fn unescape_embedded(text: &str) -> String {
    text.replace("\\\"", "\"").replace("\\n", "\n")
}

pub(crate) fn decode_candidate(candidate: &str) -> Option<ActionRequest> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(found) = codec::decode(trimmed).ok().and_then(action_from_value) {
        return Some(found);
    }
    let unescaped = unescape_embedded(trimmed);
    if unescaped == trimmed {
        return None;
    }
    codec::decode(&unescaped).ok().and_then(action_from_value)
}

fn action_from_value(value: Value) -> Option<ActionRequest> {
    let Value::Object(mut object) = value else {
        return None;
    };
    let name = match object.remove("action")? {
        Value::String(name) if !name.trim().is_empty() => name,
        _ => return None,
    };
    let params = match object.remove("params") {
        Some(Value::Object(params)) => params,
        Some(_) => Map::new(),
        // Flat payloads: {"action": "...", "exposure": 0.5}
        None => object,
    };
    Some(ActionRequest {
        kind: resolve_action(&name),
        action: normalize_action_name(&name),
        params,
    })
}

fn clip_to_scan_limit(text: &str) -> &str {
    if text.len() <= MAX_SCAN_BYTES {
        return text;
    }
    let mut end = MAX_SCAN_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// A fenced block as found in the text, fences included, plus its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FencedBlock<'a> {
    pub span: &'a str,
    pub body: &'a str,
}

pub(crate) fn fenced_block_spans(text: &str) -> Vec<FencedBlock<'_>> {
    let mut blocks = Vec::new();
    let mut cursor = 0;
    while let Some(open_rel) = text[cursor..].find("```") {
        let open = cursor + open_rel;
        let inner_start = open + 3;
        let Some(close_rel) = text[inner_start..].find("```") else {
            break;
        };
        let close = inner_start + close_rel;
        blocks.push(FencedBlock {
            span: &text[open..close + 3],
            body: strip_language_tag(&text[inner_start..close]),
        });
        cursor = close + 3;
    }
    blocks
}

fn fenced_blocks(text: &str) -> Vec<&str> {
    fenced_block_spans(text)
        .into_iter()
        .map(|block| block.body)
        .collect()
}

fn strip_language_tag(inner: &str) -> &str {
    let Some((first_line, rest)) = inner.split_once('\n') else {
        return inner;
    };
    let tag = first_line.trim();
    if tag.is_empty()
        || tag
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '+'))
    {
        return rest;
    }
    inner
}

/// Top-level balanced `{...}` spans in order of appearance. One linear pass;
/// braces are counted without regard to quoting, so an unbalanced tail
/// yields no span for the object it opened.
pub(crate) fn balanced_object_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (idx, byte) in text.bytes().enumerate() {
        match byte {
            b'{' => {
                if depth == 0 {
                    start = idx;
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    spans.push(&text[start..=idx]);
                }
            }
            _ => {}
        }
    }
    spans
}
