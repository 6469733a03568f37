//! Best-effort JSON codec for model output.
//!
//! `decode` first tries a strict `serde_json` parse and falls back to a
//! lenient recursive-descent scanner that accepts what models tend to emit:
//! trailing commas, raw control characters inside strings, unknown escape
//! sequences, and leading `+` on numbers. It is not a conforming JSON parser.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Nesting limit for the lenient scanner.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {offset}")]
pub struct CodecError {
    pub offset: usize,
    pub message: String,
}

pub fn decode(text: &str) -> Result<Value, CodecError> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }
    let mut scanner = Scanner::new(text);
    scanner.skip_whitespace();
    let value = scanner.parse_value()?;
    scanner.skip_whitespace();
    if scanner.pos < scanner.src.len() {
        return Err(scanner.error("unexpected trailing characters"));
    }
    Ok(value)
}

/// Compact encoding. Empty arrays stay `[]`; sequences and mappings are
/// distinct in `Value`, so no array-vs-object guessing happens here.
pub fn encode(value: &Value) -> String {
    value.to_string()
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            depth: 0,
        }
    }

    fn error(&self, message: &str) -> CodecError {
        CodecError {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if !ch.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
    }

    fn parse_value(&mut self) -> Result<Value, CodecError> {
        match self.peek() {
            Some('{') => self.parse_object(),
            Some('[') => self.parse_array(),
            Some('"') => self.parse_string().map(Value::String),
            Some('t') => self.parse_literal("true", Value::Bool(true)),
            Some('f') => self.parse_literal("false", Value::Bool(false)),
            Some('n') => self.parse_literal("null", Value::Null),
            Some(ch) if ch == '-' || ch == '+' || ch == '.' || ch.is_ascii_digit() => {
                self.parse_number()
            }
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn enter(&mut self) -> Result<(), CodecError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        Ok(())
    }

    fn parse_object(&mut self) -> Result<Value, CodecError> {
        self.enter()?;
        self.bump();
        let mut map = Map::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('}') => {
                    self.bump();
                    break;
                }
                Some('"') => {}
                Some(_) => return Err(self.error("expected string key")),
                None => return Err(self.error("unterminated object")),
            }
            let key = self.parse_string()?;
            self.skip_whitespace();
            if self.bump() != Some(':') {
                return Err(self.error("expected ':' after key"));
            }
            self.skip_whitespace();
            let value = self.parse_value()?;
            map.insert(key, value);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some('}') => break,
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
        self.depth -= 1;
        Ok(Value::Object(map))
    }

    fn parse_array(&mut self) -> Result<Value, CodecError> {
        self.enter()?;
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(']') => {
                    self.bump();
                    break;
                }
                None => return Err(self.error("unterminated array")),
                Some(_) => {}
            }
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some(']') => break,
                _ => return Err(self.error("expected ',' or ']'")),
            }
        }
        self.depth -= 1;
        Ok(Value::Array(items))
    }

    fn parse_string(&mut self) -> Result<String, CodecError> {
        self.bump();
        let mut out = String::new();
        loop {
            let Some(ch) = self.bump() else {
                return Err(self.error("unterminated string"));
            };
            match ch {
                '"' => return Ok(out),
                '\\' => {
                    let Some(escaped) = self.bump() else {
                        return Err(self.error("unterminated escape"));
                    };
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        'b' => out.push('\u{8}'),
                        'f' => out.push('\u{c}'),
                        'u' => out.push(self.parse_unicode_escape()),
                        other => out.push(other),
                    }
                }
                other => out.push(other),
            }
        }
    }

    fn parse_unicode_escape(&mut self) -> char {
        let tail = &self.src[self.pos..];
        let hex: String = tail.chars().take(4).collect();
        if hex.len() == 4 && hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
            self.pos += 4;
            return u32::from_str_radix(&hex, 16)
                .ok()
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER);
        }
        'u'
    }

    fn parse_literal(&mut self, word: &str, value: Value) -> Result<Value, CodecError> {
        if self.src[self.pos..].starts_with(word) {
            self.pos += word.len();
            return Ok(value);
        }
        Err(self.error("invalid literal"))
    }

    fn parse_number(&mut self) -> Result<Value, CodecError> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.' | 'e' | 'E') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let raw = &self.src[start..self.pos];
        let trimmed = raw.strip_prefix('+').unwrap_or(raw);
        if !trimmed.contains(['.', 'e', 'E']) {
            if let Ok(int) = trimmed.parse::<i64>() {
                return Ok(Value::Number(int.into()));
            }
        }
        trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| CodecError {
                offset: start,
                message: format!("invalid number '{raw}'"),
            })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::{decode, encode, MAX_DEPTH};

    #[test]
    fn decodes_strict_json() {
        let value = decode(r#"{"action":"apply","params":{"exposure":0.5,"tags":["a"]}}"#);
        assert_eq!(
            value,
            Ok(json!({"action": "apply", "params": {"exposure": 0.5, "tags": ["a"]}}))
        );
    }

    #[test]
    fn lenient_scanner_accepts_trailing_commas_and_plus_numbers() {
        let value = decode("{ \"exposure\": +0.3, \"contrast\": 10, }").unwrap_or(Value::Null);
        assert_eq!(value, json!({"exposure": 0.3, "contrast": 10}));
    }

    #[test]
    fn lenient_scanner_keeps_raw_newlines_and_unknown_escapes() {
        let value = decode("{\"note\": \"line one\nline \\q two\"}").unwrap_or(Value::Null);
        assert_eq!(value, json!({"note": "line one\nline q two"}));
    }

    #[test]
    fn rejects_prose_and_trailing_text() {
        assert!(decode("Sure, here you go").is_err());
        assert!(decode("{\"a\": 1} and more").is_err());
        assert!(decode("{\"a\": ").is_err());
    }

    #[test]
    fn rejects_excessive_nesting() {
        let deep = format!("{}1{},", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        assert!(decode(&deep).is_err());
    }

    #[test]
    fn encode_then_decode_preserves_nested_values() {
        let value = json!({
            "action": "apply_develop_settings",
            "params": {"exposure": -0.75, "vibrance": 20, "label": "warm \"golden\" look"},
            "flags": [true, false, null],
            "empty": [],
            "nested": {"deeper": {"list": [1, 2.5, "three"]}},
        });
        assert_eq!(decode(&encode(&value)), Ok(value));
    }

    #[test]
    fn empty_sequence_encodes_as_array() {
        assert_eq!(encode(&json!([])), "[]");
        assert_eq!(encode(&json!({})), "{}");
    }
}
