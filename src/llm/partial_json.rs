//! Tolerant parser for JSON documents that are still being streamed.
//!
//! Tool-call arguments arrive a few characters at a time. [`parse`] accepts any prefix of
//! a valid document and returns the value that prefix describes so far:
//!
//! * open objects and arrays are closed,
//! * a string cut short keeps the characters received,
//! * a number cut short keeps its longest valid prefix,
//! * a literal cut short (`tr`, `nu`) resolves to the literal it starts,
//! * an object member whose key or value has not started yet is left out.
//!
//! Truncation is never an error. Input that cannot be the prefix of any JSON document
//! (`{"a" 1}`, `[1,,2]`) is reported as [`MalformedJson`].

use serde_json::{Map, Value};
use thiserror::Error;

/// Input that no amount of additional text could turn into valid JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed JSON at byte {position}: {reason}")]
pub struct MalformedJson {
    pub position: usize,
    pub reason: &'static str,
}

/// Parse a complete or truncated JSON document.
///
/// Empty (or whitespace-only) input yields `Value::Null`.
pub fn parse(input: &str) -> Result<Value, MalformedJson> {
    let mut parser = Parser { src: input, pos: 0 };
    let value = parser.value()?.unwrap_or(Value::Null);
    parser.skip_ws();
    if !parser.at_end() {
        return Err(parser.error("unexpected trailing characters"));
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

enum Text {
    Complete(String),
    Truncated(String),
}

type Step<T> = Result<T, MalformedJson>;

impl<'a> Parser<'a> {
    fn error(&self, reason: &'static str) -> MalformedJson {
        MalformedJson {
            position: self.pos,
            reason,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\n' | b'\r' | b'\t')) {
            self.pos += 1;
        }
    }

    /// `Ok(None)` means the input ended before any part of a value was seen.
    fn value(&mut self) -> Step<Option<Value>> {
        self.skip_ws();
        match self.peek() {
            None => Ok(None),
            Some(b'{') => self.object().map(Some),
            Some(b'[') => self.array().map(Some),
            Some(b'"') => Ok(Some(match self.string()? {
                Text::Complete(s) | Text::Truncated(s) => Value::String(s),
            })),
            Some(b't' | b'f' | b'n') => self.literal().map(Some),
            Some(b'-' | b'0'..=b'9') => self.number(),
            Some(_) => Err(self.error("unexpected character")),
        }
    }

    fn object(&mut self) -> Step<Value> {
        self.pos += 1;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Ok(Value::Object(map)),
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(Value::Object(map));
                }
                Some(b'"') => {}
                Some(_) => return Err(self.error("expected object key")),
            }

            let key = match self.string()? {
                Text::Complete(key) => key,
                Text::Truncated(_) => return Ok(Value::Object(map)),
            };
            self.skip_ws();
            match self.peek() {
                None => return Ok(Value::Object(map)),
                Some(b':') => self.pos += 1,
                Some(_) => return Err(self.error("expected ':' after object key")),
            }
            match self.value()? {
                Some(value) => {
                    map.insert(key, value);
                }
                None => return Ok(Value::Object(map)),
            }

            self.skip_ws();
            match self.peek() {
                None => return Ok(Value::Object(map)),
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(Value::Object(map));
                }
                Some(_) => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn array(&mut self) -> Step<Value> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Ok(Value::Array(items)),
                Some(b']') => {
                    self.pos += 1;
                    return Ok(Value::Array(items));
                }
                Some(b',') => return Err(self.error("expected array element")),
                Some(_) => {}
            }
            match self.value()? {
                Some(value) => items.push(value),
                None => return Ok(Value::Array(items)),
            }

            self.skip_ws();
            match self.peek() {
                None => return Ok(Value::Array(items)),
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Ok(Value::Array(items));
                }
                Some(_) => return Err(self.error("expected ',' or ']'")),
            }
        }
    }

    fn string(&mut self) -> Step<Text> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            let Some(ch) = self.rest().chars().next() else {
                return Ok(Text::Truncated(out));
            };
            self.pos += ch.len_utf8();
            match ch {
                '"' => return Ok(Text::Complete(out)),
                '\\' => match self.escape()? {
                    Some(decoded) => out.push(decoded),
                    None => return Ok(Text::Truncated(out)),
                },
                other => out.push(other),
            }
        }
    }

    /// Decode the escape following a backslash. `Ok(None)` when the input ends inside it.
    fn escape(&mut self) -> Step<Option<char>> {
        let Some(ch) = self.rest().chars().next() else {
            return Ok(None);
        };
        self.pos += ch.len_utf8();
        let decoded = match ch {
            '"' => '"',
            '\\' => '\\',
            '/' => '/',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => return self.unicode_escape(),
            _ => return Err(self.error("invalid escape sequence")),
        };
        Ok(Some(decoded))
    }

    fn hex4(&mut self) -> Step<Option<u16>> {
        let rest = self.rest();
        let digits = rest.get(..4.min(rest.len())).unwrap_or(rest);
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(self.error("invalid unicode escape"));
        }
        if digits.len() < 4 {
            self.pos = self.src.len();
            return Ok(None);
        }
        self.pos += 4;
        u16::from_str_radix(digits, 16)
            .map(Some)
            .map_err(|_| self.error("invalid unicode escape"))
    }

    fn unicode_escape(&mut self) -> Step<Option<char>> {
        let Some(high) = self.hex4()? else {
            return Ok(None);
        };
        if !(0xD800..0xDC00).contains(&high) {
            return Ok(Some(
                char::from_u32(u32::from(high)).unwrap_or(char::REPLACEMENT_CHARACTER),
            ));
        }

        // High surrogate: a low surrogate escape should follow.
        let rest = self.rest();
        if rest.is_empty() || "\\u".starts_with(rest) {
            self.pos = self.src.len();
            return Ok(None);
        }
        if !rest.starts_with("\\u") {
            return Ok(Some(char::REPLACEMENT_CHARACTER));
        }
        self.pos += 2;
        let Some(low) = self.hex4()? else {
            return Ok(None);
        };
        if !(0xDC00..0xE000).contains(&low) {
            return Ok(Some(char::REPLACEMENT_CHARACTER));
        }
        let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
        Ok(Some(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)))
    }

    fn literal(&mut self) -> Step<Value> {
        const LITERALS: [(&str, Value); 3] = [
            ("true", Value::Bool(true)),
            ("false", Value::Bool(false)),
            ("null", Value::Null),
        ];
        let rest = self.rest();
        for (word, value) in LITERALS {
            if rest.starts_with(word) {
                self.pos += word.len();
                return Ok(value);
            }
            if word.starts_with(rest) {
                self.pos = self.src.len();
                return Ok(value);
            }
        }
        Err(self.error("invalid literal"))
    }

    fn number(&mut self) -> Step<Option<Value>> {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E')
        ) {
            self.pos += 1;
        }
        let token = &self.src[start..self.pos];
        if let Some(value) = number_value(token) {
            return Ok(Some(value));
        }
        if !self.at_end() {
            self.pos = start;
            return Err(self.error("invalid number"));
        }

        // Cut off mid-number: fall back to the longest prefix that still parses.
        let mut token = token;
        while !token.is_empty() {
            token = &token[..token.len() - 1];
            if let Some(value) = number_value(token) {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

fn number_value(token: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(token) {
        Ok(value @ Value::Number(_)) => Some(value),
        _ => None,
    }
}
