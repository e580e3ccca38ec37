//! Raw form field set and the integer coercion primitive.

use anyhow::{Context, Result};
use serde_json::Number;

/// Ordered string key/value pairs submitted by a form.
///
/// Mirrors `Object.fromEntries(formData.entries())`: a repeated name keeps the
/// position of its first occurrence and the value of its last.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormFields {
    entries: Vec<(String, String)>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields = Self::new();
        for (name, value) in entries {
            fields.insert(name, value);
        }
        fields
    }

    /// Parses an `application/x-www-form-urlencoded` body.
    pub fn from_urlencoded(body: &str) -> Result<Self> {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_str(body).context("failed to parse urlencoded form body")?;

        Ok(Self::from_entries(pairs))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

/// Largest magnitude up to which every integer is exact in an `f64`.
const MAX_SAFE_INTEGER: u64 = 1 << 53;

/// Whitespace skipped before a number: ECMAScript `StrWhiteSpaceChar`.
fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\u{0B}'
            | '\u{0C}'
            | '\r'
            | ' '
            | '\u{A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// Base-10 parse of the leading integer in `input`.
///
/// Leading whitespace and a single sign are accepted, parsing stops at the
/// first non-digit. Returns `None` (not-a-number) when no digit follows.
///
/// Magnitudes above 2^53 are rounded to the nearest `f64`, so the result is
/// the number a browser would post. Those that still fit an `i64` stay
/// integers in JSON, larger ones become floating point numbers.
pub fn parse_int(input: &str) -> Option<Number> {
    let trimmed = input.trim_start_matches(is_js_whitespace);

    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_len = unsigned
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .count();

    if digits_len == 0 {
        return None;
    }

    let digits = &unsigned[..digits_len];
    let literal = if negative {
        format!("-{digits}")
    } else {
        digits.to_string()
    };

    if let Ok(value) = literal.parse::<i64>() {
        if value.unsigned_abs() <= MAX_SAFE_INTEGER {
            return Some(Number::from(value));
        }
    }

    let rounded = literal.parse::<f64>().ok()?;
    if rounded.abs() < i64::MAX as f64 {
        Some(Number::from(rounded as i64))
    } else {
        Number::from_f64(rounded)
    }
}
