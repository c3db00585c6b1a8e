//! Line-prefix extraction of `KEY: "value"` fields from model replies.
//!
//! Replies are scanned line by line. A line that starts with `<KEY>:` for one
//! of the expected keys opens that field with the rest of the line; later
//! non-empty lines that open nothing are appended to the open field. Lines
//! before the first recognised key are dropped. Values are split on the first
//! colon only.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{KreatError, Result};

const QUOTES: &[char] = &['"', '\'', '\u{201C}', '\u{201D}'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFields {
    keys: Vec<String>,
    values: BTreeMap<String, String>,
    matched: BTreeSet<String>,
}

impl ParsedFields {
    fn empty(keys: &[&str]) -> Self {
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            values: keys.iter().map(|k| (k.to_string(), String::new())).collect(),
            matched: BTreeSet::new(),
        }
    }

    /// Value for `key`, or the empty default when it never appeared.
    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn is_present(&self, key: &str) -> bool {
        self.matched.contains(key)
    }

    pub fn missing(&self) -> Vec<String> {
        self.keys
            .iter()
            .filter(|key| !self.matched.contains(*key))
            .cloned()
            .collect()
    }

    /// True when at least one expected key appeared in the reply.
    pub fn any_present(&self) -> bool {
        !self.matched.is_empty()
    }

    /// Fails with `ResponseFormat` listing every expected key the reply lacked.
    pub fn require_all(self) -> Result<Self> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(self)
        } else {
            Err(KreatError::ResponseFormat { missing })
        }
    }

    /// Key/value pairs in the order the keys were declared.
    pub fn rows(&self) -> Vec<(String, String)> {
        self.keys
            .iter()
            .map(|key| (key.clone(), self.get(key).to_string()))
            .collect()
    }
}

fn clean(piece: &str) -> &str {
    piece.trim().trim_matches(QUOTES).trim()
}

fn open_field<'a>(line: &'a str, keys: &[&'a str]) -> Option<(&'a str, &'a str)> {
    keys.iter().find_map(|key| {
        line.strip_prefix(key)
            .and_then(|rest| rest.strip_prefix(':'))
            .map(|rest| (*key, rest))
    })
}

/// Best-effort parse; never fails. Use [`ParsedFields::require_all`] to turn
/// missing keys into an error.
pub fn parse_fields(reply: &str, keys: &[&str]) -> ParsedFields {
    let mut fields = ParsedFields::empty(keys);
    let mut current: Option<&str> = None;

    for raw_line in reply.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some((key, rest)) = open_field(line, keys) {
            fields.values.insert(key.to_string(), clean(rest).to_string());
            fields.matched.insert(key.to_string());
            current = Some(key);
            continue;
        }

        let Some(key) = current else {
            continue;
        };
        let piece = clean(line);
        if piece.is_empty() {
            continue;
        }
        if let Some(value) = fields.values.get_mut(key) {
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(piece);
        }
    }

    fields
}
