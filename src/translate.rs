//! Label translation table.
//!
//! Detector labels come back in English; the announcement should use the
//! user's language. The table is loaded once at startup from a flat text
//! resource and is immutable afterward; lookup is a pure function with an
//! identity fallback, so translation can never fail at runtime.
//!
//! Resource format: UTF-8 text, records separated by CRLF, each record
//! `key=value` with the first `=` as the delimiter. A malformed record makes
//! the whole resource unusable: construction logs a warning and degrades to
//! the empty table rather than erroring out.

use std::collections::HashMap;
use std::path::Path;

pub const RECORD_SEPARATOR: &str = "\r\n";

/// English-to-localized label table.
pub struct Translator {
    map: HashMap<String, String>,
}

impl Translator {
    /// Identity translator. Used when no dictionary resource is configured.
    pub fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Parse a dictionary resource. Never fails: a malformed resource yields
    /// the empty table and translation degrades to identity.
    pub fn from_resource(text: &str) -> Self {
        match parse_records(text) {
            Ok(map) => Self { map },
            Err(line) => {
                log::warn!(
                    "dictionary record {} is malformed (missing '='); translation disabled",
                    line
                );
                Self::empty()
            }
        }
    }

    /// Load a dictionary file from disk. An unreadable file is non-fatal and
    /// degrades to identity translation, same as a malformed one.
    pub fn from_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_resource(&text),
            Err(e) => {
                log::warn!(
                    "failed to read dictionary {}: {}; translation disabled",
                    path.display(),
                    e
                );
                Self::empty()
            }
        }
    }

    /// Translate an English label. Total: unknown keys come back unchanged.
    pub fn translate<'a>(&'a self, english_label: &'a str) -> &'a str {
        self.map
            .get(english_label)
            .map(String::as_str)
            .unwrap_or(english_label)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Parse `key=value` records. Returns the 1-based index of the first
/// malformed record on failure.
fn parse_records(text: &str) -> Result<HashMap<String, String>, usize> {
    if text.is_empty() {
        return Ok(HashMap::new());
    }
    let mut map = HashMap::new();
    for (index, record) in text.split(RECORD_SEPARATOR).enumerate() {
        let Some((key, value)) = record.split_once('=') else {
            return Err(index + 1);
        };
        map.insert(key.to_string(), value.to_string());
    }
    Ok(map)
}
