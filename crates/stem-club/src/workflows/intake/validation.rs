//! Pure field checks shared by the form schemas.
//!
//! Each rule takes the value produced by the previous one and either passes it on or
//! returns the message to show next to the field, so schemas chain them with
//! `Result::and_then` and keep only the first failure per field.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

/// Field-level validation messages, at most one per field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors<K: Ord>(BTreeMap<K, String>);

impl<K: Ord + Copy> FieldErrors<K> {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Record `message` unless the field already has one.
    pub fn insert(&mut self, field: K, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Unwrap a rule result, recording its message on failure.
    pub fn check<T>(&mut self, field: K, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.insert(field, message);
                None
            }
        }
    }

    pub fn get(&self, field: K) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn remove(&mut self, field: K) -> Option<String> {
        self.0.remove(&field)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn contains(&self, field: K) -> bool {
        self.0.contains_key(&field)
    }

    pub fn fields(&self) -> Vec<K> {
        self.0.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, K, String> {
        self.0.iter()
    }
}

impl<K: Ord + Copy> Default for FieldErrors<K> {
    fn default() -> Self {
        Self::new()
    }
}

pub fn trimmed(raw: &str) -> String {
    raw.trim().to_string()
}

pub fn required(raw: &str, message: &str) -> Result<String, String> {
    let value = trimmed(raw);
    if value.is_empty() {
        Err(message.to_string())
    } else {
        Ok(value)
    }
}

/// Bounds are inclusive and counted in characters, not bytes.
pub fn min_chars(value: String, min: usize, message: &str) -> Result<String, String> {
    if value.chars().count() < min {
        Err(message.to_string())
    } else {
        Ok(value)
    }
}

pub fn max_chars(value: String, max: usize, message: &str) -> Result<String, String> {
    if value.chars().count() > max {
        Err(message.to_string())
    } else {
        Ok(value)
    }
}

pub const NOT_TEXT: &str = "Please enter text";

/// Read an optional string member of a JSON object. Missing or null reads as empty.
pub fn text_member(payload: &Value, key: &str) -> Result<String, String> {
    match payload.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(NOT_TEXT.to_string()),
    }
}

/// Syntax-check an address and lower-case it. Never repairs invalid input.
pub fn email(value: String, message: &str) -> Result<String, String> {
    if is_valid_email(&value) {
        Ok(value.to_ascii_lowercase())
    } else {
        Err(message.to_string())
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // ASCII-only case folding: Unicode mode would let U+212A KELVIN SIGN through as `k`.
        Regex::new(r"(?i-u)^[a-z0-9_'+\-.]*[a-z0-9_+\-]@(?:[a-z0-9][a-z0-9\-]*\.)+[a-z]{2,}$")
            .expect("Invalid email regex pattern")
    })
}

pub fn is_valid_email(value: &str) -> bool {
    let Some((local, _)) = value.split_once('@') else {
        return false;
    };
    !local.starts_with('.') && !value.contains("..") && email_pattern().is_match(value)
}
