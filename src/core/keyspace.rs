//! Key spaces and scan ranges
//!
//! Documents of one family share a registered key prefix. The scan range for
//! the family is `[prefix, successor(prefix))`, which covers every key that
//! starts with the prefix regardless of suffix width, so there is no numeric
//! ceiling on how many documents a family can hold.

use crate::core::error::{LedgerError, LedgerResult};
use crate::core::store::MAX_KEY_LEN;
use serde::{Deserialize, Serialize};

/// Check that `key` can be stored by every backend
///
/// Keys must be non-empty and at most [`MAX_KEY_LEN`] bytes.
pub fn validate_key(key: &str) -> LedgerResult<()> {
    let invalid = |message: String| LedgerError::InvalidArgument {
        argument: "key".to_string(),
        message,
    };
    if key.is_empty() {
        return Err(invalid("key must not be empty".to_string()));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(invalid(format!(
            "key is {} bytes, longer than the {} byte limit",
            key.len(),
            MAX_KEY_LEN
        )));
    }
    Ok(())
}

/// Half-open key range `[start, end)`. `end = None` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRange {
    pub start: String,
    pub end: Option<String>,
}

impl KeyRange {
    /// Create a range bounded on both sides
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: Some(end.into()),
        }
    }

    /// Create a range with no upper bound
    pub fn starting_at(start: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: None,
        }
    }

    /// The full key space
    pub fn all() -> Self {
        Self::starting_at("")
    }

    /// Check whether `key` falls inside the range
    pub fn contains(&self, key: &str) -> bool {
        key >= self.start.as_str() && self.end.as_deref().is_none_or(|end| key < end)
    }
}

/// A registered key prefix for one document family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpace {
    prefix: String,
}

impl KeySpace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The scan range covering exactly the keys under this prefix
    pub fn range(&self) -> KeyRange {
        KeyRange {
            start: self.prefix.clone(),
            end: prefix_successor(&self.prefix),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        key.starts_with(&self.prefix)
    }
}

/// Smallest string greater than every string starting with `prefix`
///
/// Returns `None` when no such string exists (empty prefix, or a prefix made
/// only of `char::MAX`).
fn prefix_successor(prefix: &str) -> Option<String> {
    let mut chars: Vec<char> = prefix.chars().collect();
    while let Some(last) = chars.pop() {
        if let Some(next) = next_char(last) {
            chars.push(next);
            return Some(chars.into_iter().collect());
        }
    }
    None
}

fn next_char(c: char) -> Option<char> {
    match c {
        char::MAX => None,
        // skip the surrogate gap
        '\u{D7FF}' => Some('\u{E000}'),
        _ => char::from_u32(c as u32 + 1),
    }
}
