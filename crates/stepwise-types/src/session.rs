//! Client-held session: completed steps' serialized values, keyed by label.
//!
//! The session grows monotonically as steps complete and is cleared
//! wholesale on workflow restart. Updates are functional -- `with_entry`
//! returns a new session and leaves the original usable -- because the
//! engine reads one snapshot per request and hands an updated copy back to
//! the host, which owns actual persistence (cookie, server-side store).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Label -> serialized step value mapping for one client's workflow run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    entries: BTreeMap<String, String>,
}

impl Session {
    /// An empty session (fresh client, or just restarted).
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the serialized value stored for `label`.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries.get(label).map(String::as_str)
    }

    /// Return a new session with `label` set to `value`.
    ///
    /// Overwrites any prior value for the same label -- a step retried or
    /// edited via the back button replaces its old result.
    pub fn with_entry(&self, label: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(label.into(), value.into());
        Self { entries }
    }

    /// Return an empty session, discarding every stored step value.
    pub fn cleared(&self) -> Self {
        Self::default()
    }

    /// Number of completed steps recorded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no step has completed yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(label, serialized value)` pairs in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_entry_leaves_original_usable() {
        let base = Session::new();
        let updated = base.with_entry("name", "Alice");

        assert!(base.is_empty());
        assert_eq!(updated.get("name"), Some("Alice"));
        assert_eq!(updated.len(), 1);
    }

    #[test]
    fn test_with_entry_overwrites_same_label() {
        let s = Session::new()
            .with_entry("name", "Alice")
            .with_entry("name", "Bob");

        assert_eq!(s.get("name"), Some("Bob"));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_cleared_discards_everything() {
        let s = Session::new()
            .with_entry("name", "Alice")
            .with_entry("age", "30");

        assert!(s.cleared().is_empty());
        // Original untouched.
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_serde_roundtrip() {
        let s = Session::new().with_entry("name", "Alice");
        let json = serde_json::to_string(&s).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
