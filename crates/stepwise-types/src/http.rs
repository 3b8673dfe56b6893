//! Wire-facing types shared between the engine and its host transport.
//!
//! The engine never builds URLs itself -- a `Handle` is whatever opaque
//! string the host's router resolved for a step label. `StepResponse` is
//! the engine-visible response shape: a rendered page, or a redirect the
//! engine itself issues after a successful process step.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An opaque, router-resolved address for a step (typically a URL path).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handle(String);

impl Handle {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Response produced by a step or by the engine on its behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResponse {
    /// A rendered page body (HTML) to show the client.
    Html(String),
    /// Send the client to another step's handle.
    Redirect(Handle),
}

impl StepResponse {
    /// The redirect target, if this response is a redirect.
    pub fn redirect_target(&self) -> Option<&Handle> {
        match self {
            StepResponse::Redirect(handle) => Some(handle),
            StepResponse::Html(_) => None,
        }
    }
}

/// Submitted input for a process step: the decoded form fields of the
/// request. A GET falling through to the process path carries an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormData {
    fields: BTreeMap<String, String>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a submitted field by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Insert a field, replacing any prior value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Builder-style `set`, convenient in tests and demos.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, String)> for FormData {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
