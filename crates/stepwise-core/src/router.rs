//! Router port: how step labels become addressable handles.
//!
//! The engine never constructs URLs itself. A host transport implements
//! this trait to map a step label onto whatever addressing scheme it
//! uses; the engine only threads the resolved [`Handle`]s into step
//! contexts and redirect responses.

use stepwise_types::Handle;

/// Resolves step labels to transport-level handles.
pub trait Router: Send + Sync {
    /// Handle for displaying a step (the render path).
    fn resolve_get(&self, label: &str) -> Handle;

    /// Handle for submitting a step (the process path).
    fn resolve_post(&self, label: &str) -> Handle;
}
