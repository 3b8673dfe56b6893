//! Error taxonomy for workflow traversal and step execution.
//!
//! Every variant is a per-request failure: the engine surfaces it to the
//! host transport and never retries on its own. The host decides how each
//! kind renders to the end user.

use thiserror::Error;

/// Errors that can occur while traversing or executing a workflow.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Traversal ran past the last node while a step action was still
    /// expected. Always a programming/configuration defect: either the
    /// client requested a label beyond the final step, or a process step's
    /// continuation produced a finished workflow instead of another step.
    #[error("no step remaining for label '{label}': workflow is exhausted")]
    FlowExhausted { label: String },

    /// A prior step's stored value was required but absent from the
    /// session. The client skipped ahead (edited URL) or the session was
    /// cleared mid-flow.
    #[error("no stored value for step '{label}'")]
    MissingStepValue { label: String },

    /// A stored session value failed to decode under the step's codec
    /// (stale schema, tampering). A corrupted entry cannot be safely
    /// repaired, so this is fatal for the request.
    #[error("failed to decode stored value for step '{label}': {reason}")]
    Decode { label: String, reason: String },

    /// A stream was requested on a step that defines no stream handler.
    #[error("step '{label}' does not define a stream handler")]
    UnsupportedStream { label: String },

    /// Two nodes in the same traversal path share a label, making
    /// label-based addressing ambiguous. A construction defect, detected
    /// lazily while walking.
    #[error("duplicate step label '{label}' in traversal path")]
    DuplicateLabel { label: String },

    /// A step's own render/process/stream logic failed (I/O inside the
    /// step, etc.). Distinguished from engine invariant violations so
    /// hosts can map it separately.
    #[error("step '{label}' failed: {reason}")]
    Execution { label: String, reason: String },
}

impl FlowError {
    /// The label of the step this error is attached to.
    pub fn label(&self) -> &str {
        match self {
            FlowError::FlowExhausted { label }
            | FlowError::MissingStepValue { label }
            | FlowError::Decode { label, .. }
            | FlowError::UnsupportedStream { label }
            | FlowError::DuplicateLabel { label }
            | FlowError::Execution { label, .. } => label,
        }
    }

    /// Build an `Execution` error from anything displayable.
    pub fn execution(label: impl Into<String>, err: impl std::fmt::Display) -> Self {
        FlowError::Execution {
            label: label.into(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_label() {
        let err = FlowError::MissingStepValue {
            label: "age".to_string(),
        };
        assert!(err.to_string().contains("'age'"), "got: {err}");
        assert_eq!(err.label(), "age");
    }

    #[test]
    fn test_execution_helper_captures_reason() {
        let err = FlowError::execution("name", "upstream timed out");
        let msg = err.to_string();
        assert!(msg.contains("'name'"), "got: {msg}");
        assert!(msg.contains("upstream timed out"), "got: {msg}");
    }
}
