//! The lazily-unfolding workflow sequence.
//!
//! A [`Flow<T>`] is conceptually a linked list whose links are computed on
//! demand: each step node carries a label, a [`Step`], a [`Codec`] for the
//! step's value type, and an opaque continuation mapping that value to the
//! rest of the workflow. Construction ([`step`], [`Flow::pure`],
//! [`Flow::and_then`]) is pure -- it only builds the description; session
//! and network effects happen during traversal in the sequencer.
//!
//! Continuations are layered rather than rewritten: [`step`] creates a
//! node whose continuation is the identity (it yields its own value as a
//! finished flow), and each [`Flow::and_then`] wraps the node so that
//! finished inner flows feed the bound function. A continuation is only
//! ever invoked with a freshly processed value or one decoded from the
//! session for that exact label.

use std::sync::Arc;

use stepwise_types::{Codec, FlowError, FormData, StepResponse};

use crate::flow::context::{CtxSeed, StepContext};
use crate::flow::step::{Processed, Step, StepFuture};
use crate::flow::stream::StreamBinding;

/// A workflow that ultimately yields a value of type `T`.
///
/// The definition is immutable and reusable across requests: traversal
/// clones are cheap (`Arc` per node).
pub struct Flow<T> {
    pub(crate) inner: Inner<T>,
}

pub(crate) enum Inner<T> {
    /// The workflow is already finished.
    Done(T),
    /// At least one step remains.
    Step(Arc<dyn FlowNode<T>>),
}

impl<T> Flow<T> {
    /// A workflow that is already finished, carrying no further steps.
    ///
    /// Useful as the tail of a composition chain; not reachable as a
    /// redirect target (see [`FlowError::FlowExhausted`]).
    pub fn pure(value: T) -> Self {
        Self {
            inner: Inner::Done(value),
        }
    }

    /// The label of the first remaining step, if any.
    pub fn first_label(&self) -> Option<&str> {
        match &self.inner {
            Inner::Done(_) => None,
            Inner::Step(node) => Some(node.label()),
        }
    }
}

impl<T: Send + Sync + 'static> Flow<T> {
    /// Sequence this workflow with a continuation on its value.
    ///
    /// When traversed, the combined workflow first resolves `T` (from the
    /// session, or by running this workflow's steps), then feeds it to `f`
    /// to determine what comes next -- possibly a completely different set
    /// of remaining labels depending on the runtime value.
    pub fn and_then<U: Send + Sync + 'static>(
        self,
        f: impl Fn(T) -> Flow<U> + Send + Sync + 'static,
    ) -> Flow<U> {
        rebind(self, Arc::new(f))
    }
}

impl<T: Clone> Clone for Flow<T> {
    fn clone(&self) -> Self {
        let inner = match &self.inner {
            Inner::Done(value) => Inner::Done(value.clone()),
            Inner::Step(node) => Inner::Step(node.clone()),
        };
        Self { inner }
    }
}

/// Lift a single step into a one-node workflow yielding the step's value.
///
/// The codec is resolved here, once, at definition time.
pub fn step<S: Step>(
    label: impl Into<String>,
    step: S,
    codec: Codec<S::Value>,
) -> Flow<S::Value> {
    Flow {
        inner: Inner::Step(Arc::new(StepNode {
            label: label.into(),
            step,
            codec,
        })),
    }
}

// ---------------------------------------------------------------------------
// Node trait (type-erased over the step's value type)
// ---------------------------------------------------------------------------

/// Outcome of running a node's process function, as seen by the sequencer.
pub(crate) enum NodeProcessed<T> {
    /// Short-circuit response; nothing stored.
    Halt(StepResponse),
    /// The step succeeded: its encoded value, and the remaining workflow
    /// computed by feeding the value into the continuation.
    Advance { encoded: String, next: Flow<T> },
}

/// One step node in a `Flow<T>`, with its value type erased.
///
/// Methods take the label-independent context seed; the node decodes the
/// raw session string under its own codec before building the typed
/// [`StepContext`].
pub(crate) trait FlowNode<T>: Send + Sync {
    fn label(&self) -> &str;

    /// Decode a stored value for this node and feed it into the
    /// continuation, yielding the rest of the workflow.
    fn advance(&self, raw: &str) -> Result<Flow<T>, FlowError>;

    fn render(&self, seed: CtxSeed, stored: Option<String>) -> StepFuture<Option<StepResponse>>;

    fn process(
        &self,
        seed: CtxSeed,
        stored: Option<String>,
        form: FormData,
    ) -> StepFuture<NodeProcessed<T>>;

    /// Stream entry does not rehydrate this node's own stored value.
    fn stream(&self, seed: CtxSeed) -> Result<StreamBinding, FlowError>;
}

// ---------------------------------------------------------------------------
// StepNode: a lifted step with the identity continuation
// ---------------------------------------------------------------------------

struct StepNode<S: Step> {
    label: String,
    step: S,
    codec: Codec<S::Value>,
}

impl<S: Step> StepNode<S> {
    /// Decode an optional raw session string under this node's codec.
    fn decode_stored(&self, stored: Option<String>) -> Result<Option<S::Value>, FlowError> {
        match stored {
            None => Ok(None),
            Some(raw) => self
                .codec
                .decode(&raw)
                .map(Some)
                .map_err(|e| FlowError::Decode {
                    label: self.label.clone(),
                    reason: e.to_string(),
                }),
        }
    }
}

impl<S: Step> FlowNode<S::Value> for StepNode<S> {
    fn label(&self) -> &str {
        &self.label
    }

    fn advance(&self, raw: &str) -> Result<Flow<S::Value>, FlowError> {
        let value = self.codec.decode(raw).map_err(|e| FlowError::Decode {
            label: self.label.clone(),
            reason: e.to_string(),
        })?;
        Ok(Flow::pure(value))
    }

    fn render(&self, seed: CtxSeed, stored: Option<String>) -> StepFuture<Option<StepResponse>> {
        let stored = match self.decode_stored(stored) {
            Ok(v) => v,
            Err(e) => return Box::pin(async move { Err(e) }),
        };
        self.step.render(StepContext::new(seed, stored))
    }

    fn process(
        &self,
        seed: CtxSeed,
        stored: Option<String>,
        form: FormData,
    ) -> StepFuture<NodeProcessed<S::Value>> {
        let stored = match self.decode_stored(stored) {
            Ok(v) => v,
            Err(e) => return Box::pin(async move { Err(e) }),
        };
        let fut = self.step.process(StepContext::new(seed, stored), form);
        let codec = self.codec.clone();
        Box::pin(async move {
            match fut.await? {
                Processed::Halt(response) => Ok(NodeProcessed::Halt(response)),
                Processed::Advance(value) => {
                    let encoded = codec.encode(&value);
                    Ok(NodeProcessed::Advance {
                        encoded,
                        next: Flow::pure(value),
                    })
                }
            }
        })
    }

    fn stream(&self, seed: CtxSeed) -> Result<StreamBinding, FlowError> {
        self.step
            .stream(StepContext::new(seed, None))
            .ok_or_else(|| FlowError::UnsupportedStream {
                label: self.label.clone(),
            })
    }
}

// ---------------------------------------------------------------------------
// BindNode: a node wrapped with a continuation layer
// ---------------------------------------------------------------------------

type ContFn<T, U> = Arc<dyn Fn(T) -> Flow<U> + Send + Sync>;

/// Attach a continuation to a whole flow: a finished flow feeds `f`
/// directly, a pending one gets its head node wrapped.
fn rebind<T, U>(flow: Flow<T>, f: ContFn<T, U>) -> Flow<U>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
{
    match flow.inner {
        Inner::Done(value) => f(value),
        Inner::Step(node) => Flow {
            inner: Inner::Step(Arc::new(BindNode {
                inner: node,
                next: f,
            })),
        },
    }
}

struct BindNode<T, U> {
    inner: Arc<dyn FlowNode<T>>,
    next: ContFn<T, U>,
}

impl<T, U> FlowNode<U> for BindNode<T, U>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
{
    fn label(&self) -> &str {
        self.inner.label()
    }

    fn advance(&self, raw: &str) -> Result<Flow<U>, FlowError> {
        let rest = self.inner.advance(raw)?;
        Ok(rebind(rest, self.next.clone()))
    }

    fn render(&self, seed: CtxSeed, stored: Option<String>) -> StepFuture<Option<StepResponse>> {
        self.inner.render(seed, stored)
    }

    fn process(
        &self,
        seed: CtxSeed,
        stored: Option<String>,
        form: FormData,
    ) -> StepFuture<NodeProcessed<U>> {
        let fut = self.inner.process(seed, stored, form);
        let next = self.next.clone();
        Box::pin(async move {
            match fut.await? {
                NodeProcessed::Halt(response) => Ok(NodeProcessed::Halt(response)),
                NodeProcessed::Advance { encoded, next: rest } => Ok(NodeProcessed::Advance {
                    encoded,
                    next: rebind(rest, next),
                }),
            }
        })
    }

    fn stream(&self, seed: CtxSeed) -> Result<StreamBinding, FlowError> {
        self.inner.stream(seed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
