//! The per-step contract: three independently-injectable functions over a
//! [`StepContext`].
//!
//! `render` shows the step (returning `None` means "treat this request as
//! a process request"), `process` consumes submitted input and either
//! halts with a response or advances with a value, and `stream` may expose
//! a bidirectional handler. All three are async and may suspend on I/O
//! inside the step's own logic.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use stepwise_types::{FlowError, FormData, StepResponse};

use crate::flow::context::StepContext;
use crate::flow::stream::StreamBinding;

/// Future type returned by step functions.
pub type StepFuture<T> = BoxFuture<'static, Result<T, FlowError>>;

/// Outcome of a step's process function.
#[derive(Debug)]
pub enum Processed<A> {
    /// Short-circuit: show this response, store nothing, stay on this
    /// step (validation failure, confirmation page, terminal display).
    Halt(StepResponse),
    /// Success: persist this value and redirect to whatever step the
    /// workflow computes next.
    Advance(A),
}

/// A named unit of interaction in a workflow.
///
/// Implementations receive an owned context (and, for `process`, the
/// submitted form) and return `'static` futures, so async bodies capture
/// clones rather than borrows.
pub trait Step: Send + Sync + 'static {
    /// The value this step produces on success.
    type Value: Clone + Send + Sync + 'static;

    /// Produce a display response, or `None` to fall through to the
    /// process path for the same request.
    fn render(&self, ctx: StepContext<Self::Value>) -> StepFuture<Option<StepResponse>>;

    /// Consume submitted input.
    fn process(
        &self,
        ctx: StepContext<Self::Value>,
        form: FormData,
    ) -> StepFuture<Processed<Self::Value>>;

    /// Expose a bidirectional stream handler, if this step supports one.
    fn stream(&self, ctx: StepContext<Self::Value>) -> Option<StreamBinding> {
        let _ = ctx;
        None
    }
}

type RenderFn<A> =
    Arc<dyn Fn(StepContext<A>) -> Result<Option<StepResponse>, FlowError> + Send + Sync>;
type ProcessFn<A> =
    Arc<dyn Fn(StepContext<A>, FormData) -> Result<Processed<A>, FlowError> + Send + Sync>;
type StreamFn<A> = Arc<dyn Fn(StepContext<A>) -> StreamBinding + Send + Sync>;

/// Closure-based [`Step`] for synchronous step logic.
///
/// Covers the common case where a step's render/process bodies do no I/O
/// of their own. Steps that need to await inside their logic implement
/// [`Step`] directly.
pub struct FnStep<A> {
    render: Option<RenderFn<A>>,
    process: ProcessFn<A>,
    stream: Option<StreamFn<A>>,
}

impl<A> Clone for FnStep<A> {
    fn clone(&self) -> Self {
        Self {
            render: self.render.clone(),
            process: self.process.clone(),
            stream: self.stream.clone(),
        }
    }
}

impl<A> FnStep<A> {
    /// Build a step from its (mandatory) process function. Render defaults
    /// to `None` (fall through to process) and no stream is exposed.
    pub fn new(
        process: impl Fn(StepContext<A>, FormData) -> Result<Processed<A>, FlowError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            render: None,
            process: Arc::new(process),
            stream: None,
        }
    }

    /// Attach a render function.
    pub fn on_render(
        mut self,
        render: impl Fn(StepContext<A>) -> Result<Option<StepResponse>, FlowError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.render = Some(Arc::new(render));
        self
    }

    /// Attach a stream handler factory.
    pub fn on_stream(
        mut self,
        stream: impl Fn(StepContext<A>) -> StreamBinding + Send + Sync + 'static,
    ) -> Self {
        self.stream = Some(Arc::new(stream));
        self
    }
}

impl<A: Clone + Send + Sync + 'static> Step for FnStep<A> {
    type Value = A;

    fn render(&self, ctx: StepContext<A>) -> StepFuture<Option<StepResponse>> {
        let out = match &self.render {
            Some(f) => f(ctx),
            None => Ok(None),
        };
        Box::pin(async move { out })
    }

    fn process(&self, ctx: StepContext<A>, form: FormData) -> StepFuture<Processed<A>> {
        let out = (self.process)(ctx, form);
        Box::pin(async move { out })
    }

    fn stream(&self, ctx: StepContext<A>) -> Option<StreamBinding> {
        self.stream.as_ref().map(|f| f(ctx))
    }
}
