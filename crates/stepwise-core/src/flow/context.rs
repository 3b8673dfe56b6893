//! Immutable per-request facts handed to a step's functions.
//!
//! A `StepContext` is constructed fresh for every request once the
//! sequencer has located the target step, and is never shared across
//! requests. `current` is the step's own submit handle (form action),
//! `previous` the preceding step's display handle (back link), `restart`
//! the handle that discards the whole session.

use std::sync::Arc;

use stepwise_types::Handle;

use crate::flow::sequencer::START_LABEL;
use crate::router::Router;

/// Everything a step function may consult about the current request.
pub struct StepContext<A> {
    current: Handle,
    previous: Option<Handle>,
    stored: Option<A>,
    restart: Handle,
    router: Arc<dyn Router>,
}

/// The label-independent parts of a context, assembled by the sequencer
/// before the node decodes its own stored value.
pub(crate) struct CtxSeed {
    pub current: Handle,
    pub previous: Option<Handle>,
    pub router: Arc<dyn Router>,
}

impl CtxSeed {
    pub(crate) fn new(router: Arc<dyn Router>, label: &str, previous: Option<&str>) -> Self {
        Self {
            current: router.resolve_post(label),
            previous: previous.map(|p| router.resolve_get(p)),
            router,
        }
    }
}

impl<A> StepContext<A> {
    pub(crate) fn new(seed: CtxSeed, stored: Option<A>) -> Self {
        let restart = seed.router.resolve_get(START_LABEL);
        Self {
            current: seed.current,
            previous: seed.previous,
            stored,
            restart,
            router: seed.router,
        }
    }

    /// Submit handle of the current step.
    pub fn current(&self) -> &Handle {
        &self.current
    }

    /// Display handle of the preceding step, if any.
    pub fn previous(&self) -> Option<&Handle> {
        self.previous.as_ref()
    }

    /// The value previously stored for this step, if the client completed
    /// it before (back button, edit). Absent on first visit.
    pub fn stored(&self) -> Option<&A> {
        self.stored.as_ref()
    }

    /// Handle that discards the session and returns to the first step.
    pub fn restart(&self) -> &Handle {
        &self.restart
    }

    /// Resolve an arbitrary step label to its display handle.
    pub fn resolve(&self, label: &str) -> Handle {
        self.router.resolve_get(label)
    }

    /// Resolve an arbitrary step label to its submit handle.
    pub fn resolve_post(&self, label: &str) -> Handle {
        self.router.resolve_post(label)
    }
}

impl<A: Clone> Clone for StepContext<A> {
    fn clone(&self) -> Self {
        Self {
            current: self.current.clone(),
            previous: self.previous.clone(),
            stored: self.stored.clone(),
            restart: self.restart.clone(),
            router: self.router.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PathRouter;

    impl Router for PathRouter {
        fn resolve_get(&self, label: &str) -> Handle {
            Handle::new(format!("/flow/{label}"))
        }

        fn resolve_post(&self, label: &str) -> Handle {
            Handle::new(format!("/flow/{label}"))
        }
    }

    #[test]
    fn test_context_handles_come_from_the_router() {
        let seed = CtxSeed::new(Arc::new(PathRouter), "age", Some("name"));
        let ctx: StepContext<u32> = StepContext::new(seed, Some(30));

        assert_eq!(ctx.current().as_str(), "/flow/age");
        assert_eq!(ctx.previous().map(Handle::as_str), Some("/flow/name"));
        assert_eq!(ctx.restart().as_str(), "/flow/start");
        assert_eq!(ctx.stored(), Some(&30));
        assert_eq!(ctx.resolve("done").as_str(), "/flow/done");
    }

    #[test]
    fn test_first_step_has_no_previous() {
        let seed = CtxSeed::new(Arc::new(PathRouter), "name", None);
        let ctx: StepContext<String> = StepContext::new(seed, None);

        assert!(ctx.previous().is_none());
        assert!(ctx.stored().is_none());
    }
}
