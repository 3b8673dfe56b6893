//! The stepping algorithm: locate a target step by replaying the workflow
//! definition against the session, then execute its render, process, or
//! stream function.
//!
//! Each incoming request triggers one independent traversal over the
//! immutable [`Flow`] blueprint. The walk starts at the root; every node
//! before the target must already have a session value (the render path
//! never executes steps the client has not completed), which is decoded
//! and fed into the node's continuation to compute the next link. Label
//! collisions are detected during the walk with a per-traversal seen-set.
//!
//! The engine holds no mutable state of its own: a successful process
//! returns the updated session to the caller instead of writing anywhere,
//! which is what makes replays (back button, double submit, reload)
//! harmless -- re-processing a step overwrites its single entry and
//! recomputes the same redirect.

use std::collections::HashSet;
use std::sync::Arc;

use stepwise_types::{FlowError, FormData, Session, StepResponse};

use crate::flow::context::CtxSeed;
use crate::flow::node::{Flow, FlowNode, Inner, NodeProcessed};
use crate::flow::stream::StreamBinding;
use crate::router::Router;

/// Reserved label: discard all session state and redirect to the
/// workflow's first step.
pub const START_LABEL: &str = "start";

/// Engine result for one request.
#[derive(Debug)]
pub struct Reply {
    /// The response to send to the client.
    pub response: StepResponse,
    /// Updated session, when this request changed it (successful process,
    /// restart). `None` means the caller's snapshot is still current.
    pub session: Option<Session>,
}

/// Drives clients through a workflow one step at a time.
///
/// Holds the workflow blueprint and the host's router; safe to share and
/// invoke concurrently, since every request walks its own clone of the
/// definition.
pub struct Sequencer<T> {
    flow: Flow<T>,
    router: Arc<dyn Router>,
}

/// The target node as found by the walk, plus the label that preceded it.
struct Located<T> {
    node: Arc<dyn FlowNode<T>>,
    previous: Option<String>,
}

impl<T: Clone + Send + Sync + 'static> Sequencer<T> {
    pub fn new(flow: Flow<T>, router: Arc<dyn Router>) -> Self {
        Self { flow, router }
    }

    /// Display the step at `label`.
    ///
    /// If the step's render function declines to produce a response, the
    /// same request falls through to the process path with empty input.
    pub async fn handle_get(&self, session: &Session, label: &str) -> Result<Reply, FlowError> {
        if label == START_LABEL {
            return self.restart();
        }
        let located = self.locate(session, label)?;
        let stored = session.get(label).map(str::to_string);
        let seed = self.seed(label, &located);
        if let Some(response) = located.node.render(seed, stored.clone()).await? {
            return Ok(Reply {
                response,
                session: None,
            });
        }
        tracing::debug!(step = label, "render fell through to process");
        self.process_at(&located, session, label, stored, FormData::new())
            .await
    }

    /// Submit input to the step at `label`.
    pub async fn handle_post(
        &self,
        session: &Session,
        label: &str,
        form: FormData,
    ) -> Result<Reply, FlowError> {
        if label == START_LABEL {
            return self.restart();
        }
        let located = self.locate(session, label)?;
        let stored = session.get(label).map(str::to_string);
        self.process_at(&located, session, label, stored, form).await
    }

    /// Locate the step at `label` and hand back its stream handler.
    ///
    /// Prior steps' values are replayed as usual; the target step's own
    /// stored value is not rehydrated.
    pub async fn handle_stream(
        &self,
        session: &Session,
        label: &str,
    ) -> Result<StreamBinding, FlowError> {
        let located = self.locate(session, label)?;
        let seed = self.seed(label, &located);
        located.node.stream(seed)
    }

    /// Restart: fresh session, redirect to the workflow's first label.
    ///
    /// Peeking the first label consumes no session state.
    fn restart(&self) -> Result<Reply, FlowError> {
        let first = self
            .flow
            .first_label()
            .ok_or_else(|| FlowError::FlowExhausted {
                label: START_LABEL.to_string(),
            })?;
        tracing::debug!(first, "workflow restart");
        Ok(Reply {
            response: StepResponse::Redirect(self.router.resolve_get(first)),
            session: Some(Session::new()),
        })
    }

    /// Walk the definition from the root until the node labeled `target`,
    /// replaying stored values through each intermediate continuation.
    fn locate(&self, session: &Session, target: &str) -> Result<Located<T>, FlowError> {
        let mut cursor = self.flow.clone();
        let mut previous: Option<String> = None;
        let mut seen: HashSet<String> = HashSet::new();

        loop {
            let node = match cursor.inner {
                Inner::Done(_) => {
                    return Err(FlowError::FlowExhausted {
                        label: target.to_string(),
                    });
                }
                Inner::Step(node) => node,
            };

            let label = node.label().to_string();
            if !seen.insert(label.clone()) {
                return Err(FlowError::DuplicateLabel { label });
            }
            if label == target {
                return Ok(Located { node, previous });
            }

            // Not the target: this step must already be completed.
            let raw = session
                .get(&label)
                .ok_or_else(|| FlowError::MissingStepValue {
                    label: label.clone(),
                })?;
            cursor = node.advance(raw)?;
            previous = Some(label);
        }
    }

    /// Run the target node's process function and, on success, merge its
    /// value into the session and redirect to the next step's label.
    async fn process_at(
        &self,
        located: &Located<T>,
        session: &Session,
        label: &str,
        stored: Option<String>,
        form: FormData,
    ) -> Result<Reply, FlowError> {
        let seed = self.seed(label, located);
        match located.node.process(seed, stored, form).await? {
            NodeProcessed::Halt(response) => Ok(Reply {
                response,
                session: None,
            }),
            NodeProcessed::Advance { encoded, next } => {
                let next_label = next
                    .first_label()
                    .ok_or_else(|| FlowError::FlowExhausted {
                        label: label.to_string(),
                    })?
                    .to_string();
                let updated = session.with_entry(label, encoded);
                tracing::debug!(step = label, next = %next_label, "step completed");
                Ok(Reply {
                    response: StepResponse::Redirect(self.router.resolve_get(&next_label)),
                    session: Some(updated),
                })
            }
        }
    }

    fn seed(&self, label: &str, located: &Located<T>) -> CtxSeed {
        CtxSeed::new(self.router.clone(), label, located.previous.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::node::step;
    use crate::flow::step::{FnStep, Processed};
    use crate::flow::stream::MessageChannel;
    use stepwise_types::{Codec, Handle};

    struct PathRouter;

    impl Router for PathRouter {
        fn resolve_get(&self, label: &str) -> Handle {
            Handle::new(format!("/flow/{label}"))
        }

        fn resolve_post(&self, label: &str) -> Handle {
            Handle::new(format!("/flow/{label}"))
        }
    }

    /// A step that renders a page naming itself and advances with the
    /// submitted "value" field.
    fn text_step(name: &str) -> FnStep<String> {
        let render_name = name.to_string();
        FnStep::new(|_, form| match form.get("value") {
            Some(v) => Ok(Processed::Advance(v.to_string())),
            None => Ok(Processed::Halt(StepResponse::Html("value required".into()))),
        })
        .on_render(move |ctx| {
            let back = ctx
                .previous()
                .map(|h| h.to_string())
                .unwrap_or_default();
            Ok(Some(StepResponse::Html(format!(
                "<form action=\"{}\">{render_name} (back: {back})</form>",
                ctx.current()
            ))))
        })
    }

    /// A step advancing with the parsed "value" field as a number.
    fn number_step() -> FnStep<u32> {
        FnStep::new(|_, form| match form.get("value").map(str::parse::<u32>) {
            Some(Ok(n)) => Ok(Processed::Advance(n)),
            _ => Ok(Processed::Halt(StepResponse::Html("a number, please".into()))),
        })
        .on_render(|_| Ok(Some(StepResponse::Html("number form".into()))))
    }

    /// A terminal display step: renders a summary, never advances.
    fn summary_step(text: &str) -> FnStep<String> {
        let body = text.to_string();
        let halt_body = text.to_string();
        FnStep::new(move |_, _| Ok(Processed::Halt(StepResponse::Html(halt_body.clone()))))
            .on_render(move |_| Ok(Some(StepResponse::Html(body.clone()))))
    }

    /// The §-scenario shape: name (String), then age (u32), then finished.
    fn name_age_flow() -> Flow<u32> {
        step("name", text_step("name"), Codec::json())
            .and_then(|_name| step("age", number_step(), Codec::json()))
    }

    fn sequencer<T: Clone + Send + Sync + 'static>(flow: Flow<T>) -> Sequencer<T> {
        Sequencer::new(flow, Arc::new(PathRouter))
    }

    fn form(value: &str) -> FormData {
        FormData::new().with("value", value)
    }

    // -----------------------------------------------------------------------
    // Render path
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_get_first_step_renders_without_session() {
        let seq = sequencer(name_age_flow());
        let reply = seq.handle_get(&Session::new(), "name").await.unwrap();

        match reply.response {
            StepResponse::Html(body) => assert!(body.contains("name"), "got: {body}"),
            other => panic!("expected page, got {other:?}"),
        }
        assert!(reply.session.is_none(), "render alone must not touch the session");
    }

    #[tokio::test]
    async fn test_get_later_step_replays_prior_values() {
        let seq = sequencer(name_age_flow());
        let session = Session::new().with_entry("name", "\"Alice\"");

        let reply = seq.handle_get(&session, "age").await.unwrap();
        match reply.response {
            StepResponse::Html(body) => assert_eq!(body, "number form"),
            other => panic!("expected page, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_replay_is_deterministic() {
        let seq = sequencer(name_age_flow());
        let session = Session::new().with_entry("name", "\"Alice\"");

        let first = seq.handle_get(&session, "age").await.unwrap();
        let second = seq.handle_get(&session, "age").await.unwrap();
        assert_eq!(first.response, second.response);
        assert!(first.session.is_none());
        assert!(second.session.is_none());
    }

    #[tokio::test]
    async fn test_get_render_none_falls_through_to_process() {
        // No render function: a GET behaves as an (empty) process request.
        let flow = step(
            "quiet",
            FnStep::<String>::new(|_, _| {
                Ok(Processed::Halt(StepResponse::Html("processed".into())))
            }),
            Codec::json(),
        );
        let seq = sequencer(flow);

        let reply = seq.handle_get(&Session::new(), "quiet").await.unwrap();
        match reply.response {
            StepResponse::Html(body) => assert_eq!(body, "processed"),
            other => panic!("expected fall-through, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_skipping_ahead_fails_with_missing_value() {
        let seq = sequencer(name_age_flow());

        let err = seq.handle_get(&Session::new(), "age").await.unwrap_err();
        match err {
            FlowError::MissingStepValue { label } => assert_eq!(label, "name"),
            other => panic!("expected MissingStepValue, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_unknown_label_past_the_end_is_exhausted() {
        let seq = sequencer(name_age_flow());
        let session = Session::new()
            .with_entry("name", "\"Alice\"")
            .with_entry("age", "30");

        let err = seq.handle_get(&session, "done").await.unwrap_err();
        match err {
            FlowError::FlowExhausted { label } => assert_eq!(label, "done"),
            other => panic!("expected FlowExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_corrupted_session_entry_fails_decode() {
        let seq = sequencer(name_age_flow());
        // "name" holds a bare word, not a JSON string.
        let session = Session::new().with_entry("name", "Alice");

        let err = seq.handle_get(&session, "age").await.unwrap_err();
        match err {
            FlowError::Decode { label, .. } => assert_eq!(label, "name"),
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Process path
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_post_stores_value_and_redirects_to_next() {
        let seq = sequencer(name_age_flow());

        let reply = seq
            .handle_post(&Session::new(), "name", form("Alice"))
            .await
            .unwrap();

        assert_eq!(
            reply.response.redirect_target().map(Handle::as_str),
            Some("/flow/age")
        );
        let session = reply.session.expect("process must return the updated session");
        assert_eq!(session.get("name"), Some("\"Alice\""));
        assert_eq!(session.len(), 1, "exactly one entry per successful process");
    }

    #[tokio::test]
    async fn test_post_halt_leaves_session_unchanged() {
        let seq = sequencer(name_age_flow());

        // Missing "value" field: the step short-circuits.
        let reply = seq
            .handle_post(&Session::new(), "name", FormData::new())
            .await
            .unwrap();

        match reply.response {
            StepResponse::Html(body) => assert_eq!(body, "value required"),
            other => panic!("expected halt page, got {other:?}"),
        }
        assert!(reply.session.is_none());
    }

    #[tokio::test]
    async fn test_post_retry_overwrites_rather_than_duplicates() {
        let seq = sequencer(name_age_flow());
        let session = Session::new().with_entry("name", "\"Alice\"");

        let reply = seq.handle_post(&session, "name", form("Bob")).await.unwrap();
        let updated = reply.session.unwrap();
        assert_eq!(updated.get("name"), Some("\"Bob\""));
        assert_eq!(updated.len(), 1);
    }

    #[tokio::test]
    async fn test_post_past_last_step_is_exhausted() {
        // §-scenario tail: a successful "age" process has nowhere to
        // redirect, because the continuation yields a finished workflow.
        let seq = sequencer(name_age_flow());
        let session = Session::new().with_entry("name", "\"Alice\"");

        let err = seq.handle_post(&session, "age", form("30")).await.unwrap_err();
        match err {
            FlowError::FlowExhausted { label } => assert_eq!(label, "age"),
            other => panic!("expected FlowExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_full_walkthrough_with_terminal_step() {
        let flow = step("name", text_step("name"), Codec::json()).and_then(|name| {
            step("age", number_step(), Codec::json()).and_then(move |age| {
                step(
                    "summary",
                    summary_step(&format!("{name}, {age}")),
                    Codec::json(),
                )
            })
        });
        let seq = sequencer(flow);

        let reply = seq
            .handle_post(&Session::new(), "name", form("Alice"))
            .await
            .unwrap();
        let session = reply.session.unwrap();

        let reply = seq.handle_post(&session, "age", form("30")).await.unwrap();
        assert_eq!(
            reply.response.redirect_target().map(Handle::as_str),
            Some("/flow/summary")
        );
        let session = reply.session.unwrap();
        assert_eq!(session.len(), 2);

        let reply = seq.handle_get(&session, "summary").await.unwrap();
        match reply.response {
            StepResponse::Html(body) => assert_eq!(body, "Alice, 30"),
            other => panic!("expected summary page, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Data-dependent branching
    // -----------------------------------------------------------------------

    fn branching_flow() -> Flow<String> {
        step("choose", text_step("choose"), Codec::json()).and_then(|choice| {
            if choice == "A" {
                step("3a", summary_step("branch a"), Codec::json())
            } else {
                step("3b", summary_step("branch b"), Codec::json())
            }
        })
    }

    #[tokio::test]
    async fn test_branching_follows_the_stored_value() {
        let seq = sequencer(branching_flow());

        let reply = seq
            .handle_post(&Session::new(), "choose", form("A"))
            .await
            .unwrap();
        assert_eq!(
            reply.response.redirect_target().map(Handle::as_str),
            Some("/flow/3a")
        );

        let reply = seq
            .handle_post(&Session::new(), "choose", form("B"))
            .await
            .unwrap();
        assert_eq!(
            reply.response.redirect_target().map(Handle::as_str),
            Some("/flow/3b")
        );
    }

    #[tokio::test]
    async fn test_branch_target_is_reachable_only_on_its_branch() {
        let seq = sequencer(branching_flow());
        let session = Session::new().with_entry("choose", "\"B\"");

        // The replay unfolds toward "3b"; "3a" is not on this path.
        assert!(seq.handle_get(&session, "3b").await.is_ok());
        let err = seq.handle_get(&session, "3a").await.unwrap_err();
        match err {
            FlowError::MissingStepValue { label } => assert_eq!(label, "3b"),
            other => panic!("expected MissingStepValue, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Restart sentinel
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_restart_clears_session_and_redirects_to_first_label() {
        let seq = sequencer(name_age_flow());
        let session = Session::new()
            .with_entry("name", "\"Alice\"")
            .with_entry("age", "30");

        let reply = seq.handle_get(&session, START_LABEL).await.unwrap();
        assert_eq!(
            reply.response.redirect_target().map(Handle::as_str),
            Some("/flow/name")
        );
        assert!(reply.session.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restart_is_idempotent() {
        let seq = sequencer(name_age_flow());

        let a = seq.handle_get(&Session::new(), START_LABEL).await.unwrap();
        let b = seq
            .handle_post(&Session::new(), START_LABEL, FormData::new())
            .await
            .unwrap();
        assert_eq!(a.response, b.response);
        assert!(a.session.unwrap().is_empty());
        assert!(b.session.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restart_on_an_empty_workflow_is_exhausted() {
        let seq = sequencer(Flow::pure("done".to_string()));
        let err = seq
            .handle_get(&Session::new(), START_LABEL)
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::FlowExhausted { .. }));
    }

    // -----------------------------------------------------------------------
    // Duplicate labels
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_duplicate_label_detected_during_walk() {
        let flow = step("twice", text_step("first"), Codec::json())
            .and_then(|_| step("twice", text_step("second"), Codec::json()));
        let seq = sequencer(flow);
        let session = Session::new().with_entry("twice", "\"x\"");

        // Searching for any label past the collision trips the seen-set.
        let err = seq.handle_get(&session, "elsewhere").await.unwrap_err();
        match err {
            FlowError::DuplicateLabel { label } => assert_eq!(label, "twice"),
            other => panic!("expected DuplicateLabel, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Stream path
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_stream_binding_is_located_and_runs() {
        let streaming = FnStep::<String>::new(|_, _| {
            Ok(Processed::Halt(StepResponse::Html("page".into())))
        })
        .on_stream(|ctx| {
            assert!(ctx.stored().is_none(), "stream entry must not rehydrate");
            StreamBinding::new(|mut channel: MessageChannel| async move {
                while let Some(msg) = channel.incoming.recv().await {
                    if channel.outgoing.send(format!("got {msg}")).await.is_err() {
                        break;
                    }
                }
                Ok::<(), FlowError>(())
            })
        });
        let flow = step("live", streaming, Codec::json());
        let seq = sequencer(flow);

        let binding = seq
            .handle_stream(&Session::new(), "live")
            .await
            .unwrap();

        let (mut host, handler_end) = MessageChannel::pair();
        let task = tokio::spawn(binding.run(handler_end));
        host.outgoing.send("hi".to_string()).await.unwrap();
        assert_eq!(host.incoming.recv().await.as_deref(), Some("got hi"));
        drop(host);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_stream_on_streamless_step_is_unsupported() {
        let seq = sequencer(name_age_flow());
        let err = seq
            .handle_stream(&Session::new(), "name")
            .await
            .unwrap_err();
        match err {
            FlowError::UnsupportedStream { label } => assert_eq!(label, "name"),
            other => panic!("expected UnsupportedStream, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stream_requires_prior_steps_completed() {
        let streaming = FnStep::<u32>::new(|_, _| {
            Ok(Processed::Halt(StepResponse::Html("page".into())))
        })
        .on_stream(|_| StreamBinding::new(|_| async { Ok::<(), FlowError>(()) }));
        let flow = step("name", text_step("name"), Codec::json())
            .and_then(move |_| step("live", streaming.clone(), Codec::json()));
        let seq = sequencer(flow);

        let err = seq
            .handle_stream(&Session::new(), "live")
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::MissingStepValue { .. }));
    }
}
