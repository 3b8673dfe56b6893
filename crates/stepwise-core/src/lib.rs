//! Workflow representation and stepping engine for Stepwise.
//!
//! This crate defines the engine and its "ports": the [`Router`] trait a
//! host transport implements, and the [`flow`] module holding the workflow
//! representation ([`Flow`]), the step contract ([`Step`]), and the
//! stepping algorithm ([`Sequencer`]). It depends only on
//! `stepwise-types` -- never on any HTTP or storage crate.

pub mod flow;
pub mod router;

pub use flow::context::StepContext;
pub use flow::node::{Flow, step};
pub use flow::sequencer::{Reply, START_LABEL, Sequencer};
pub use flow::step::{FnStep, Processed, Step, StepFuture};
pub use flow::stream::{MessageChannel, StreamBinding};
pub use router::Router;
