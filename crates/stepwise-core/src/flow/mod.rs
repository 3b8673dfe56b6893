//! Workflow engine core: representation, composition, and stepping.
//!
//! This module contains the "brain" of the engine:
//! - `step` -- The per-step contract (`Step` trait, `Processed` outcome)
//!   and the closure-based `FnStep` builder
//! - `stream` -- Bidirectional message channel and the one-shot stream
//!   handler binding a step may expose
//! - `context` -- Immutable per-request facts handed to step functions
//! - `node` -- The lazily-unfolding `Flow<T>` sequence: step nodes,
//!   continuation binding, terminal values
//! - `sequencer` -- The replay/advance algorithm locating a target label
//!   and executing its render/process/stream function

pub mod context;
pub mod node;
pub mod sequencer;
pub mod step;
pub mod stream;
