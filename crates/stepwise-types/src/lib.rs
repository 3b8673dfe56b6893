//! Shared domain types for Stepwise.
//!
//! This crate contains the plain types used across the Stepwise engine and
//! its host adapters: the error taxonomy, the client-held `Session`, the
//! per-step value `Codec`, and the small wire-facing types (`Handle`,
//! `StepResponse`, `FormData`).
//!
//! Zero infrastructure dependencies -- only serde, serde_json, thiserror.

pub mod codec;
pub mod error;
pub mod http;
pub mod session;

pub use codec::{Codec, DecodeError};
pub use error::FlowError;
pub use http::{FormData, Handle, StepResponse};
pub use session::Session;
