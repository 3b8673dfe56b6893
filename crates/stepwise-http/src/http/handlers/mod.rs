//! Request handlers for workflow step routes.

pub mod step;
pub mod stream;
