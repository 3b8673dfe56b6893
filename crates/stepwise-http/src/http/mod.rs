//! HTTP surface: route table, error mapping, and request handlers.

pub mod error;
pub mod handlers;
pub mod router;
