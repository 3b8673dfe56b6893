//! Axum host adapter for the Stepwise engine.
//!
//! Binds the transport-agnostic engine to HTTP: a URL router mapping step
//! labels onto paths under a mount point, a cookie-keyed in-memory session
//! store, error-to-status mapping, and a WebSocket bridge for stream
//! steps. The demo wizard binary (`stepwise-demo`) lives in `main.rs`.

pub mod http;
pub mod session_store;
pub mod state;

pub use http::router::{FLOW_MOUNT, UrlRouter, build_router};
pub use session_store::SessionStore;
pub use state::AppState;
