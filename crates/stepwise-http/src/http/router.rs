//! Axum route table and the URL-based label router.
//!
//! Steps live under [`FLOW_MOUNT`]: `GET /flow/{label}` renders,
//! `POST /flow/{label}` submits, `GET /flow/{label}/stream` upgrades to a
//! WebSocket. Middleware: request tracing and permissive CORS.

use axum::Router as AxumRouter;
use axum::routing::get;
use stepwise_core::Router;
use stepwise_types::Handle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Default mount point for workflow step routes.
pub const FLOW_MOUNT: &str = "/flow";

/// Resolves step labels to paths under a mount point.
///
/// GET and POST share the same path; the method selects the render or
/// process behavior.
#[derive(Debug, Clone)]
pub struct UrlRouter {
    mount: String,
}

impl UrlRouter {
    pub fn new(mount: impl Into<String>) -> Self {
        Self {
            mount: mount.into(),
        }
    }
}

impl Default for UrlRouter {
    fn default() -> Self {
        Self::new(FLOW_MOUNT)
    }
}

impl Router for UrlRouter {
    fn resolve_get(&self, label: &str) -> Handle {
        Handle::new(format!("{}/{label}", self.mount))
    }

    fn resolve_post(&self, label: &str) -> Handle {
        Handle::new(format!("{}/{label}", self.mount))
    }
}

/// Build the complete router for a workflow application.
pub fn build_router<T: Clone + Send + Sync + 'static>(state: AppState<T>) -> AxumRouter {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    AxumRouter::new()
        .route(
            "/flow/{label}",
            get(handlers::step::render_step::<T>).post(handlers::step::submit_step::<T>),
        )
        .route("/flow/{label}/stream", get(handlers::stream::stream_step::<T>))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_router_resolves_under_mount() {
        let router = UrlRouter::default();
        assert_eq!(router.resolve_get("name").as_str(), "/flow/name");
        assert_eq!(router.resolve_post("name").as_str(), "/flow/name");
    }

    #[test]
    fn test_url_router_custom_mount() {
        let router = UrlRouter::new("/signup");
        assert_eq!(router.resolve_get("age").as_str(), "/signup/age");
    }
}
