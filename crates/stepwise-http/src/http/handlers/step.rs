//! GET/POST handlers for workflow steps.
//!
//! Each request: resolve the client's session id from its cookie, take a
//! session snapshot, invoke the sequencer, write back the updated session
//! if the engine produced one, and translate the engine's response into
//! HTTP (page body, or 303 redirect so a successful POST lands on a GET).

use std::collections::BTreeMap;

use axum::extract::{Form, Path, State};
use axum::http::HeaderMap;
use axum::http::header::{HeaderValue, SET_COOKIE};
use axum::response::{Html, IntoResponse, Redirect, Response};
use stepwise_core::Reply;
use stepwise_types::{FormData, StepResponse};
use uuid::Uuid;

use crate::http::error::AppError;
use crate::session_store::{resolve_session_id, set_cookie_value};
use crate::state::AppState;

/// GET /flow/{label} - render a step (or fall through to its process
/// path, per the engine's contract).
pub async fn render_step<T: Clone + Send + Sync + 'static>(
    State(state): State<AppState<T>>,
    Path(label): Path<String>,
    headers: HeaderMap,
) -> Response {
    let (id, fresh) = resolve_session_id(&headers);
    let session = state.sessions.snapshot(id);

    match state.sequencer.handle_get(&session, &label).await {
        Ok(reply) => finish(&state, id, fresh, reply),
        Err(error) => AppError::new(error, state.restart.clone()).into_response(),
    }
}

/// POST /flow/{label} - submit a step's form.
pub async fn submit_step<T: Clone + Send + Sync + 'static>(
    State(state): State<AppState<T>>,
    Path(label): Path<String>,
    headers: HeaderMap,
    Form(fields): Form<BTreeMap<String, String>>,
) -> Response {
    let (id, fresh) = resolve_session_id(&headers);
    let session = state.sessions.snapshot(id);
    let form: FormData = fields.into_iter().collect();

    match state.sequencer.handle_post(&session, &label, form).await {
        Ok(reply) => finish(&state, id, fresh, reply),
        Err(error) => AppError::new(error, state.restart.clone()).into_response(),
    }
}

/// Persist the engine's session update (if any) and build the HTTP
/// response, attaching the session cookie when the id was just minted.
fn finish<T>(state: &AppState<T>, id: Uuid, fresh: bool, reply: Reply) -> Response {
    if let Some(updated) = reply.session {
        state.sessions.put(id, updated);
    }

    let mut response = match reply.response {
        StepResponse::Html(body) => Html(body).into_response(),
        StepResponse::Redirect(handle) => Redirect::to(handle.as_str()).into_response(),
    };

    if fresh {
        if let Ok(value) = HeaderValue::from_str(&set_cookie_value(id)) {
            response.headers_mut().insert(SET_COOKIE, value);
        }
    }
    response
}
