//! Cookie-keyed in-memory session store.
//!
//! Each client is identified by a `stepwise_sid` cookie holding a UUID v7;
//! its session lives in a shared `DashMap`. The engine reads one snapshot
//! per request and hands back an updated copy to write; concurrent
//! requests for the same client are last-write-wins, as the engine's
//! concurrency model specifies.

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use dashmap::DashMap;
use stepwise_types::Session;
use uuid::Uuid;

/// Name of the session identifier cookie.
pub const SESSION_COOKIE: &str = "stepwise_sid";

/// Shared session storage, keyed by client id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<Uuid, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the client's session; empty if none exists yet.
    pub fn snapshot(&self, id: Uuid) -> Session {
        self.sessions
            .get(&id)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    /// Replace the client's session wholesale.
    pub fn put(&self, id: Uuid, session: Session) {
        self.sessions.insert(id, session);
    }

    /// Number of clients with stored sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Extract the session id from the request's `Cookie` header, if present
/// and well-formed.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE {
            Uuid::parse_str(value.trim()).ok()
        } else {
            None
        }
    })
}

/// The session id for this request, minting a fresh one when the client
/// has no valid cookie. The second element is true when minted, so the
/// handler knows to emit a `Set-Cookie`.
pub fn resolve_session_id(headers: &HeaderMap) -> (Uuid, bool) {
    match session_id_from_headers(headers) {
        Some(id) => (id, false),
        None => (Uuid::now_v7(), true),
    }
}

/// `Set-Cookie` value binding `id` to this client.
pub fn set_cookie_value(id: Uuid) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}
