//! Shared application state for the axum router.

use std::sync::Arc;

use stepwise_core::Sequencer;
use stepwise_types::Handle;

use crate::session_store::SessionStore;

/// Cloneable state handed to every handler: the workflow sequencer, the
/// session store, and the pre-resolved restart handle (used when a
/// traversal error is translated into a redirect-to-start).
pub struct AppState<T> {
    pub sequencer: Arc<Sequencer<T>>,
    pub sessions: Arc<SessionStore>,
    pub restart: Handle,
}

impl<T> AppState<T> {
    pub fn new(sequencer: Arc<Sequencer<T>>, restart: Handle) -> Self {
        Self {
            sequencer,
            sessions: Arc::new(SessionStore::new()),
            restart,
        }
    }
}

// Manual impl: `derive(Clone)` would demand `T: Clone`, which the Arc
// fields do not need.
impl<T> Clone for AppState<T> {
    fn clone(&self) -> Self {
        Self {
            sequencer: self.sequencer.clone(),
            sessions: self.sessions.clone(),
            restart: self.restart.clone(),
        }
    }
}
