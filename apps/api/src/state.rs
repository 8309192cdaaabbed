use std::sync::Arc;

use crate::chat::orchestrator::Orchestrator;
use crate::chat::store::SessionStore;

/// Shared application state injected into all route handlers via Axum
/// extractors. The orchestrator and its clients are stateless and shared;
/// all mutable state lives inside `sessions`, isolated per session.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub sessions: SessionStore,
}
