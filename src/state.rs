//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the CRUD gateway (store plus list cache), the response table,
//! and the map of live chat sessions. Sessions live only in memory; the
//! sweeper evicts idle ones.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::chat::responses::ResponseTable;
use crate::chat::session::ConversationSession;
use crate::config::ChatConfig;
use crate::gateway::CrudGateway;

// =============================================================================
// CHAT SESSION ENTRY
// =============================================================================

/// One live conversation plus the time it was last touched.
pub struct SessionEntry {
    pub session: ConversationSession,
    pub last_active: Instant,
}

impl SessionEntry {
    #[must_use]
    pub fn new(session: ConversationSession) -> Self {
        Self { session, last_active: Instant::now() }
    }

    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; every field is Arc-backed or cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub gateway: CrudGateway,
    pub responses: Arc<ResponseTable>,
    pub sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    pub chat: ChatConfig,
}

impl AppState {
    #[must_use]
    pub fn new(gateway: CrudGateway, responses: ResponseTable, chat: ChatConfig) -> Self {
        Self { gateway, responses: Arc::new(responses), sessions: Arc::new(RwLock::new(HashMap::new())), chat }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::time::Duration;

    use super::*;
    use crate::gateway::cache::QueryCache;
    use crate::models::Project;
    use crate::models::input::ProjectDraft;
    use crate::store::memory::MemoryStore;

    /// Create a test `AppState` over an empty in-memory store, the built-in
    /// response table, and no reply delay.
    #[must_use]
    pub fn test_app_state() -> AppState {
        let chat = ChatConfig { reply_delay: Duration::ZERO, ..ChatConfig::default() };
        test_app_state_with_chat(chat)
    }

    #[must_use]
    pub fn test_app_state_with_chat(chat: ChatConfig) -> AppState {
        let gateway = CrudGateway::new(Arc::new(MemoryStore::new()), QueryCache::new(true));
        let responses = ResponseTable::builtin().expect("builtin table should compile");
        AppState::new(gateway, responses, chat)
    }

    /// Create a project named `name` starting 2025-01-01.
    pub async fn seed_project(state: &AppState, name: &str) -> Project {
        state
            .gateway
            .create_project(ProjectDraft {
                name: Some(name.to_owned()),
                start_date: Some(time::macros::datetime!(2025-01-01 00:00 UTC)),
                end_date: Some(time::macros::datetime!(2025-06-30 00:00 UTC)),
                ..ProjectDraft::default()
            })
            .await
            .expect("seed project")
    }
}
