//! Chat service: session registry and delayed replies.
//!
//! DESIGN
//! ======
//! Sessions are keyed by UUID in `AppState::sessions`. A submit takes the
//! write lock twice: once to record the user message and resolve the reply,
//! and once after the display delay to append it. The delay itself runs
//! with no lock held, so other sessions are never blocked by it.
//!
//! Idle sessions are evicted by a background sweeper.

use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use uuid::Uuid;

use crate::chat::session::ConversationSession;
use crate::chat::{Message, Panel, UiState};
use crate::error::{E_NOT_FOUND, ErrorCode};
use crate::state::{AppState, SessionEntry};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("Chat session not found")]
    SessionNotFound(Uuid),
}

impl ErrorCode for ChatError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => E_NOT_FOUND,
        }
    }
}

/// Full view of one session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub messages: Vec<Message>,
    pub ui_state: UiState,
}

/// Result of one submit. `accepted` is false for blank input.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    pub ui_state: UiState,
    /// Panels this submit unlocked for the first time.
    pub unlocked: Vec<Panel>,
}

fn snapshot(id: Uuid, session: &ConversationSession) -> SessionSnapshot {
    SessionSnapshot { id, messages: session.messages().to_vec(), ui_state: session.ui_state() }
}

/// Open a session greeted by the response table.
pub async fn create_session(state: &AppState) -> SessionSnapshot {
    let id = Uuid::new_v4();
    let session = ConversationSession::new(&state.responses.greeting);
    let view = snapshot(id, &session);
    state.sessions.write().await.insert(id, SessionEntry::new(session));
    info!(%id, "chat session opened");
    view
}

pub async fn get_session(state: &AppState, id: Uuid) -> Result<SessionSnapshot, ChatError> {
    let sessions = state.sessions.read().await;
    let entry = sessions.get(&id).ok_or(ChatError::SessionNotFound(id))?;
    Ok(snapshot(id, &entry.session))
}

pub async fn messages(state: &AppState, id: Uuid) -> Result<Vec<Message>, ChatError> {
    Ok(get_session(state, id).await?.messages)
}

pub async fn ui_state(state: &AppState, id: Uuid) -> Result<UiState, ChatError> {
    let sessions = state.sessions.read().await;
    let entry = sessions.get(&id).ok_or(ChatError::SessionNotFound(id))?;
    Ok(entry.session.ui_state())
}

/// Record the user's text, wait the display delay, then append the reply
/// and apply its signal.
///
/// # Errors
///
/// `SessionNotFound` if the session does not exist, or was ended or evicted
/// while the reply was pending.
pub async fn submit(state: &AppState, id: Uuid, text: &str) -> Result<SubmitOutcome, ChatError> {
    let (pending, before) = {
        let mut sessions = state.sessions.write().await;
        let entry = sessions.get_mut(&id).ok_or(ChatError::SessionNotFound(id))?;
        entry.touch();
        let before = entry.session.ui_state();
        (entry.session.begin(&state.responses, text), before)
    };

    let Some(pending) = pending else {
        debug!(%id, "blank chat input ignored");
        return Ok(SubmitOutcome { accepted: false, reply: None, ui_state: before, unlocked: Vec::new() });
    };

    if !state.chat.reply_delay.is_zero() {
        tokio::time::sleep(state.chat.reply_delay).await;
    }

    let mut sessions = state.sessions.write().await;
    let entry = sessions.get_mut(&id).ok_or(ChatError::SessionNotFound(id))?;
    entry.touch();
    let reply = entry.session.complete(pending).text;
    let ui_state = entry.session.ui_state();
    let unlocked = ui_state.newly_unlocked(&before);
    if !unlocked.is_empty() {
        info!(%id, panels = ?unlocked, "dashboard panels unlocked");
    }
    Ok(SubmitOutcome { accepted: true, reply: Some(reply), ui_state, unlocked })
}

pub async fn end_session(state: &AppState, id: Uuid) -> Result<(), ChatError> {
    if state.sessions.write().await.remove(&id).is_none() {
        return Err(ChatError::SessionNotFound(id));
    }
    info!(%id, "chat session ended");
    Ok(())
}

/// Drop sessions idle for longer than `ttl` as of `now`. Returns how many
/// were evicted.
pub async fn evict_idle(state: &AppState, ttl: Duration, now: Instant) -> usize {
    let mut sessions = state.sessions.write().await;
    let before = sessions.len();
    sessions.retain(|_, entry| now.saturating_duration_since(entry.last_active) <= ttl);
    before - sessions.len()
}

/// Spawn the idle-session sweeper. Returns a handle for shutdown.
pub fn spawn_session_sweeper(state: AppState) -> JoinHandle<()> {
    let ttl = state.chat.session_ttl;
    let period = state.chat.sweep_interval.max(Duration::from_secs(1));
    info!(ttl_secs = ttl.as_secs(), sweep_secs = period.as_secs(), "chat session sweeper configured");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let evicted = evict_idle(&state, ttl, Instant::now()).await;
            if evicted > 0 {
                info!(evicted, "idle chat sessions evicted");
            }
        }
    })
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
