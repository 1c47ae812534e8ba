// src/services/session_manager.rs
use std::{collections::HashMap, fmt::Debug, sync::Arc, time::Instant};

use tokio::sync::RwLock;
use tracing::info;

use super::gemini::Content;
use crate::error::SessionError;

/// Session id for a user: `session_{user_id}`.
pub fn session_key(user_id: &str) -> String {
    format!("session_{}", user_id)
}

#[derive(Clone, Debug)]
pub struct Session {
    pub id: String,
    pub app_name: String,
    pub user_id: String,
    pub history: Vec<Content>,
    pub created_at: Instant,
    pub last_active: Instant,
}

impl Session {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        let now = Instant::now();
        Self {
            id: id.into(),
            app_name: app_name.into(),
            user_id: user_id.into(),
            history: Vec::new(),
            created_at: now,
            last_active: now,
        }
    }
}

/// In-memory session store. Sessions are created on demand and live for the
/// lifetime of the process.
#[derive(Clone, Default)]
pub struct SessionManager {
    inner: Arc<RwLock<HashMap<String, Session>>>,
}

impl Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session under `session_id`. Fails if one already exists.
    pub async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<String, SessionError> {
        let mut guard = self.inner.write().await;
        if guard.contains_key(session_id) {
            return Err(SessionError::AlreadyExists(session_id.to_string()));
        }
        guard.insert(
            session_id.to_string(),
            Session::new(app_name, user_id, session_id),
        );
        info!(session_id, user_id, "session created");
        Ok(session_id.to_string())
    }

    pub async fn get_session(&self, session_id: &str) -> Option<Session> {
        let guard = self.inner.read().await;
        guard.get(session_id).cloned()
    }

    /// Get a copy of the session history
    pub async fn get_history(&self, session_id: &str) -> Option<Vec<Content>> {
        let guard = self.inner.read().await;
        guard.get(session_id).map(|s| s.history.clone())
    }

    /// Append contents to a session's history and touch last_active.
    /// Returns the new history length, or `None` if the session is unknown.
    pub async fn append_history(
        &self,
        session_id: &str,
        contents: impl IntoIterator<Item = Content>,
    ) -> Option<usize> {
        let mut guard = self.inner.write().await;
        let session = guard.get_mut(session_id)?;
        session.history.extend(contents);
        session.last_active = Instant::now();
        Some(session.history.len())
    }

    pub async fn contains(&self, session_id: &str) -> bool {
        self.inner.read().await.contains_key(session_id)
    }

    /// Number of sessions
    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// List session ids
    pub async fn list_session_ids(&self) -> Vec<String> {
        let guard = self.inner.read().await;
        guard.keys().cloned().collect()
    }
}
