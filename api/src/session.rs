//! Per-user session context.
//!
//! Each browser gets a session id cookie; everything a user builds up
//! (credential, the current document's chain, chat history) lives in that
//! session and nowhere else.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use pdfchat_rag::{ApiKey, ConversationalRetrievalChain, IndexSummary, QaTurn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "pdfchat_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Unconfigured,
    NoDocument,
    Processing,
    Ready,
}

pub struct Session {
    credential: Option<ApiKey>,
    chain: Option<Arc<ConversationalRetrievalChain>>,
    document: Option<IndexSummary>,
    processing: bool,
    history: Vec<QaTurn>,
    last_seen: Instant,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            credential: None,
            chain: None,
            document: None,
            processing: false,
            history: Vec::new(),
            last_seen: Instant::now(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        if self.credential.is_none() {
            SessionStatus::Unconfigured
        } else if self.processing {
            SessionStatus::Processing
        } else if self.chain.is_some() {
            SessionStatus::Ready
        } else {
            SessionStatus::NoDocument
        }
    }

    pub fn credential(&self) -> Option<&ApiKey> {
        self.credential.as_ref()
    }

    pub fn document(&self) -> Option<&IndexSummary> {
        self.document.as_ref()
    }

    pub fn history(&self) -> &[QaTurn] {
        &self.history
    }

    /// A different key invalidates the document: its chain talks to the
    /// provider with the key it was indexed under.
    pub fn set_credential(&mut self, api_key: ApiKey) {
        if self.credential.as_ref() != Some(&api_key) {
            self.discard_document();
        }
        self.credential = Some(api_key);
    }

    /// Forgets the key along with the chain built on it. History is kept.
    pub fn clear_credential(&mut self) {
        self.credential = None;
        self.discard_document();
    }

    fn discard_document(&mut self) {
        self.chain = None;
        self.document = None;
    }

    pub fn require_credential(&self) -> Result<ApiKey, ApiError> {
        self.credential.clone().ok_or_else(ApiError::missing_credential)
    }

    /// Enters `Processing`, discarding the current document. Returns the
    /// credential the new document should be indexed with.
    pub fn begin_upload(&mut self) -> Result<ApiKey, ApiError> {
        let credential = self.require_credential()?;
        if self.processing {
            return Err(ApiError::processing());
        }

        self.processing = true;
        self.discard_document();
        Ok(credential)
    }

    /// Leaves `Processing`: `Ready` with the new chain, or back to no document.
    /// A chain indexed under a key the session no longer holds is dropped.
    /// History is kept either way. Returns whether the chain was installed.
    pub fn finish_upload(
        &mut self,
        indexed_with: &ApiKey,
        outcome: Option<(ConversationalRetrievalChain, IndexSummary)>,
    ) -> bool {
        self.processing = false;
        match outcome {
            Some((chain, summary)) if self.credential.as_ref() == Some(indexed_with) => {
                self.chain = Some(Arc::new(chain));
                self.document = Some(summary);
                true
            }
            _ => {
                self.discard_document();
                false
            }
        }
    }

    /// Snapshot needed to answer a question without holding the session lock.
    pub fn begin_question(&self) -> Result<(Arc<ConversationalRetrievalChain>, Vec<QaTurn>), ApiError> {
        match self.status() {
            SessionStatus::Unconfigured => Err(ApiError::missing_credential()),
            SessionStatus::Processing => Err(ApiError::processing()),
            SessionStatus::NoDocument => Err(ApiError::no_document()),
            SessionStatus::Ready => {
                let chain = self.chain.clone().ok_or_else(ApiError::no_document)?;
                Ok((chain, self.history.clone()))
            }
        }
    }

    pub fn record_turn(&mut self, turn: QaTurn) {
        self.history.push(turn);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_seen.elapsed()
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// The session attached to the current request by [`session_middleware`].
#[derive(Clone)]
pub struct CurrentSession {
    pub id: Uuid,
    pub handle: SessionHandle,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn create(&self) -> (Uuid, SessionHandle) {
        let id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(Session::new()));
        self.sessions.write().await.insert(id, handle.clone());
        log::debug!("Created session {}", id);
        (id, handle)
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops sessions idle for longer than `max_idle`. Sessions busy with a
    /// request are skipped.
    pub async fn sweep_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => session.idle_for() <= max_idle,
            Err(_) => true,
        });

        before - sessions.len()
    }
}

/// Periodically ends idle sessions, releasing their index and history.
pub async fn run_session_sweeper(store: SessionStore, max_idle: Duration) {
    let period = max_idle.min(Duration::from_secs(60)).max(Duration::from_secs(1));
    let mut ticker = tokio::time::interval(period);

    loop {
        ticker.tick().await;
        let removed = store.sweep_idle(max_idle).await;
        if removed > 0 {
            log::info!("Ended {} idle sessions", removed);
        }
    }
}

/// Resolves the session cookie to a session, creating one when the cookie is
/// missing or stale, and makes it available to handlers as [`CurrentSession`].
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = match jar
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
    {
        Some(id) => state.sessions.get(&id).await.map(|handle| (id, handle)),
        None => None,
    };

    let (current, is_new) = match existing {
        Some((id, handle)) => (CurrentSession { id, handle }, false),
        None => {
            let (id, handle) = state.sessions.create().await;
            (CurrentSession { id, handle }, true)
        }
    };

    current.handle.lock().await.touch();
    let id = current.id;
    request.extensions_mut().insert(current);

    let response = next.run(request).await;

    if is_new {
        let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax);
        (jar.add(cookie), response).into_response()
    } else {
        response
    }
}
