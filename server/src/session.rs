//! Per-browser sessions and one-shot flash messages.
//!
//! # Design
//! A session is found through the `todo_session` cookie, which carries a
//! random UUID. `session_layer` resolves (or creates) the session before the
//! handler runs and stores it in the request extensions. After the handler,
//! any [`Flash`] the response carries is moved into the session so that the
//! next rendered view shows it exactly once.
//!
//! # Lifetime
//! A visitor without a known cookie gets a fresh, unregistered session. It is
//! only kept, and only then handed out as a cookie, once it holds something
//! worth remembering: a pending flash or a list. Kept sessions expire after
//! an idle timeout; expired ones are swept whenever a new session is kept.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponseParts, Response, ResponseParts};
use serde::{Deserialize, Serialize};
use todo_core::SessionStore;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "todo_session";

/// How long an untouched session survives by default.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

// ---------------------------------------------------------------------------
// Flash
// ---------------------------------------------------------------------------

/// Status messages shown on the next rendered view, then discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
}

impl Flash {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            success: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            error: None,
            success: Some(message.into()),
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.error.is_none() && self.success.is_none()
    }

    /// Later messages replace earlier ones of the same kind.
    fn merge(&mut self, newer: Flash) {
        if newer.error.is_some() {
            self.error = newer.error;
        }
        if newer.success.is_some() {
            self.success = newer.success;
        }
    }
}

/// Attaching a `Flash` to a response hands it to `session_layer`.
impl IntoResponseParts for Flash {
    type Error = Infallible;

    fn into_response_parts(self, mut parts: ResponseParts) -> Result<ResponseParts, Self::Error> {
        parts.extensions_mut().insert(self);
        Ok(parts)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SessionData {
    store: SessionStore,
    flash: Mutex<Flash>,
}

/// Cheap handle to one browser session.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    data: Arc<SessionData>,
}

impl Session {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            data: Arc::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The lists owned by this session, used in `session` storage mode.
    pub fn store(&self) -> &SessionStore {
        &self.data.store
    }

    /// Remove and return the pending flash messages.
    pub async fn take_flash(&self) -> Flash {
        std::mem::take(&mut *self.data.flash.lock().await)
    }

    pub async fn push_flash(&self, flash: Flash) {
        self.data.flash.lock().await.merge(flash);
    }

    /// `true` when forgetting the session would lose a flash or a list.
    pub async fn has_state(&self) -> bool {
        !self.data.flash.lock().await.is_empty() || !self.data.store.is_empty().await
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Session>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Session not found. Ensure session_layer is applied.",
        ))
    }
}

// ---------------------------------------------------------------------------
// SessionRegistry
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct SessionEntry {
    session: Session,
    last_seen: Instant,
}

impl SessionEntry {
    fn is_expired(&self, idle_timeout: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.last_seen) >= idle_timeout
    }
}

#[derive(Debug, Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    idle_timeout: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Look up the live session for `id`, refreshing its idle clock. Unknown
    /// or expired ids get a fresh session that is not registered until
    /// [`SessionRegistry::keep`] is called. The flag is `true` for a fresh one.
    pub async fn resolve(&self, id: Option<Uuid>) -> (Session, bool) {
        if let Some(id) = id {
            let now = Instant::now();
            let mut sessions = self.sessions.write().await;
            match sessions.get_mut(&id) {
                Some(entry) if !entry.is_expired(self.idle_timeout, now) => {
                    entry.last_seen = now;
                    return (entry.session.clone(), false);
                }
                Some(_) => {
                    sessions.remove(&id);
                    tracing::debug!(session_id = %id, "session expired");
                }
                None => {}
            }
        }

        (Session::new(Uuid::new_v4()), true)
    }

    /// Register a fresh session, evicting every expired one first.
    pub async fn keep(&self, session: &Session) {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_expired(self.idle_timeout, now));
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, "expired sessions evicted");
        }

        sessions.insert(
            session.id,
            SessionEntry {
                session: session.clone(),
                last_seen: now,
            },
        );
        tracing::debug!(session_id = %session.id, "session created");
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Session id from the request's `Cookie` headers, if present and well formed.
pub fn session_cookie(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// Middleware that attaches a [`Session`] to every request.
pub async fn session_layer(
    State(registry): State<SessionRegistry>,
    mut request: Request,
    next: Next,
) -> Response {
    let (session, created) = registry.resolve(session_cookie(request.headers())).await;
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    if let Some(flash) = response.extensions_mut().remove::<Flash>() {
        if !flash.is_empty() {
            session.push_flash(flash).await;
        }
    }

    // A fresh session with nothing to remember is dropped without a cookie.
    if created && session.has_state().await {
        registry.keep(&session).await;

        let cookie = format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
            session.id()
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(error) => tracing::warn!(%error, "could not encode session cookie"),
        }
    }

    response
}
