//! Session store.
//!
//! Owns the current auth session, persists it to `<base>/session.json` with
//! restricted permissions (0600), and broadcasts transitions to subscribers.
//! Tokens are never logged or displayed.
//!
//! ## Events
//!
//! ```text
//! sign_in / sign_up(auto-confirm)  -> SignedIn(session)
//! refresh (manual or background)   -> TokenRefreshed(session)
//! refresh token rejected (4xx)     -> SignedOut
//! sign_out                         -> SignedOut
//! ```
//!
//! `restore_session()` does not emit; callers use its return value.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::backend::{BackendClient, SignUpOutcome, is_rejection};

/// Refresh this many seconds before the access token expires.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Auto-refresh recheck interval while signed out.
const IDLE_RECHECK: Duration = Duration::from_secs(30);

/// Lower bound between refresh attempts (after a failed refresh).
const MIN_REFRESH_DELAY: Duration = Duration::from_secs(10);

/// Capacity of the event channel. Slow subscribers skip missed events.
const EVENT_CAPACITY: usize = 16;

/// Authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Authenticated session handle.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry of the access token, seconds since epoch.
    pub expires_at: i64,
    pub user: User,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Returns true if the access token expires within `margin_secs` of `now`.
    pub fn expires_within(&self, now: i64, margin_secs: i64) -> bool {
        now + margin_secs >= self.expires_at
    }

    /// Explicit identity for repository calls.
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user.id.clone(),
            access_token: self.access_token.clone(),
        }
    }

    /// Display label for the signed-in user.
    pub fn label(&self) -> &str {
        self.user.email.as_deref().unwrap_or(&self.user.id)
    }
}

/// Identity carried by every repository call.
///
/// Sourced once from a `Session`; never re-derived ad hoc.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub access_token: String,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// Session transition reported to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

impl SessionEvent {
    /// Session carried by the event (`None` for sign-out).
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionEvent::SignedIn(s) | SessionEvent::TokenRefreshed(s) => Some(s),
            SessionEvent::SignedOut => None,
        }
    }
}

/// Listener registration. Dropping it unsubscribes.
#[derive(Debug)]
pub struct SessionSubscription {
    rx: broadcast::Receiver<SessionEvent>,
}

impl SessionSubscription {
    /// Waits for the next event. Returns `None` once the store is gone.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "session subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(_) => return None,
            }
        }
    }

    /// Removes the listener.
    pub fn unsubscribe(self) {
        drop(self.rx);
    }
}

/// Owns the current session and its persistence.
#[derive(Debug)]
pub struct SessionStore {
    client: BackendClient,
    /// Persistence file; `None` keeps the session in memory only.
    path: Option<PathBuf>,
    current: RwLock<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// Creates a store persisting to `path` (or memory only when `None`).
    pub fn new(client: BackendClient, path: Option<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client,
            path,
            current: RwLock::new(None),
            events,
        }
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    /// Current session, if signed in.
    pub fn current(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Identity of the current session, if signed in.
    pub fn identity(&self) -> Option<Identity> {
        self.current().map(|s| s.identity())
    }

    /// Registers a listener for session transitions.
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            rx: self.events.subscribe(),
        }
    }

    #[cfg(test)]
    fn listener_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Recovers a persisted session at startup.
    ///
    /// Refreshes the token when it is expired or about to expire. Never fails:
    /// errors are logged and yield `None`. A file that can never yield a
    /// session (unreadable, or its refresh token rejected) is removed; one
    /// that failed only on the network is kept for the next attempt.
    pub async fn restore_session(&self) -> Option<Session> {
        let stored = match self.load_persisted() {
            Ok(Some(session)) => session,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!("Failed to read stored session: {err:#}");
                self.discard_persisted();
                return None;
            }
        };

        let session = if stored.expires_within(now_secs(), REFRESH_MARGIN_SECS) {
            match self.client.refresh_session(&stored.refresh_token).await {
                Ok(fresh) => {
                    if let Err(err) = self.persist(Some(&fresh)) {
                        tracing::warn!("Failed to persist refreshed session: {err:#}");
                    }
                    fresh
                }
                Err(err) => {
                    tracing::warn!(user_id = %stored.user.id, "Failed to refresh stored session: {err:#}");
                    if is_rejection(&err) {
                        self.discard_persisted();
                    }
                    return None;
                }
            }
        } else {
            stored
        };

        tracing::info!(user_id = %session.user.id, "restored session");
        self.set_current(Some(session.clone()));
        Some(session)
    }

    /// Signs in with email and password.
    ///
    /// On success the `SignedIn` event is the source of truth for state.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        let session = self.client.sign_in_with_password(email, password).await?;
        tracing::info!(user_id = %session.user.id, "signed in");
        self.establish(session);
        Ok(())
    }

    /// Creates an account. Establishes a session only when one is issued.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let outcome = self.client.sign_up(email, password).await?;
        match &outcome {
            SignUpOutcome::SignedIn(session) => {
                tracing::info!(user_id = %session.user.id, "signed up");
                self.establish(session.clone());
            }
            SignUpOutcome::ConfirmationRequired { .. } => {
                tracing::info!("signed up, confirmation required");
            }
        }
        Ok(outcome)
    }

    /// Terminates the session.
    ///
    /// On failure the prior session is kept. Without a session this only
    /// clears local state.
    pub async fn sign_out(&self) -> Result<()> {
        if let Some(session) = self.current() {
            self.client.sign_out(&session.access_token).await?;
            tracing::info!(user_id = %session.user.id, "signed out");
        }
        self.clear();
        Ok(())
    }

    /// Refreshes the current session's access token.
    ///
    /// When the backend rejects the refresh token (revoked, or the user was
    /// removed) the session is invalid for good: it is cleared and
    /// `SignedOut` is emitted. Network and server errors keep it.
    pub async fn refresh(&self) -> Result<Session> {
        let current = self.current().context("Not signed in")?;
        let fresh = match self.client.refresh_session(&current.refresh_token).await {
            Ok(fresh) => fresh,
            Err(err) => {
                let unchanged = self
                    .current()
                    .is_some_and(|s| s.refresh_token == current.refresh_token);
                if unchanged && is_rejection(&err) {
                    tracing::warn!(user_id = %current.user.id, "Refresh token rejected, signing out");
                    self.clear();
                }
                return Err(err);
            }
        };

        // A sign-out (or different sign-in) while refreshing wins.
        let still_current = self
            .current()
            .is_some_and(|s| s.user.id == current.user.id);
        if !still_current {
            anyhow::bail!("Session changed during refresh");
        }

        self.set_current(Some(fresh.clone()));
        self.persist(Some(&fresh))?;
        tracing::debug!(user_id = %fresh.user.id, "refreshed session");
        let _ = self.events.send(SessionEvent::TokenRefreshed(fresh.clone()));
        Ok(fresh)
    }

    /// Spawns a background task refreshing the token shortly before expiry.
    ///
    /// Runs until `cancel` fires.
    pub fn spawn_auto_refresh(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let wait = store
                    .current()
                    .map_or(IDLE_RECHECK, |s| refresh_delay(&s, now_secs()));
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(wait) => {}
                }

                let due = store
                    .current()
                    .is_some_and(|s| s.expires_within(now_secs(), REFRESH_MARGIN_SECS));
                if due && let Err(err) = store.refresh().await {
                    tracing::warn!("Background session refresh failed: {err:#}");
                }
            }
        })
    }

    fn establish(&self, session: Session) {
        if let Err(err) = self.persist(Some(&session)) {
            tracing::warn!("Failed to persist session: {err:#}");
        }
        self.set_current(Some(session.clone()));
        let _ = self.events.send(SessionEvent::SignedIn(session));
    }

    /// Drops the session locally and notifies listeners.
    fn clear(&self) {
        self.set_current(None);
        self.discard_persisted();
        let _ = self.events.send(SessionEvent::SignedOut);
    }

    fn discard_persisted(&self) {
        if let Err(err) = self.persist(None) {
            tracing::warn!("Failed to remove stored session: {err:#}");
        }
    }

    fn set_current(&self, session: Option<Session>) {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = session;
    }

    fn load_persisted(&self) -> Result<Option<Session>> {
        match &self.path {
            Some(path) => load_session_file(path),
            None => Ok(None),
        }
    }

    fn persist(&self, session: Option<&Session>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        match session {
            Some(session) => save_session_file(path, session),
            None => {
                if path.exists() {
                    fs::remove_file(path)
                        .with_context(|| format!("Failed to remove {}", path.display()))?;
                }
                Ok(())
            }
        }
    }
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Time until the refresh is due, never below `MIN_REFRESH_DELAY`.
fn refresh_delay(session: &Session, now: i64) -> Duration {
    let secs = session.expires_at - REFRESH_MARGIN_SECS - now;
    u64::try_from(secs)
        .map(Duration::from_secs)
        .unwrap_or(MIN_REFRESH_DELAY)
        .max(MIN_REFRESH_DELAY)
}

/// Loads a session file. Returns `None` if the file doesn't exist.
pub fn load_session_file(path: &Path) -> Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read session from {}", path.display()))?;
    let session = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse session from {}", path.display()))?;
    Ok(Some(session))
}

/// Saves a session file with restricted permissions (0600).
pub fn save_session_file(path: &Path, session: &Session) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let contents = serde_json::to_string_pretty(session).context("Failed to serialize session")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .with_context(|| format!("Failed to open {} for writing", path.display()))?;
        file.write_all(contents.as_bytes())
            .with_context(|| format!("Failed to write to {}", path.display()))?;
    }

    #[cfg(not(unix))]
    {
        fs::write(path, contents)
            .with_context(|| format!("Failed to write to {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;
    use url::Url;

    use super::*;

    fn session(user: &str, expires_at: i64) -> Session {
        Session {
            access_token: format!("at-{user}"),
            refresh_token: format!("rt-{user}"),
            expires_at,
            user: User {
                id: user.to_string(),
                email: Some(format!("{user}@x.com")),
            },
        }
    }

    fn offline_store(path: Option<PathBuf>) -> SessionStore {
        // Port 9 (discard): nothing answers, so any request fails to connect.
        let client =
            BackendClient::with_url(Url::parse("http://127.0.0.1:9").unwrap(), "anon").unwrap();
        SessionStore::new(client, path)
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let s = session("u-1", 0);
        let debug = format!("{s:?} {:?}", s.identity());
        assert!(!debug.contains("at-u-1"));
        assert!(!debug.contains("rt-u-1"));
        assert!(debug.contains("u-1"));
    }

    #[test]
    fn expiry_margin() {
        let s = session("u", 1_000);
        assert!(!s.expires_within(900, 60));
        assert!(s.expires_within(940, 60));
        assert!(s.expires_within(2_000, 0));
    }

    #[test]
    fn refresh_delay_has_floor() {
        assert_eq!(refresh_delay(&session("u", 1_000), 0), Duration::from_secs(940));
        assert_eq!(refresh_delay(&session("u", 10), 100), MIN_REFRESH_DELAY);
    }

    #[test]
    fn session_file_roundtrip_and_permissions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let s = session("u-1", 123);

        save_session_file(&path, &s).unwrap();
        assert_eq!(load_session_file(&path).unwrap(), Some(s));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[tokio::test]
    async fn restore_without_file_is_none() {
        let dir = tempdir().unwrap();
        let store = offline_store(Some(dir.path().join("session.json")));
        assert!(store.restore_session().await.is_none());
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn restore_swallows_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();
        let store = offline_store(Some(path.clone()));
        assert!(store.restore_session().await.is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn unreachable_backend_keeps_stored_session() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        save_session_file(&path, &session("u-1", 0)).unwrap();

        // Nothing listens on the discard port, so the refresh fails to connect.
        let store = offline_store(Some(path.clone()));
        assert!(store.restore_session().await.is_none());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn restore_valid_session_skips_network() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let s = session("u-1", now_secs() + 3_600);
        save_session_file(&path, &s).unwrap();

        let store = offline_store(Some(path));
        assert_eq!(store.restore_session().await, Some(s.clone()));
        assert_eq!(store.identity().map(|i| i.user_id), Some("u-1".to_string()));
    }

    #[tokio::test]
    async fn sign_out_without_session_clears_and_notifies() {
        let store = offline_store(None);
        let mut sub = store.subscribe();
        store.sign_out().await.unwrap();
        assert_eq!(sub.try_recv(), Some(SessionEvent::SignedOut));
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let store = offline_store(None);
        let first = store.subscribe();
        let second = store.subscribe();
        assert_eq!(store.listener_count(), 2);
        drop(first);
        second.unsubscribe();
        assert_eq!(store.listener_count(), 0);
    }

    #[tokio::test]
    async fn refresh_without_session_fails() {
        let store = offline_store(None);
        let err = store.refresh().await.unwrap_err();
        assert!(err.to_string().contains("Not signed in"));
    }

    #[tokio::test]
    async fn auto_refresh_stops_on_cancel() {
        let store = Arc::new(offline_store(None));
        let cancel = CancellationToken::new();
        let handle = store.spawn_auto_refresh(cancel.clone());
        cancel.cancel();
        handle.await.unwrap();
    }
}
