//! # Session Store
//!
//! Holds the bearer token and the signed-in user, persists them to a small
//! JSON file, and announces sign-in/sign-out on a `watch` channel.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Session Lifecycle                               │
//! │                                                                         │
//! │   login ok ──► sign_in(token, user) ──► SignedIn(user) ──► file saved  │
//! │                                                                         │
//! │   logout confirmed ─┐                                                  │
//! │   token expired ────┼──► force_logout(reason) ──► SignedOut{reason}    │
//! │   HTTP 401 ─────────┘                             file removed         │
//! │                                                                         │
//! │   Everything else only reads: token(), user(), is_valid()              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The token is opaque apart from its `exp` claim, which is read without
//! verifying the signature. The backend is the one that verifies.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use pharmadesk_core::UserProfile;

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Types
// =============================================================================

/// What is written to the session file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

impl Session {
    /// Reads the `exp` claim of the token.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        token_expiry(&self.token)
    }

    /// A token with no readable `exp` claim is treated as expired.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp > now)
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    UserRequested,
    Expired,
    /// The backend answered 401.
    Unauthorized,
}

/// Published on every sign-in and sign-out.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    SignedIn(UserProfile),
    /// `reason` is `None` when the process started without a session.
    SignedOut { reason: Option<SignOutReason> },
}

impl AuthState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, AuthState::SignedIn(_))
    }
}

#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    exp: i64,
}

fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;

    let data = decode::<ExpiryClaim>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    Utc.timestamp_opt(data.claims.exp, 0).single()
}

// =============================================================================
// Session Store
// =============================================================================

/// Shared, persisted session.
///
/// ## Thread Safety
/// The session sits behind a `std::sync::RwLock`; every method is a short
/// critical section and none of them await.
#[derive(Debug)]
pub struct SessionStore {
    current: RwLock<Option<Session>>,
    path: Option<PathBuf>,
    events: watch::Sender<AuthState>,
}

impl SessionStore {
    /// An empty, memory-only store.
    pub fn in_memory() -> Self {
        Self::with_session(None, None)
    }

    fn with_session(session: Option<Session>, path: Option<PathBuf>) -> Self {
        let state = match &session {
            Some(s) => AuthState::SignedIn(s.user.clone()),
            None => AuthState::SignedOut { reason: None },
        };
        let (events, _) = watch::channel(state);
        SessionStore {
            current: RwLock::new(session),
            path,
            events,
        }
    }

    /// Opens the store backed by `path`, restoring a saved session.
    ///
    /// A corrupt session file is discarded rather than failing startup.
    pub fn open(path: Option<PathBuf>) -> ClientResult<Self> {
        let Some(path) = path else {
            return Ok(Self::in_memory());
        };

        let session = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Session>(&contents) {
                Ok(session) => {
                    info!(user = %session.user.full_name, "Restored saved session");
                    Some(session)
                }
                Err(e) => {
                    warn!(?path, error = %e, "Discarding unreadable session file");
                    remove_file(&path)?;
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(?path, "No saved session");
                None
            }
            Err(e) => return Err(ClientError::SessionStorage(e.to_string())),
        };

        Ok(Self::with_session(session, Some(path)))
    }

    /// Stores a fresh session and announces it.
    pub fn sign_in(&self, token: String, user: UserProfile) -> ClientResult<()> {
        let session = Session { token, user };

        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ClientError::SessionStorage(e.to_string()))?;
            }
            let contents = serde_json::to_string_pretty(&session)?;
            std::fs::write(path, contents)
                .map_err(|e| ClientError::SessionStorage(e.to_string()))?;
        }

        info!(user = %session.user.full_name, role = %session.user.role, "Signed in");
        let user = session.user.clone();
        *self.write() = Some(session);
        self.events.send_replace(AuthState::SignedIn(user));
        Ok(())
    }

    /// Drops the session, deletes the file and announces `SignedOut`.
    ///
    /// ## Returns
    /// `true` if a session was actually cleared. Calling this while signed
    /// out does nothing and publishes nothing.
    pub fn force_logout(&self, reason: SignOutReason) -> bool {
        let cleared = self.write().take();
        if cleared.is_none() {
            return false;
        }

        if let Some(path) = &self.path {
            if let Err(e) = remove_file(path) {
                warn!(?path, error = %e, "Failed to remove session file");
            }
        }

        info!(?reason, "Signed out");
        self.events
            .send_replace(AuthState::SignedOut { reason: Some(reason) });
        true
    }

    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.token.clone())
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read().as_ref().map(|s| s.user.clone())
    }

    pub fn session(&self) -> Option<Session> {
        self.read().clone()
    }

    /// Token present and not past its `exp` claim.
    pub fn is_valid(&self) -> bool {
        self.read()
            .as_ref()
            .is_some_and(|s| s.is_valid_at(Utc::now()))
    }

    /// Observes sign-in/sign-out; the current state is visible immediately.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.events.subscribe()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Session>> {
        self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn remove_file(path: &Path) -> ClientResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ClientError::SessionStorage(e.to_string())),
    }
}

// =============================================================================
// Test Helpers
// =============================================================================
