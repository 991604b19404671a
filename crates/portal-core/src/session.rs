// ── User session ──
//
// The access token pair lives in storage under `portal-login` so a
// session survives restarts. The session is the only writer of that key.
// Tokens are either both present or both absent.

use std::fmt;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use portal_api::{LoginClient, LoginData, UserLoader};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::CoreError;
use crate::storage::Storage;

/// Storage key holding the persisted token pair.
pub const LOGIN_KEY: &str = "portal-login";

/// The persisted form of [`AccessTokens`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLogin {
    user_token: String,
    auth_token: String,
    expiration_time: i64,
}

#[derive(Clone)]
pub struct AccessTokens {
    /// Identifies the volunteer in event payloads.
    pub user_token: String,
    /// Authorizes requests.
    pub auth_token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl AccessTokens {
    fn from_login(data: &LoginData) -> Option<Self> {
        Some(Self {
            user_token: data.user_token.clone(),
            auth_token: SecretString::from(data.auth_token.clone()),
            expires_at: DateTime::from_timestamp(data.expiration_time, 0)?,
        })
    }

    fn from_stored(stored: StoredLogin) -> Option<Self> {
        Some(Self {
            expires_at: DateTime::from_timestamp(stored.expiration_time, 0)?,
            user_token: stored.user_token,
            auth_token: SecretString::from(stored.auth_token),
        })
    }

    fn to_stored(&self) -> StoredLogin {
        StoredLogin {
            user_token: self.user_token.clone(),
            auth_token: self.auth_token.expose_secret().to_owned(),
            expiration_time: self.expires_at.timestamp(),
        }
    }
}

impl fmt::Debug for AccessTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokens")
            .field("user_token", &self.user_token)
            .field("auth_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Default)]
struct SessionState {
    tokens: Option<AccessTokens>,
    abilities: Vec<String>,
}

/// The signed-in (or anonymous) volunteer.
pub struct User {
    storage: Arc<dyn Storage>,
    clock: Arc<Clock>,
    login: LoginClient,
    loader: UserLoader,
    state: RwLock<SessionState>,
}

impl User {
    /// Restore a persisted session. Expired or unreadable blobs are removed.
    pub fn new(
        storage: Arc<dyn Storage>,
        clock: Arc<Clock>,
        login: LoginClient,
        loader: UserLoader,
    ) -> Self {
        let tokens = restore(storage.as_ref(), &clock);
        Self {
            storage,
            clock,
            login,
            loader,
            state: RwLock::new(SessionState {
                tokens,
                abilities: Vec::new(),
            }),
        }
    }

    pub fn is_identified(&self) -> bool {
        self.read(|s| s.tokens.is_some())
    }

    /// Exchange credentials for a session and persist it.
    pub async fn login(&self, email: &str, access_code: &SecretString) -> Result<(), CoreError> {
        let data = self.login.login(email, access_code).await?;
        self.apply(&data)?;
        info!(abilities = data.abilities.len(), "signed in");
        Ok(())
    }

    /// Re-validate persisted tokens with the server.
    ///
    /// A rejection signs the user out. Any other failure keeps the tokens so
    /// a flaky connection does not cost the volunteer their session. Returns
    /// whether the user is identified afterwards.
    pub async fn initialize(&self) -> bool {
        let Ok(auth_token) = self.auth_token() else {
            return false;
        };

        match self
            .loader
            .fetch(&[("authToken", auth_token.expose_secret())])
            .await
        {
            Ok(data) => {
                if let Err(e) = self.apply(&data) {
                    warn!(error = %e, "cannot persist refreshed session");
                }
            }
            Err(e) if e.is_user_error() => {
                info!("stored session was rejected, signing out");
                if let Err(e) = self.logout() {
                    warn!(error = %e, "cannot clear stored session");
                }
            }
            Err(e) => debug!(
                transient = e.is_transient(),
                "session check failed, keeping stored tokens"
            ),
        }
        self.is_identified()
    }

    /// Forget the session, in memory and in storage.
    pub fn logout(&self) -> Result<(), CoreError> {
        *self.state.write().expect("session lock poisoned") = SessionState::default();
        self.storage.remove(LOGIN_KEY)
    }

    pub fn auth_token(&self) -> Result<SecretString, CoreError> {
        self.with_tokens(|t| t.auth_token.clone())
    }

    pub fn user_token(&self) -> Result<String, CoreError> {
        self.with_tokens(|t| t.user_token.clone())
    }

    pub fn expires_at(&self) -> Result<DateTime<Utc>, CoreError> {
        self.with_tokens(|t| t.expires_at)
    }

    /// Abilities granted by the last login or session check.
    pub fn abilities(&self) -> Vec<String> {
        self.read(|s| s.abilities.clone())
    }

    pub fn can(&self, ability: &str) -> bool {
        self.read(|s| s.abilities.iter().any(|a| a == ability))
    }

    fn apply(&self, data: &LoginData) -> Result<(), CoreError> {
        let tokens = AccessTokens::from_login(data).ok_or_else(|| CoreError::InvalidResponse {
            message: format!("expiration time {} is out of range", data.expiration_time),
        })?;
        if tokens.expires_at <= self.clock.now() {
            return Err(CoreError::InvalidResponse {
                message: "server issued an already expired session".into(),
            });
        }

        let blob = serde_json::to_string(&tokens.to_stored()).map_err(|e| CoreError::Storage {
            message: e.to_string(),
        })?;
        self.storage.set(LOGIN_KEY, &blob)?;

        let mut state = self.state.write().expect("session lock poisoned");
        state.tokens = Some(tokens);
        state.abilities.clone_from(&data.abilities);
        Ok(())
    }

    fn with_tokens<R>(&self, f: impl FnOnce(&AccessTokens) -> R) -> Result<R, CoreError> {
        self.read(|s| s.tokens.as_ref().map(f))
            .ok_or(CoreError::NotIdentified)
    }

    fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.state.read().expect("session lock poisoned"))
    }
}

fn restore(storage: &dyn Storage, clock: &Clock) -> Option<AccessTokens> {
    let raw = storage.get(LOGIN_KEY)?;

    let tokens = serde_json::from_str::<StoredLogin>(&raw)
        .ok()
        .and_then(AccessTokens::from_stored);
    let Some(tokens) = tokens else {
        warn!("discarding unreadable stored session");
        clear(storage);
        return None;
    };

    if tokens.expires_at <= clock.now() {
        debug!(expired_at = %tokens.expires_at, "stored session has expired");
        clear(storage);
        return None;
    }

    debug!(expires_at = %tokens.expires_at, "stored session restored");
    Some(tokens)
}

fn clear(storage: &dyn Storage) {
    if let Err(e) = storage.remove(LOGIN_KEY) {
        warn!(error = %e, "cannot clear stored session");
    }
}
