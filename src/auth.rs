//! Login, session restore and logout.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::error::{ApiError, AuthError};
use crate::session::{Session, SessionStore, check_token};

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Checks done before any network traffic.
pub fn validate_credentials(username: &str, password: &str) -> Result<(), AuthError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AuthError::UsernameTooShort);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort);
    }
    Ok(())
}

/// Health check, then `POST /auth/login`. Touches no local state.
pub async fn authenticate(api: &ApiClient, username: &str, password: &str) -> Result<Session, AuthError> {
    validate_credentials(username, password)?;

    if let Err(err) = api.health().await {
        warn!(%err, "health check failed before login");
        return Err(AuthError::Unreachable);
    }

    let response = match api.login(username.trim(), password).await {
        Ok(r) => r,
        Err(err) => {
            return Err(match err.status() {
                Some(401 | 403) => AuthError::InvalidCredentials,
                Some(404) => AuthError::ServiceNotFound,
                _ => AuthError::Api(err),
            });
        }
    };

    match (response.success, response.token, response.user) {
        (true, Some(token), Some(user)) if !token.is_empty() => Ok(Session {
            auth_token: token,
            current_user: user,
        }),
        (_, _, _) => Err(AuthError::Rejected(
            response
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Login failed".to_string()),
        )),
    }
}

/// Owns the session store and keeps the client's bearer token in sync with it.
#[derive(Clone, Debug)]
pub struct AuthService {
    api: ApiClient,
    store: SessionStore,
}

impl AuthService {
    pub fn new(api: ApiClient, store: SessionStore) -> Self {
        Self { api, store }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Authenticate and persist the session. On failure nothing is stored.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let session = authenticate(&self.api, username, password).await?;
        self.establish(&session)?;
        info!(username = %session.current_user.username, "logged in");
        Ok(session)
    }

    /// Persist `session` and start sending its token.
    pub fn establish(&self, session: &Session) -> Result<(), AuthError> {
        self.store
            .save(session)
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        self.api.set_token(Some(session.auth_token.clone()));
        Ok(())
    }

    /// The persisted session if its token is well formed and not expired;
    /// otherwise the stored session is cleared.
    pub fn restore(&self, now: DateTime<Utc>) -> Option<Session> {
        let session = self.store.load()?;
        match check_token(&session.auth_token, now) {
            Ok(()) => {
                self.api.set_token(Some(session.auth_token.clone()));
                info!(username = %session.current_user.username, "session restored");
                Some(session)
            }
            Err(problem) => {
                info!(?problem, "discarding stored session");
                self.forget();
                None
            }
        }
    }

    pub fn logout(&self) {
        self.forget();
        info!("logged out");
    }

    /// Drop the token in memory and on disk. Called on logout and whenever
    /// the backend answers 401.
    pub fn forget(&self) {
        self.api.set_token(None);
        if let Err(err) = self.store.clear() {
            warn!(%err, "could not remove session file");
        }
    }

    /// React to an API failure; returns true when the session was dropped.
    pub fn handle_api_error(&self, err: &ApiError) -> bool {
        if err.is_unauthorized() {
            warn!("backend rejected the session token");
            self.forget();
            true
        } else {
            false
        }
    }
}
