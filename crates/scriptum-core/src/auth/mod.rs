//! Session model, auth context, and the client for the `/auth` endpoints.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::remote::{normalize_base_url, parse_api_error, REQUEST_TIMEOUT};

/// Name length bounds for registration.
pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
/// Password length bounds for registration.
pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 100;

/// The authenticated identity as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// An active session: the bearer token plus the identity it belongs to.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: AuthUser,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub new_user: bool,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .field("email_verified", &self.email_verified)
            .field("new_user", &self.new_user)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Auth API error: {0}")]
    Api(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Session storage error: {0}")]
    Persistence(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Durable storage for the serialized session (OS keyring in the CLI,
/// in-memory in tests).
pub trait SessionPersistence: Send + Sync {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

/// Session persistence that does not outlive the process.
#[derive(Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<AuthSession>>,
}

impl SessionPersistence for MemorySessionStore {
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        Ok(self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        *self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear_session(&self) -> AuthResult<()> {
        *self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

type DeauthHook = Arc<dyn Fn() + Send + Sync>;

/// The explicit session context shared by every client of the remote
/// service.
///
/// Constructed once at startup and torn down with [`AuthContext::clear`] on
/// sign-out. Handles are cheap clones of shared state. A hook registered
/// with [`AuthContext::on_deauth`] is invoked whenever the remote service
/// rejects the credentials, so the embedding application can route the user
/// back to sign-in.
#[derive(Clone)]
pub struct AuthContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    session: RwLock<Option<AuthSession>>,
    persistence: Box<dyn SessionPersistence>,
    on_deauth: RwLock<Option<DeauthHook>>,
}

impl AuthContext {
    /// Create a context with no active session.
    pub fn new(persistence: impl SessionPersistence + 'static) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                session: RwLock::new(None),
                persistence: Box::new(persistence),
                on_deauth: RwLock::new(None),
            }),
        }
    }

    /// Create a context and load any persisted session into it.
    pub fn restore(persistence: impl SessionPersistence + 'static) -> AuthResult<Self> {
        let context = Self::new(persistence);
        let stored = context.inner.persistence.load_session()?;
        *context.write_session() = stored;
        Ok(context)
    }

    /// Register the hook fired when credentials are rejected remotely.
    pub fn on_deauth(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self
            .inner
            .on_deauth
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(hook));
    }

    #[must_use]
    pub fn session(&self) -> Option<AuthSession> {
        self.read_session().clone()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        self.read_session()
            .as_ref()
            .map(|session| session.user.id.clone())
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.read_session()
            .as_ref()
            .map(|session| session.token.clone())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read_session().is_some()
    }

    /// Persist a freshly issued session and make it current.
    pub fn store_session(&self, session: AuthSession) -> AuthResult<()> {
        self.inner.persistence.save_session(&session)?;
        *self.write_session() = Some(session);
        Ok(())
    }

    /// Tear the session down: forget it in memory and in persistence.
    pub fn clear(&self) -> AuthResult<()> {
        self.inner.persistence.clear_session()?;
        *self.write_session() = None;
        Ok(())
    }

    /// The global 401 side effect: drop the stored credentials and notify
    /// the registered hook. Persistence failures are logged, not raised,
    /// because this runs while an error is already propagating.
    pub fn handle_unauthorized(&self) {
        tracing::warn!("Credentials rejected by the remote service; clearing stored session");
        if let Err(error) = self.inner.persistence.clear_session() {
            tracing::warn!("Failed to clear persisted session: {error}");
        }
        *self.write_session() = None;

        let hook = self
            .inner
            .on_deauth
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    fn read_session(&self) -> std::sync::RwLockReadGuard<'_, Option<AuthSession>> {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_session(&self) -> std::sync::RwLockWriteGuard<'_, Option<AuthSession>> {
        self.inner
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registration payload for new accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub avatar_url: Option<String>,
}

/// Client for the `/auth` endpoints of the remote service. Persists issued
/// sessions through the shared [`AuthContext`].
#[derive(Clone)]
pub struct AuthClient {
    base_url: String,
    client: Client,
    context: AuthContext,
}

impl AuthClient {
    pub fn new(base_url: impl AsRef<str>, context: AuthContext) -> AuthResult<Self> {
        let base_url = normalize_base_url(base_url.as_ref())
            .map_err(|_| AuthError::InvalidConfiguration("API URL must include http:// or https://"))?;
        Ok(Self {
            base_url,
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            context,
        })
    }

    /// Sign in with an existing account and make the session current.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        validate_sign_in(email, password)?;

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        let request = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .json(&payload);

        let session = self.send_session_request(request).await?;
        self.context.store_session(session.clone())?;
        tracing::info!(user = %session.user.id, "Signed in");
        Ok(session)
    }

    /// Create an account; the backend signs the new user straight in.
    pub async fn register(&self, registration: &Registration) -> AuthResult<AuthSession> {
        validate_registration(registration)?;

        let payload = serde_json::json!({
            "name": registration.name.trim(),
            "email": registration.email.trim(),
            "password": registration.password,
            "avatarUrl": registration.avatar_url,
        });
        let request = self
            .client
            .post(format!("{}/auth/register", self.base_url))
            .json(&payload);

        let session = self.send_session_request(request).await?;
        self.context.store_session(session.clone())?;
        tracing::info!(user = %session.user.id, "Registered new account");
        Ok(session)
    }

    /// Sign out is client-side only: the backend keeps no session state.
    pub fn sign_out(&self) -> AuthResult<()> {
        self.context.clear()?;
        tracing::info!("Signed out");
        Ok(())
    }

    /// Confirm an email address with the token from the verification mail.
    pub async fn verify_email(&self, token: &str) -> AuthResult<String> {
        if token.trim().is_empty() {
            return Err(AuthError::InvalidInput(
                "verification token must not be empty".into(),
            ));
        }
        let request = self
            .client
            .get(format!("{}/auth/verify-email", self.base_url))
            .query(&[("token", token)]);
        self.send_text_request(request).await
    }

    /// Ask the backend to send a fresh verification mail.
    pub async fn resend_verification(&self, user_id: &str) -> AuthResult<String> {
        let request = self
            .client
            .post(format!("{}/auth/resend-verification", self.base_url))
            .query(&[("userId", user_id)]);
        self.send_text_request(request).await
    }

    /// Reachability probe; returns the backend's health string.
    pub async fn health(&self) -> AuthResult<String> {
        let request = self.client.get(format!("{}/auth/health", self.base_url));
        self.send_text_request(request).await
    }

    async fn send_session_request(
        &self,
        request: reqwest::RequestBuilder,
    ) -> AuthResult<AuthSession> {
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }
        response.json::<AuthResponseBody>().await?.into_session()
    }

    async fn send_text_request(&self, request: reqwest::RequestBuilder) -> AuthResult<String> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }
        Ok(body.trim().to_string())
    }
}

/// Reject obviously unusable sign-in input before any request is sent.
pub fn validate_sign_in(email: &str, password: &str) -> AuthResult<()> {
    if email.trim().is_empty() {
        return Err(AuthError::InvalidInput("email is required".into()));
    }
    if password.is_empty() {
        return Err(AuthError::InvalidInput("password is required".into()));
    }
    Ok(())
}

/// Enforce the registration input bounds before any request is sent.
pub fn validate_registration(registration: &Registration) -> AuthResult<()> {
    let name_chars = registration.name.trim().chars().count();
    if name_chars < NAME_MIN_CHARS || name_chars > NAME_MAX_CHARS {
        return Err(AuthError::InvalidInput(format!(
            "name must be {NAME_MIN_CHARS}-{NAME_MAX_CHARS} characters"
        )));
    }
    if !looks_like_email(registration.email.trim()) {
        return Err(AuthError::InvalidInput(
            "email address is not valid".into(),
        ));
    }
    let password_chars = registration.password.chars().count();
    if password_chars < PASSWORD_MIN_CHARS || password_chars > PASSWORD_MAX_CHARS {
        return Err(AuthError::InvalidInput(format!(
            "password must be {PASSWORD_MIN_CHARS}-{PASSWORD_MAX_CHARS} characters"
        )));
    }
    let has_letter = registration.password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = registration.password.chars().any(|c| c.is_ascii_digit());
    if !(has_letter && has_digit) {
        return Err(AuthError::InvalidInput(
            "password must contain at least one letter and one digit".into(),
        ));
    }
    Ok(())
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponseBody {
    user_id: String,
    name: String,
    email: String,
    token: String,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    new_user: bool,
}

impl AuthResponseBody {
    fn into_session(self) -> AuthResult<AuthSession> {
        if self.token.trim().is_empty() {
            return Err(AuthError::Api(
                "Auth response did not include a token".to_string(),
            ));
        }
        Ok(AuthSession {
            token: self.token,
            user: AuthUser {
                id: self.user_id,
                name: self.name,
                email: self.email,
            },
            email_verified: self.email_verified,
            new_user: self.new_user,
        })
    }
}
