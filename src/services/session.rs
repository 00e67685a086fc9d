use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::AuthSettings;
use crate::errors::ApiError;
use crate::models::auth::{Credential, RefreshTokenResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    Authenticated,
    Unauthenticated,
    Disposed,
}

/// Source of the bearer credential for the request gateway.
#[async_trait]
pub trait AuthSession: Send + Sync {
    async fn state(&self) -> SessionState;

    /// The credential currently held, without contacting the provider.
    async fn credential(&self) -> Result<Credential, ApiError>;

    /// Forces a new credential from the provider.
    async fn refresh(&self) -> Result<Credential, ApiError>;

    /// Drops the credential after an unrecoverable auth failure.
    async fn invalidate(&self);
}

/// Performs the hard navigation to an unauthenticated page.
pub trait Navigator: Send + Sync {
    fn redirect(&self, location: &str);
}

/// Navigator for hosts without a page: logs where the user would be sent.
#[derive(Debug, Default)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn redirect(&self, location: &str) {
        warn!("Session ended, redirecting to {}", location);
    }
}

/// A new ID token plus the refresh token that can mint the next one.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub credential: Credential,
    pub refresh_token: String,
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn exchange(&self, refresh_token: &str) -> Result<TokenGrant, ApiError>;
}

/// Secure-token endpoint exchange (`grant_type=refresh_token`).
pub struct SecureTokenProvider {
    client: Client,
    token_url: String,
    api_key: String,
}

impl SecureTokenProvider {
    pub fn new(client: Client, settings: &AuthSettings) -> Self {
        Self {
            client,
            token_url: settings.token_url.clone(),
            api_key: settings.api_key.clone(),
        }
    }
}

#[async_trait]
impl TokenProvider for SecureTokenProvider {
    async fn exchange(&self, refresh_token: &str) -> Result<TokenGrant, ApiError> {
        let response = self
            .client
            .post(&self.token_url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Secure token exchange rejected with status {}", status);
            return Err(match ApiError::from_status(status, &body) {
                // the provider answers 400 for revoked or expired refresh tokens
                ApiError::BadRequest(reason) => ApiError::AuthInvalid(reason),
                other => other,
            });
        }

        let body: RefreshTokenResponse = response.json().await?;
        Ok(TokenGrant {
            credential: Credential::from_id_token(&body.id_token)?,
            refresh_token: body.refresh_token,
        })
    }
}

struct SessionInner {
    state: SessionState,
    credential: Option<Credential>,
    refresh_token: Option<String>,
}

/// In-memory session: `Initializing -> Authenticated | Unauthenticated -> Disposed`.
pub struct TokenSession<P> {
    provider: P,
    inner: RwLock<SessionInner>,
}

impl<P: TokenProvider> TokenSession<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            inner: RwLock::new(SessionInner {
                state: SessionState::Initializing,
                credential: None,
                refresh_token: None,
            }),
        }
    }

    pub async fn establish(&self, grant: TokenGrant) -> Result<(), ApiError> {
        let mut inner = self.inner.write().await;
        if inner.state == SessionState::Disposed {
            return Err(ApiError::AuthInvalid("session disposed".to_string()));
        }
        info!("Session established for {}", grant.credential.subject);
        inner.state = SessionState::Authenticated;
        inner.credential = Some(grant.credential);
        inner.refresh_token = Some(grant.refresh_token);
        Ok(())
    }

    /// Finishes initialization with nobody signed in.
    pub async fn mark_unauthenticated(&self) {
        let mut inner = self.inner.write().await;
        if inner.state == SessionState::Initializing {
            inner.state = SessionState::Unauthenticated;
        }
    }

    pub async fn dispose(&self) {
        let mut inner = self.inner.write().await;
        inner.state = SessionState::Disposed;
        inner.credential = None;
        inner.refresh_token = None;
    }
}

#[async_trait]
impl<P: TokenProvider> AuthSession for TokenSession<P> {
    async fn state(&self) -> SessionState {
        self.inner.read().await.state
    }

    async fn credential(&self) -> Result<Credential, ApiError> {
        let inner = self.inner.read().await;
        match (&inner.state, &inner.credential) {
            (SessionState::Authenticated, Some(credential)) => Ok(credential.clone()),
            _ => Err(ApiError::AuthInvalid("User not authenticated".to_string())),
        }
    }

    async fn refresh(&self) -> Result<Credential, ApiError> {
        let refresh_token = {
            let inner = self.inner.read().await;
            match (&inner.state, &inner.refresh_token) {
                (SessionState::Authenticated, Some(token)) => token.clone(),
                _ => {
                    warn!("No current user found during token refresh");
                    return Err(ApiError::AuthInvalid("User not authenticated".to_string()));
                }
            }
        };

        let grant = self.provider.exchange(&refresh_token).await?;
        let credential = grant.credential.clone();

        let mut inner = self.inner.write().await;
        if inner.state != SessionState::Authenticated {
            // signed out while the exchange was in flight
            return Err(ApiError::AuthInvalid("session ended during refresh".to_string()));
        }
        inner.credential = Some(grant.credential);
        inner.refresh_token = Some(grant.refresh_token);
        info!("Token refreshed successfully");
        Ok(credential)
    }

    async fn invalidate(&self) {
        let mut inner = self.inner.write().await;
        if inner.state != SessionState::Disposed {
            inner.state = SessionState::Unauthenticated;
        }
        inner.credential = None;
        inner.refresh_token = None;
    }
}
