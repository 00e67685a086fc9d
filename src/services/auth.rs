use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::{AppSettings, AuthSettings};
use crate::errors::ApiError;
use crate::models::auth::{Credential, SessionInfo, SessionRequest, SignInResponse};
use crate::requests::auth::LoginRequest;
use crate::routes::api;
use crate::services::gateway::Gateway;
use crate::services::session::{Navigator, TokenGrant, TokenProvider, TokenSession};
use crate::utils::helpers::ApiResponse;

/// Sign-in, backend session cookie and logout.
pub struct AuthService<P> {
    gateway: Arc<Gateway>,
    session: Arc<TokenSession<P>>,
    navigator: Arc<dyn Navigator>,
    settings: AuthSettings,
    login_path: String,
}

impl<P: TokenProvider> AuthService<P> {
    pub fn new(
        gateway: Arc<Gateway>,
        session: Arc<TokenSession<P>>,
        navigator: Arc<dyn Navigator>,
        settings: &AuthSettings,
        app: &AppSettings,
    ) -> Self {
        Self {
            gateway,
            session,
            navigator,
            settings: settings.clone(),
            login_path: app.login_path.clone(),
        }
    }

    /// Password sign-in with the identity provider, then a backend session.
    pub async fn sign_in(&self, request: &LoginRequest) -> Result<Credential, ApiError> {
        request.validate()?;
        if self.settings.api_key.is_empty() {
            return Err(ApiError::AuthInvalid(
                "identity provider API key is not configured".to_string(),
            ));
        }

        let response = self
            .gateway
            .client()
            .post(&self.settings.sign_in_url)
            .query(&[("key", self.settings.api_key.as_str())])
            .json(&serde_json::json!({
                "email": request.email.trim(),
                "password": request.password,
                "returnSecureToken": true,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Sign-in rejected for {}: status {}", request.email, status);
            return Err(match ApiError::from_status(status, &body) {
                ApiError::BadRequest(reason) => ApiError::AuthInvalid(reason),
                other => other,
            });
        }

        let body: SignInResponse = response.json().await?;
        let credential = Credential::from_id_token(&body.id_token)?;
        self.session
            .establish(TokenGrant {
                credential: credential.clone(),
                refresh_token: body.refresh_token,
            })
            .await?;

        if let Err(e) = self.create_session(&credential.token).await {
            error!("Failed to create session: {}", e);
            self.session.dispose().await;
            return Err(e);
        }

        info!("Signed in as {}", credential.subject);
        Ok(credential)
    }

    /// Exchanges an ID token for the backend session cookie.
    pub async fn create_session(&self, id_token: &str) -> Result<SessionInfo, ApiError> {
        let response: ApiResponse<SessionInfo> = self
            .gateway
            .post(api::AUTH_SESSION, &SessionRequest { id_token })
            .await?;
        Ok(response.into_result()?.unwrap_or_default())
    }

    /// Ends the backend session. The local session is disposed either way.
    pub async fn logout(&self) {
        if let Err(e) = self
            .gateway
            .request::<(), Value>(Method::POST, api::AUTH_LOGOUT, None)
            .await
        {
            error!("Failed to logout: {}", e);
        }
        self.session.dispose().await;
        self.navigator.redirect(&self.login_path);
    }
}
