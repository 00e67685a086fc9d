use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: i64, // expiration time
    #[serde(default)]
    pub iat: i64, // issued at
}

/// Bearer token issued by the identity provider.
///
/// Only ever held in memory by an auth session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub subject: String,
    pub email: Option<String>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("subject", &self.subject)
            .finish()
    }
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
            subject: String::new(),
            email: None,
        }
    }

    /// Reads expiry and subject from an ID token.
    ///
    /// The signature is not checked here: the key belongs to the provider
    /// and the backend verifies every token it receives.
    pub fn from_id_token(token: &str) -> Result<Self, ApiError> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;

        let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| ApiError::AuthInvalid(format!("malformed ID token: {e}")))?;

        let expires_at = Utc
            .timestamp_opt(data.claims.exp, 0)
            .single()
            .ok_or_else(|| ApiError::AuthInvalid("ID token expiry out of range".to_string()))?;

        Ok(Self {
            token: token.to_string(),
            expires_at,
            subject: data.claims.sub,
            email: data.claims.email,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Password sign-in response from the identity provider.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub id_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub local_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Secure-token exchange response.
#[derive(Debug, Deserialize)]
pub struct RefreshTokenResponse {
    pub id_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest<'a> {
    pub id_token: &'a str,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}
