#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use shagun::errors::ApiError;
use shagun::models::auth::{Claims, Credential};
use shagun::services::handoff::{HandoffError, HandoffHost};
use shagun::services::session::{AuthSession, Navigator, SessionState};
use shagun::services::upi::Platform;

/// Session holding `t0` that refreshes to `t1`, counting every refresh.
pub struct FakeSession {
    state: Mutex<SessionState>,
    token: Mutex<String>,
    fail_refresh: bool,
    refresh_delay: Duration,
    pub refreshes: AtomicUsize,
}

impl FakeSession {
    pub fn authenticated() -> Self {
        Self {
            state: Mutex::new(SessionState::Authenticated),
            token: Mutex::new("t0".to_string()),
            fail_refresh: false,
            refresh_delay: Duration::from_millis(50),
            refreshes: AtomicUsize::new(0),
        }
    }

    pub fn failing_refresh() -> Self {
        Self {
            fail_refresh: true,
            ..Self::authenticated()
        }
    }

    pub fn unauthenticated() -> Self {
        let session = Self::authenticated();
        *session.state.lock().unwrap() = SessionState::Unauthenticated;
        session
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthSession for FakeSession {
    async fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    async fn credential(&self) -> Result<Credential, ApiError> {
        if *self.state.lock().unwrap() != SessionState::Authenticated {
            return Err(ApiError::AuthInvalid("User not authenticated".to_string()));
        }
        let token = self.token.lock().unwrap().clone();
        Ok(Credential::new(token, Utc::now() + ChronoDuration::hours(1)))
    }

    async fn refresh(&self) -> Result<Credential, ApiError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.refresh_delay).await;
        if self.fail_refresh {
            return Err(ApiError::AuthInvalid("refresh token revoked".to_string()));
        }
        *self.token.lock().unwrap() = "t1".to_string();
        Ok(Credential::new("t1", Utc::now() + ChronoDuration::hours(1)))
    }

    async fn invalidate(&self) {
        *self.state.lock().unwrap() = SessionState::Unauthenticated;
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, location: &str) {
        self.redirects.lock().unwrap().push(location.to_string());
    }
}

/// Checkout host whose page only loses focus for URIs `responds` accepts.
pub struct ScriptedHost {
    platform: Platform,
    responds: Box<dyn Fn(&str) -> bool + Send + Sync>,
    refuses: Box<dyn Fn(&str) -> bool + Send + Sync>,
    opened: Mutex<Vec<String>>,
}

impl ScriptedHost {
    pub fn new(platform: Platform, responds: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            platform,
            responds: Box::new(responds),
            refuses: Box::new(|_| false),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Makes `open` fail for URIs `refuses` accepts, as when no handler is
    /// installed for the scheme.
    pub fn refusing(mut self, refuses: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.refuses = Box::new(refuses);
        self
    }

    /// Host where no app ever takes over.
    pub fn silent(platform: Platform) -> Self {
        Self::new(platform, |_| false)
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl HandoffHost for ScriptedHost {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn open(&self, uri: &str) -> Result<(), HandoffError> {
        self.opened.lock().unwrap().push(uri.to_string());
        if (self.refuses)(uri) {
            return Err(HandoffError::LaunchFailed {
                uri: uri.to_string(),
                reason: "no handler".to_string(),
            });
        }
        Ok(())
    }

    async fn focus_lost(&self) {
        let last = self.opened.lock().unwrap().last().cloned();
        match last {
            Some(uri) if (self.responds)(&uri) => {}
            _ => std::future::pending::<()>().await,
        }
    }

    async fn focus_regained(&self) {}
}

/// Unsigned-key ID token for `sub`, valid for an hour.
pub fn id_token(sub: &str) -> String {
    let exp = Utc::now().timestamp() + 3600;
    let claims = Claims {
        sub: sub.to_string(),
        email: Some("host@example.com".to_string()),
        exp,
        iat: exp - 3600,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test"))
        .expect("token encodes")
}
