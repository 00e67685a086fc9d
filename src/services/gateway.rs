//! Authenticated request gateway.
//!
//! Every outbound call goes through [`Gateway::request`], which attaches the
//! session credential and recovers from a 401 by refreshing it. Only one
//! refresh runs at a time: callers that hit a 401 while it is in flight wait
//! on the same shared future and are replayed with whatever it produced.
//! A request is replayed at most once.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{ApiSettings, AppSettings};
use crate::errors::ApiError;
use crate::models::auth::Credential;
use crate::routes::api::is_public;
use crate::services::session::{AuthSession, Navigator};

type RefreshFuture = Shared<BoxFuture<'static, Result<Credential, ApiError>>>;

#[derive(Default)]
struct RefreshState {
    in_flight: Option<RefreshFuture>,
    /// Outcome of the last settled refresh, keyed by the token it replaced.
    settled: Option<(String, Result<Credential, ApiError>)>,
}

pub struct Gateway {
    client: Client,
    base_url: String,
    session: Arc<dyn AuthSession>,
    navigator: Arc<dyn Navigator>,
    landing_path: String,
    refresh: Arc<Mutex<RefreshState>>,
}

impl Gateway {
    pub fn new(
        api: &ApiSettings,
        app: &AppSettings,
        session: Arc<dyn AuthSession>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(api.timeout())
            .build()
            .map_err(|e| ApiError::NetworkUnreachable(e.to_string()))?;

        Ok(Self::with_client(
            client,
            &api.base_url,
            &app.landing_path,
            session,
            navigator,
        ))
    }

    pub fn with_client(
        client: Client,
        base_url: &str,
        landing_path: &str,
        session: Arc<dyn AuthSession>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            navigator,
            landing_path: landing_path.to_string(),
            refresh: Arc::new(Mutex::new(RefreshState::default())),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn session(&self) -> &Arc<dyn AuthSession> {
        &self.session
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<(), T>(Method::GET, path, None).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<(), T>(Method::DELETE, path, None).await
    }

    pub async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request_id = Uuid::new_v4();
        info!(%request_id, "Request started: {} {}", method, path);

        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| ApiError::BadRequest(format!("unserializable request body: {e}")))?;

        let credential = if is_public(path) {
            None
        } else {
            match self.session.credential().await {
                Ok(credential) => {
                    info!(%request_id, "Token added to request");
                    Some(credential)
                }
                Err(e) => {
                    error!(%request_id, "Request attempted without authentication");
                    return Err(e);
                }
            }
        };
        let token = credential.as_ref().map(|c| c.token.as_str());

        let response = self
            .dispatch(&method, path, body.as_ref(), token, request_id)
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::decode(response, path, request_id).await;
        }

        let Some(stale) = token else {
            return Err(ApiError::AuthInvalid(
                "public route rejected the request".to_string(),
            ));
        };

        warn!(%request_id, "Token expired, attempting refresh for {}", path);
        let fresh = self.refreshed_credential(stale).await?;

        let replay = self
            .dispatch(&method, path, body.as_ref(), Some(&fresh.token), request_id)
            .await?;
        if replay.status() == StatusCode::UNAUTHORIZED {
            error!(%request_id, "Request rejected again after refresh: {}", path);
            return Err(ApiError::AuthInvalid(
                "credential rejected after refresh".to_string(),
            ));
        }
        Self::decode(replay, path, request_id).await
    }

    /// Resolves a replacement for `stale`, starting a refresh only when none
    /// is in flight and none has already replaced that token.
    async fn refreshed_credential(&self, stale: &str) -> Result<Credential, ApiError> {
        let refresh = {
            let mut state = self.refresh.lock().await;

            if let Some(in_flight) = &state.in_flight {
                info!("Refresh already in progress, queueing request");
                in_flight.clone()
            } else {
                match &state.settled {
                    Some((replaced, outcome)) if replaced == stale => {
                        info!("Credential already refreshed, replaying request");
                        return outcome.clone();
                    }
                    _ => {}
                }
                let refresh = self.start_refresh(stale.to_string());
                state.in_flight = Some(refresh.clone());
                refresh
            }
        };

        refresh.await
    }

    fn start_refresh(&self, stale: String) -> RefreshFuture {
        let session = Arc::clone(&self.session);
        let navigator = Arc::clone(&self.navigator);
        let landing_path = self.landing_path.clone();
        let slot = Arc::clone(&self.refresh);

        async move {
            let outcome = match session.refresh().await {
                Ok(credential) => {
                    info!("Token refresh successful");
                    Ok(credential)
                }
                Err(e) => {
                    error!("Token refresh failed: {}", e);
                    session.invalidate().await;
                    navigator.redirect(&landing_path);
                    Err(match e {
                        ApiError::AuthInvalid(reason) => ApiError::AuthInvalid(reason),
                        other => ApiError::AuthInvalid(format!("token refresh failed: {other}")),
                    })
                }
            };

            let mut state = slot.lock().await;
            state.in_flight = None;
            state.settled = Some((stale, outcome.clone()));
            outcome
        }
        .boxed()
        .shared()
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
        request_id: Uuid,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header("x-request-id", request_id.to_string());
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        builder.send().await.map_err(|e| {
            error!(%request_id, "Request failed before a response: {}", e);
            if e.is_timeout() || e.is_connect() || e.is_request() {
                ApiError::NetworkUnreachable(e.to_string())
            } else {
                ApiError::from(e)
            }
        })
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        path: &str,
        request_id: Uuid,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::from_status(status, &body);
            error!(%request_id, status = status.as_u16(), "Request failed for {}: {}", path, err);
            return Err(err);
        }

        info!(%request_id, status = status.as_u16(), "Response received for {}", path);
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return serde_json::from_value(Value::Null)
                .map_err(|e| ApiError::Decode(e.to_string()));
        }
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
