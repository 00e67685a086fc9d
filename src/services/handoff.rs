//! Handing the payment over to an external UPI app.
//!
//! There is no signal that an app actually opened, let alone that the payment
//! went through. The only evidence is the page losing focus shortly after a
//! launch URI is opened. If focus is kept past the fallback delay the launch
//! is treated as failed and the next URI is tried. This is a best-effort
//! heuristic: a slow app can be skipped, and an unrelated focus change can be
//! mistaken for a launch. The payment outcome itself is always self-reported.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::payment::PaymentRequest;
use crate::services::upi::{PaymentApp, Platform};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandoffError {
    #[error("Please use a mobile device for UPI payments")]
    UnsupportedPlatform,
    #[error("Cannot build payment request: {0}")]
    MalformedInput(String),
    #[error("No UPI app responded")]
    NoAppResponded,
    #[error("Failed to open {uri}: {reason}")]
    LaunchFailed { uri: String, reason: String },
}

/// The page or device hosting the checkout.
#[async_trait]
pub trait HandoffHost: Send + Sync {
    fn platform(&self) -> Platform;

    /// Navigates to `uri`. Returns once the navigation has been issued.
    ///
    /// An error only skips this URI; the handoff moves on to the next one.
    async fn open(&self, uri: &str) -> Result<(), HandoffError>;

    /// Resolves once the page has lost foreground after the last `open`.
    async fn focus_lost(&self);

    /// Resolves once the page is in the foreground again.
    async fn focus_regained(&self);
}

/// The app the user left for and came back from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffReturn {
    pub app: &'static str,
    pub uri: String,
}

/// Tries each candidate's launch URIs in order until one takes the page out
/// of focus, then waits for the user to come back. URIs the host cannot open
/// are skipped.
pub async fn initiate_handoff<H>(
    host: &H,
    request: &PaymentRequest,
    candidates: &[PaymentApp],
    fallback_delay: Duration,
) -> Result<HandoffReturn, HandoffError>
where
    H: HandoffHost + ?Sized,
{
    let platform = host.platform();
    if !platform.is_mobile() {
        warn!("Payment handoff attempted on {:?}", platform);
        return Err(HandoffError::UnsupportedPlatform);
    }

    for app in candidates {
        for uri in app.launch_sequence(platform, request) {
            info!(app = app.name, tr = %request.transaction_id, "Opening payment app");
            if let Err(e) = host.open(&uri).await {
                warn!(app = app.name, "Failed to open payment app: {}", e);
                continue;
            }

            if tokio::time::timeout(fallback_delay, host.focus_lost())
                .await
                .is_ok()
            {
                info!(app = app.name, "Page left for payment app, waiting for return");
                host.focus_regained().await;
                return Ok(HandoffReturn { app: app.name, uri });
            }
            warn!(app = app.name, "Page kept focus, falling back");
        }
    }

    Err(HandoffError::NoAppResponded)
}
