use chrono::Utc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::PaymentSettings;
use crate::errors::ApiError;
use crate::models::contribution::CreateContribution;
use crate::models::event::Event;
use crate::models::payment::{ContributionReceipt, PaymentIntent};
use crate::requests::ValidationError;
use crate::requests::contribution::{ContributionRequest, PaymentMethod};
use crate::services::contributions::ContributionsApi;
use crate::services::handoff::{HandoffError, HandoffHost, initiate_handoff};
use crate::services::upi::{PaymentApp, build_payment_uri, default_apps};
use crate::utils::helpers::format_inr;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Handoff(#[from] HandoffError),
    #[error("Failed to record contribution: {0}")]
    Api(#[from] ApiError),
    #[error("No payment is awaiting confirmation")]
    NoPendingPayment,
    #[error("Payment {transaction_id} is too old to confirm")]
    IntentExpired { transaction_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutState {
    /// Back from the payment app; ask "did the payment complete?".
    AwaitingConfirmation { intent: PaymentIntent, app: &'static str },
    ThankYou(ContributionReceipt),
    /// The user reported the payment as not completed.
    Declined,
}

struct PendingCheckout {
    intent: PaymentIntent,
    contribution: CreateContribution,
    bride_name: String,
    groom_name: String,
}

/// Guest gift form: UPI handoff, self-reported outcome, then the record.
pub struct CheckoutFlow<H> {
    contributions: ContributionsApi,
    host: H,
    apps: Vec<PaymentApp>,
    fallback_delay: Duration,
    intent_ttl: chrono::Duration,
    pending: Mutex<Option<PendingCheckout>>,
}

impl<H: HandoffHost> CheckoutFlow<H> {
    pub fn new(contributions: ContributionsApi, host: H, settings: &PaymentSettings) -> Self {
        Self {
            contributions,
            host,
            apps: default_apps(),
            fallback_delay: settings.fallback_delay(),
            intent_ttl: settings.intent_ttl(),
            pending: Mutex::new(None),
        }
    }

    /// Restricts or reorders the apps tried during handoff, e.g. to start
    /// from the one the user picked.
    pub fn with_apps(mut self, apps: Vec<PaymentApp>) -> Self {
        self.apps = apps;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub async fn pending_intent(&self) -> Option<PaymentIntent> {
        self.pending.lock().await.as_ref().map(|p| p.intent.clone())
    }

    pub async fn submit(
        &self,
        event: &Event,
        form: &ContributionRequest,
    ) -> Result<CheckoutState, CheckoutError> {
        let contribution = form.validate(&event.id)?;

        if form.method == PaymentMethod::Cash {
            info!("Recording cash entry for event {}", event.id);
            self.contributions.add(&contribution).await?;
            return Ok(CheckoutState::ThankYou(receipt(
                &contribution,
                &event.bride_name,
                &event.groom_name,
                None,
            )));
        }

        let request = build_payment_uri(event, &contribution)?;
        let intent = request.intent();
        *self.pending.lock().await = Some(PendingCheckout {
            intent: intent.clone(),
            contribution,
            bride_name: event.bride_name.clone(),
            groom_name: event.groom_name.clone(),
        });

        match initiate_handoff(&self.host, &request, &self.apps, self.fallback_delay).await {
            Ok(returned) => {
                info!(tr = %intent.transaction_id, "Returned from {}", returned.app);
                Ok(CheckoutState::AwaitingConfirmation {
                    intent,
                    app: returned.app,
                })
            }
            Err(e) => {
                error!("Failed to initiate payment: {}", e);
                self.pending.lock().await.take();
                Err(e.into())
            }
        }
    }

    /// Applies the user's answer to "did the payment complete?".
    ///
    /// A failed record keeps the payment pending so the answer can be
    /// resubmitted without paying again.
    pub async fn confirm(&self, success: bool) -> Result<CheckoutState, CheckoutError> {
        let mut slot = self.pending.lock().await;
        let pending = slot.take().ok_or(CheckoutError::NoPendingPayment)?;

        if !success {
            info!(tr = %pending.intent.transaction_id, "Payment declined by user");
            return Ok(CheckoutState::Declined);
        }

        if pending.intent.is_expired(Utc::now(), self.intent_ttl) {
            warn!(tr = %pending.intent.transaction_id, "Discarding stale payment");
            return Err(CheckoutError::IntentExpired {
                transaction_id: pending.intent.transaction_id,
            });
        }

        match self.contributions.add(&pending.contribution).await {
            Ok(()) => Ok(CheckoutState::ThankYou(receipt(
                &pending.contribution,
                &pending.bride_name,
                &pending.groom_name,
                Some(pending.intent.transaction_id.clone()),
            ))),
            Err(e) => {
                error!(tr = %pending.intent.transaction_id, "Failed to record contribution: {}", e);
                *slot = Some(pending);
                Err(e.into())
            }
        }
    }
}

fn receipt(
    contribution: &CreateContribution,
    bride_name: &str,
    groom_name: &str,
    transaction_id: Option<String>,
) -> ContributionReceipt {
    ContributionReceipt {
        name: contribution.name.clone(),
        amount: contribution.amount,
        display_amount: format_inr(contribution.amount),
        message: contribution.message.clone(),
        couple: format!("{bride_name} & {groom_name}"),
        transaction_id,
        share_text: format!(
            "I just sent my blessings to {bride_name} & {groom_name}'s wedding!"
        ),
    }
}
