use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single handoff attempt, kept only until the user reports the outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub transaction_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl PaymentIntent {
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now - self.created_at > ttl
    }
}

/// A built UPI payment request.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    /// `upi://pay?...`
    pub uri: String,
    /// The encoded query string shared by every app-specific URI.
    pub query: String,
    pub transaction_id: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl PaymentRequest {
    pub fn intent(&self) -> PaymentIntent {
        PaymentIntent {
            transaction_id: self.transaction_id.clone(),
            amount: self.amount,
            created_at: self.created_at,
        }
    }
}

/// What the thank-you screen shows after a gift is recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionReceipt {
    pub name: String,
    pub amount: Decimal,
    pub display_amount: String,
    pub message: String,
    pub couple: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub share_text: String,
}
