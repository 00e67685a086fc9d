use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::helpers::{WireTimestamp, flexible_date};

pub const DEFAULT_OCCASION: &str = "wedding";

fn default_occasion() -> String {
    DEFAULT_OCCASION.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    #[serde(default = "default_occasion")]
    pub occasion_type: String,
    pub bride_name: String,
    pub groom_name: String,
    #[serde(with = "flexible_date")]
    pub event_date: NaiveDate,
    pub upi_id: String,
    #[serde(rename = "userId", alias = "ownerId", default)]
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributions_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<WireTimestamp>,
}

impl Event {
    /// "Asha & Rohan"
    pub fn couple(&self) -> String {
        format!("{} & {}", self.bride_name, self.groom_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvent {
    pub occasion_type: String,
    pub bride_name: String,
    pub groom_name: String,
    #[serde(with = "flexible_date")]
    pub event_date: NaiveDate,
    pub upi_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occasion_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bride_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groom_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upi_id: Option<String>,
}

impl UpdateEvent {
    pub fn is_empty(&self) -> bool {
        self.occasion_type.is_none()
            && self.bride_name.is_none()
            && self.groom_name.is_none()
            && self.event_date.is_none()
            && self.upi_id.is_none()
    }
}

/// Payload returned by the create-event endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EventCreated {
    #[serde(default)]
    pub id: Option<String>,
}
