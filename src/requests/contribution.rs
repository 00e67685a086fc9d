use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

use super::{ValidationError, required};
use crate::models::contribution::{CreateContribution, Relation};

/// Largest number of decimal places UPI accepts for `am`.
pub const MAX_AMOUNT_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Upi,
    /// Cash or any gift recorded by hand, no handoff.
    Cash,
}

fn default_relation() -> Relation {
    Relation::Bride
}

/// Raw gift form input, amount as typed.
#[derive(Debug, Clone, Deserialize)]
pub struct ContributionRequest {
    pub name: String,
    pub amount: String,
    #[serde(default = "default_relation")]
    pub relation: Relation,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub method: PaymentMethod,
}

impl ContributionRequest {
    pub fn validate(&self, event_id: &str) -> Result<CreateContribution, ValidationError> {
        let event_id = required("eventId", event_id)?;
        let name = required("name", &self.name)?;
        let amount = parse_amount(&self.amount)?;

        Ok(CreateContribution {
            event_id,
            name,
            amount,
            relation: self.relation,
            message: self.message.trim().to_string(),
        })
    }
}

pub fn parse_amount(raw: &str) -> Result<Decimal, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Missing("amount"));
    }
    let amount = Decimal::from_str(raw).map_err(|e| ValidationError::Invalid {
        field: "amount",
        reason: e.to_string(),
    })?;
    check_amount(amount)?;
    Ok(amount)
}

pub fn check_amount(amount: Decimal) -> Result<(), ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::Invalid {
            field: "amount",
            reason: "must be greater than zero".to_string(),
        });
    }
    if amount.scale() > MAX_AMOUNT_SCALE {
        return Err(ValidationError::Invalid {
            field: "amount",
            reason: format!("at most {MAX_AMOUNT_SCALE} decimal places"),
        });
    }
    Ok(())
}
