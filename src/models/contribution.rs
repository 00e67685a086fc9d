use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::helpers::{WireTimestamp, amount_number};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Bride,
    Groom,
}

impl FromStr for Relation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bride" => Ok(Relation::Bride),
            "groom" => Ok(Relation::Groom),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Bride => f.write_str("bride"),
            Relation::Groom => f.write_str("groom"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(with = "amount_number")]
    pub amount: Decimal,
    pub relation: Relation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<WireTimestamp>,
}

/// Body sent to the backend once a gift should be recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateContribution {
    pub event_id: String,
    pub name: String,
    #[serde(with = "amount_number")]
    pub amount: Decimal,
    pub relation: Relation,
    pub message: String,
}
