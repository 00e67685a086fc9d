pub mod auth;
pub mod contribution;
pub mod event;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    // handle@provider, as accepted by NPCI-registered apps
    static ref UPI_ID: Regex =
        Regex::new(r"^[A-Za-z0-9._\-]{2,256}@[A-Za-z][A-Za-z0-9]{1,63}$").expect("valid UPI id pattern");
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{field} is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("No fields provided for update")]
    NoUpdateFields,
}

pub fn is_valid_upi_id(upi_id: &str) -> bool {
    UPI_ID.is_match(upi_id)
}

pub(crate) fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    Ok(trimmed.to_string())
}
