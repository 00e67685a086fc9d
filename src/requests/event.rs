use serde::Deserialize;

use super::{ValidationError, is_valid_upi_id, required};
use crate::models::event::{CreateEvent, DEFAULT_OCCASION, UpdateEvent};
use crate::utils::helpers::flexible_date;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[serde(default)]
    pub occasion_type: Option<String>,
    pub bride_name: String,
    pub groom_name: String,
    pub event_date: String,
    pub upi_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub occasion_type: Option<String>,
    pub bride_name: Option<String>,
    pub groom_name: Option<String>,
    pub event_date: Option<String>,
    pub upi_id: Option<String>,
}

impl CreateEventRequest {
    pub fn validate(&self) -> Result<CreateEvent, ValidationError> {
        let occasion_type = self
            .occasion_type
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .unwrap_or(DEFAULT_OCCASION)
            .to_string();

        Ok(CreateEvent {
            occasion_type,
            bride_name: required("brideName", &self.bride_name)?,
            groom_name: required("groomName", &self.groom_name)?,
            event_date: parse_date(&self.event_date)?,
            upi_id: parse_upi_id(&self.upi_id)?,
        })
    }
}

impl UpdateEventRequest {
    pub fn validate(&self) -> Result<UpdateEvent, ValidationError> {
        let update = UpdateEvent {
            occasion_type: self.occasion_type.as_deref().map(|o| required("occasionType", o)).transpose()?,
            bride_name: self.bride_name.as_deref().map(|n| required("brideName", n)).transpose()?,
            groom_name: self.groom_name.as_deref().map(|n| required("groomName", n)).transpose()?,
            event_date: self.event_date.as_deref().map(parse_date).transpose()?,
            upi_id: self.upi_id.as_deref().map(parse_upi_id).transpose()?,
        };

        if update.is_empty() {
            return Err(ValidationError::NoUpdateFields);
        }
        Ok(update)
    }
}

fn parse_date(raw: &str) -> Result<chrono::NaiveDate, ValidationError> {
    let raw = required("eventDate", raw)?;
    flexible_date::parse(&raw).ok_or_else(|| ValidationError::Invalid {
        field: "eventDate",
        reason: format!("{raw:?} is not a date"),
    })
}

fn parse_upi_id(raw: &str) -> Result<String, ValidationError> {
    let upi_id = required("upiId", raw)?;
    if !is_valid_upi_id(&upi_id) {
        return Err(ValidationError::Invalid {
            field: "upiId",
            reason: "expected username@provider".to_string(),
        });
    }
    Ok(upi_id)
}
