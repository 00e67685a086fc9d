use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::errors::ApiError;
use crate::models::event::{CreateEvent, Event, EventCreated, UpdateEvent};
use crate::requests::ValidationError;
use crate::routes::api;
use crate::services::gateway::Gateway;
use crate::utils::helpers::{ApiResponse, acknowledge};

#[derive(Clone)]
pub struct EventsApi {
    gateway: Arc<Gateway>,
}

impl EventsApi {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> Result<Vec<Event>, ApiError> {
        let response: ApiResponse<Vec<Event>> = self.gateway.get(api::EVENTS_ALL).await?;
        Ok(response.into_result()?.unwrap_or_default())
    }

    pub async fn get(&self, id: &str) -> Result<Event, ApiError> {
        let response: ApiResponse<Event> = self.gateway.get(&api::event(id)).await?;
        response.into_data()
    }

    /// Guest view of an event, served without a credential.
    pub async fn get_public(&self, id: &str) -> Result<Event, ApiError> {
        let response: ApiResponse<Event> = self.gateway.get(&api::event_public(id)).await?;
        response.into_data()
    }

    pub async fn create(&self, event: &CreateEvent) -> Result<EventCreated, ApiError> {
        info!("Creating event for {} & {}", event.bride_name, event.groom_name);
        let response: ApiResponse<EventCreated> =
            self.gateway.post(api::EVENTS_ADD, event).await?;
        Ok(response.into_result()?.unwrap_or_default())
    }

    pub async fn update(&self, id: &str, update: &UpdateEvent) -> Result<(), ApiError> {
        if update.is_empty() {
            return Err(ValidationError::NoUpdateFields.into());
        }
        let response: Option<ApiResponse<Value>> =
            self.gateway.put(&api::event_mutation(id), update).await?;
        acknowledge(response)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let response: Option<ApiResponse<Value>> =
            self.gateway.delete(&api::event_mutation(id)).await?;
        acknowledge(response)
    }
}
