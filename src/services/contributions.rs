use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::errors::ApiError;
use crate::models::contribution::{Contribution, CreateContribution};
use crate::routes::api;
use crate::services::gateway::Gateway;
use crate::utils::helpers::{ApiResponse, acknowledge};

#[derive(Clone)]
pub struct ContributionsApi {
    gateway: Arc<Gateway>,
}

impl ContributionsApi {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, event_id: &str) -> Result<Vec<Contribution>, ApiError> {
        let response: ApiResponse<Vec<Contribution>> =
            self.gateway.get(&api::contributions(event_id)).await?;
        Ok(response.into_result()?.unwrap_or_default())
    }

    /// Records a gift as the signed-in host.
    pub async fn create(&self, contribution: &CreateContribution) -> Result<(), ApiError> {
        info!(
            "Recording contribution from {} for event {}",
            contribution.name, contribution.event_id
        );
        let response: Option<ApiResponse<Value>> = self
            .gateway
            .post(&api::contribution_create(&contribution.event_id), contribution)
            .await?;
        acknowledge(response)
    }

    /// Records a gift from a guest, no credential needed.
    pub async fn add(&self, contribution: &CreateContribution) -> Result<(), ApiError> {
        info!(
            "Recording guest contribution from {} for event {}",
            contribution.name, contribution.event_id
        );
        let response: Option<ApiResponse<Value>> = self
            .gateway
            .post(&api::contribution_add(&contribution.event_id), contribution)
            .await?;
        acknowledge(response)
    }
}
