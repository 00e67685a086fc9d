use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Reverse;
use std::str::FromStr;
use tracing::info;

use crate::errors::ApiError;
use crate::models::contribution::{Contribution, Relation};
use crate::models::event::{Event, EventCreated};
use crate::requests::event::CreateEventRequest;
use crate::routes::api;
use crate::services::contributions::ContributionsApi;
use crate::services::events::EventsApi;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Newest event date first.
    #[default]
    Date,
    /// Largest collection first.
    Amount,
}

impl FromStr for SortBy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(SortBy::Date),
            "amount" => Ok(SortBy::Amount),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub search: String,
    pub sort_by: SortBy,
}

/// Case-insensitive match on either name, then sorted.
pub fn filter_events(events: Vec<Event>, query: &EventQuery) -> Vec<Event> {
    let needle = query.search.trim().to_lowercase();
    let mut events: Vec<Event> = events
        .into_iter()
        .filter(|event| {
            needle.is_empty()
                || event.bride_name.to_lowercase().contains(&needle)
                || event.groom_name.to_lowercase().contains(&needle)
        })
        .collect();

    match query.sort_by {
        SortBy::Date => events.sort_by_key(|event| Reverse(event.event_date)),
        SortBy::Amount => {
            events.sort_by_key(|event| Reverse(event.total_amount.unwrap_or(Decimal::ZERO)))
        }
    }
    events
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub total: Decimal,
    pub bride_side: Decimal,
    pub groom_side: Decimal,
    pub count: usize,
}

impl EventSummary {
    pub fn from_contributions(contributions: &[Contribution]) -> Self {
        contributions
            .iter()
            .fold(Self::default(), |mut summary, contribution| {
                summary.total += contribution.amount;
                match contribution.relation {
                    Relation::Bride => summary.bride_side += contribution.amount,
                    Relation::Groom => summary.groom_side += contribution.amount,
                }
                summary.count += 1;
                summary
            })
    }
}

#[derive(Debug, Clone)]
pub struct EventDetails {
    pub event: Event,
    pub contributions: Vec<Contribution>,
    pub summary: EventSummary,
}

/// Host dashboard over the events and contributions endpoints.
pub struct Dashboard {
    events: EventsApi,
    contributions: ContributionsApi,
    share_base_url: String,
}

impl Dashboard {
    pub fn new(events: EventsApi, contributions: ContributionsApi, share_base_url: &str) -> Self {
        Self {
            events,
            contributions,
            share_base_url: share_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn events(&self, query: &EventQuery) -> Result<Vec<Event>, ApiError> {
        let events = self.events.list().await?;
        Ok(filter_events(events, query))
    }

    pub async fn details(&self, event_id: &str) -> Result<EventDetails, ApiError> {
        let (event, contributions) = tokio::try_join!(
            self.events.get(event_id),
            self.contributions.list(event_id)
        )?;
        let summary = EventSummary::from_contributions(&contributions);
        info!(
            "Event {} has {} contributions totalling {}",
            event_id, summary.count, summary.total
        );
        Ok(EventDetails {
            event,
            contributions,
            summary,
        })
    }

    pub async fn create(&self, request: &CreateEventRequest) -> Result<EventCreated, ApiError> {
        let event = request.validate()?;
        self.events.create(&event).await
    }

    /// Link guests open to send their shagun.
    pub fn share_url(&self, event_id: &str) -> String {
        share_url(&self.share_base_url, event_id)
    }
}

pub fn share_url(base_url: &str, event_id: &str) -> String {
    format!(
        "{}/event/{}",
        base_url.trim_end_matches('/'),
        api::segment(event_id)
    )
}
