//! Backend paths consumed by the client.

use url::form_urlencoded;

pub const EVENTS_ALL: &str = "/events/getall";
pub const EVENTS_ADD: &str = "/events/addevent";
pub const AUTH_SESSION: &str = "/auth/session";
pub const AUTH_LOGOUT: &str = "/auth/logout";

/// Path prefixes served without a credential.
pub const PUBLIC_ROUTES: &[&str] = &["/contributions/add", "/events/public"];

pub fn is_public(path: &str) -> bool {
    PUBLIC_ROUTES.iter().any(|route| path.starts_with(route))
}

/// Escapes an id for use as a single path segment.
pub fn segment(id: &str) -> String {
    form_urlencoded::byte_serialize(id.as_bytes()).collect()
}

pub fn event(id: &str) -> String {
    format!("/events/event/{}", segment(id))
}

pub fn event_public(id: &str) -> String {
    format!("/events/public/{}", segment(id))
}

pub fn event_mutation(id: &str) -> String {
    format!("/events/{}", segment(id))
}

pub fn contributions(event_id: &str) -> String {
    format!("/contributions/get/{}", segment(event_id))
}

pub fn contribution_create(event_id: &str) -> String {
    format!("/contributions/{}", segment(event_id))
}

pub fn contribution_add(event_id: &str) -> String {
    format!("/contributions/add/{}", segment(event_id))
}
