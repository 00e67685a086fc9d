pub mod auth;
pub mod contribution;
pub mod event;
pub mod payment;
