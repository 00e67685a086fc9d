pub mod auth;
pub mod contributions;
pub mod events;
pub mod gateway;
pub mod handoff;
pub mod session;
pub mod upi;
