pub mod contributions;
pub mod events;
