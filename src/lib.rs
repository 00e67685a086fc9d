pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod requests;
pub mod routes;
pub mod services;
pub mod utils;
