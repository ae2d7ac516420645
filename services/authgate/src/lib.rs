pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod observability;
pub mod store;
