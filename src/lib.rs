pub mod api;
pub mod config;
pub mod listing;
pub mod observability;
pub mod provider;
