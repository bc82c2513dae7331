pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod ga4;
pub mod routes;
pub mod state;
