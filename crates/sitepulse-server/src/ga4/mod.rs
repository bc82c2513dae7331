//! Google Analytics 4 Data API client.
//!
//! Authenticates with a service-account key and implements
//! [`sitepulse_core::report::ReportFetcher`] for the daily page report.

pub mod auth;
pub mod client;
pub mod credentials;
pub mod error;

pub use client::Ga4Client;
pub use credentials::ServiceAccountKey;
pub use error::Ga4Error;
