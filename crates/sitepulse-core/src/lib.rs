pub mod aggregate;
pub mod analytics;
pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod normalize;
pub mod read;
pub mod report;
pub mod sync;
