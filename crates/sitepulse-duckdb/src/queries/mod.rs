pub mod aggregates;
pub mod events;
pub mod raw_metrics;
