pub mod boundary;
pub mod config;
pub mod error;
pub mod ingest;
pub mod payload;
pub mod presentation;
pub mod store;
pub mod summary;
pub mod telemetry;
