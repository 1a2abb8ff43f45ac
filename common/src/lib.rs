// Shared library for the clinic directory service: configuration, store
// access and query resolution

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod query;
pub mod retry;
pub mod telemetry;
