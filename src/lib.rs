//! linkwatch: connectivity-monitoring core.
//!
//! Clients report device identity, location, and cellular signal telemetry;
//! the core deduplicates locations fuzzily, classifies signal quality,
//! persists the telemetry, and raises alerts routed per the user's
//! configured mechanism. The transport and auth layers live elsewhere and
//! talk to the services in this crate.

pub mod alert;
pub mod app;
pub mod carrier;
pub mod config;
pub mod db;
pub mod error;
pub mod geo;
pub mod models;
pub mod notify;
pub mod ping;
pub mod place;
pub mod signal;
pub mod store;
