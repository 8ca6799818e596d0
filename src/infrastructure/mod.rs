//! # Infrastructure Layer
//!
//! Concrete implementations of the store ports, the cache tier, the pub/sub
//! hub, and process-wide metrics.

pub mod cache;
pub mod database;
pub mod hub;
pub mod metrics;
pub mod repositories;
