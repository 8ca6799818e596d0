//! # Roost Core
//!
//! A self-hostable guild/channel chat back end:
//! - Authenticated HTTP API plus a WebSocket stream for live messages
//! - PostgreSQL for persistent state
//! - Two-tier cache (in-process + Redis) shielding hot profile reads
//! - Per-channel pub/sub hub fanning new messages out to subscribers
//!
//! ## Module Structure
//!
//! ```text
//! roost/
//! +-- config/         Configuration management
//! +-- domain/         Entities, repository traits, claim schema
//! +-- application/    Services and DTOs
//! +-- infrastructure/ Database, cache, hub, and metrics implementations
//! +-- presentation/   HTTP routes, pipeline middleware, subscribe stream
//! +-- shared/         Error taxonomy
//! ```

// Configuration module
pub mod config;

// Domain layer - entities and store ports
pub mod domain;

// Application layer - services
pub mod application;

// Infrastructure layer - adapters
pub mod infrastructure;

// Presentation layer - transport
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
