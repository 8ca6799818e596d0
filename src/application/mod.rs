//! # Application Layer
//!
//! Domain services orchestrating the store ports, the cache tier, and the
//! hub, plus the wire DTOs the transport adapters map to and from.

pub mod dto;
pub mod services;
