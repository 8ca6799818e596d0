//! # Domain Layer
//!
//! Core business entities, the repository traits (store ports) implemented by
//! the persistence adapters, and the bearer claim schema.
//!
//! The domain layer has no dependency on the infrastructure or presentation
//! layers; services consume the repository traits and the composition root
//! wires in the Postgres implementations.

pub mod claims;
pub mod entities;

pub use claims::{Claims, TokenKind};
pub use entities::*;
