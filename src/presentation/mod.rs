//! # Presentation Layer
//!
//! The transport adapters: HTTP handlers, the request pipeline middleware,
//! and the WebSocket subscribe stream. Adapters translate wire DTOs to and
//! from domain entities and contain no business rules.

pub mod http;
pub mod middleware;
pub mod websocket;
