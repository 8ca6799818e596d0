//! Request Pipeline
//!
//! Middleware applied outer to inner: recover -> request-id -> log -> auth.
//! Auth is a route layer on the protected groups only; register, login, and
//! refresh stay public.

pub mod auth;
pub mod logging;
pub mod recover;
pub mod request_id;

pub use auth::{auth_middleware, AuthUser};
pub use logging::log_requests;
pub use recover::recover_middleware;
pub use request_id::{request_id_middleware, RequestId};
