//! Application Services
//!
//! Stateless domain services. Each validates its input before any I/O and
//! returns the sentinel errors from the shared taxonomy.

mod auth_service;
mod chat_service;
mod guild_service;
mod token_service;
mod user_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth_service::{AuthService, AuthTokens};
pub use chat_service::ChatService;
pub use guild_service::GuildService;
pub use token_service::TokenService;
pub use user_service::UserService;
