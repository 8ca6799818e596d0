//! Repository Implementations
//!
//! PostgreSQL adapters for the domain repository traits. Adapters translate
//! driver errors into domain sentinels; driver-native errors never escape
//! this module unclassified.

mod channel_repository;
mod guild_repository;
mod invite_repository;
mod member_repository;
mod message_repository;
mod user_repository;

pub use channel_repository::PgChannelRepository;
pub use guild_repository::PgGuildRepository;
pub use invite_repository::PgInviteRepository;
pub use member_repository::PgMemberRepository;
pub use message_repository::PgMessageRepository;
pub use user_repository::PgUserRepository;

use crate::shared::error::AppError;

/// Classify a driver error, turning unique-violations into the conflict
/// sentinels. The constraint name tells email and username apart.
pub(crate) fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            let constraint = db.constraint().unwrap_or_default();
            return if constraint.contains("email") {
                AppError::EmailConflict
            } else {
                AppError::UsernameConflict
            };
        }
    }
    AppError::Database(e)
}
