//! Unit of Work
//!
//! Transactional boundary for multi-entity writes. All operations issued
//! through the handle participate in one transaction; an error from the
//! closure rolls everything back. A handle is bound to a single task and is
//! never shared.

use futures::future::BoxFuture;
use sqlx::{PgPool, Postgres, Transaction};

use crate::shared::error::AppError;

/// Execute a closure within a transaction.
///
/// Commits on `Ok`, rolls back on `Err` (or on drop, should rollback itself
/// fail).
///
/// # Example
/// ```ignore
/// let guild_id = with_transaction(&pool, |tx| {
///     Box::pin(async move {
///         guild_repository::insert(&mut **tx, &guild).await?;
///         member_repository::upsert(&mut **tx, &owner_member).await?;
///         Ok(guild.id)
///     })
/// })
/// .await?;
/// ```
pub async fn with_transaction<T, F>(pool: &PgPool, f: F) -> Result<T, AppError>
where
    F: for<'c> FnOnce(&'c mut Transaction<'static, Postgres>) -> BoxFuture<'c, Result<T, AppError>>,
{
    let mut tx = pool.begin().await?;

    match f(&mut tx).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            // Rollback failure is secondary to the original error.
            let _ = tx.rollback().await;
            Err(e)
        }
    }
}
