//! Queries over the `phone_codes` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::Instrument;
use uuid::Uuid;

/// Store a new phone code for a user, replacing any outstanding one. The
/// `user_id` unique constraint guarantees at most one live code per user.
///
/// # Errors
/// Returns an error if the upsert fails.
pub async fn upsert_phone_code(pool: &PgPool, user_id: Uuid, code: &str, phone: &str) -> Result<()> {
    let query = r"
        INSERT INTO phone_codes (user_id, code, phone, created_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (user_id)
        DO UPDATE SET code = EXCLUDED.code, phone = EXCLUDED.phone, created_at = NOW()
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(code)
        .bind(phone)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to upsert phone code")?;

    Ok(())
}

/// Consume a phone code: the lookup, comparison, and delete are a single
/// conditional DELETE (id and code must match, code under 24 hours old), and
/// the user's phone is marked verified in the same transaction. The
/// delete-on-success makes each issued code single-use.
///
/// Returns false when nothing matched (absent, stale, or wrong code).
///
/// # Errors
/// Returns an error if the transaction fails.
pub async fn consume_phone_code(pool: &PgPool, user_id: Uuid, code: &str) -> Result<bool> {
    let mut tx = pool
        .begin()
        .await
        .context("failed to start phone validation transaction")?;

    let query = r"
        DELETE FROM phone_codes
        WHERE user_id = $1
          AND code = $2
          AND created_at > NOW() - INTERVAL '24 hours'
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .bind(code)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to delete phone code")?;

    if result.rows_affected() == 0 {
        tx.rollback()
            .await
            .context("failed to roll back phone validation transaction")?;
        return Ok(false);
    }

    let query = "UPDATE users SET is_phone_verified = TRUE WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to mark phone verified")?;

    tx.commit()
        .await
        .context("failed to commit phone validation transaction")?;

    Ok(true)
}
