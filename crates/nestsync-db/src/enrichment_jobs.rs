//! Insert-once markers in `enrichment_jobs`.
//!
//! The sync engine only ever creates markers; the downstream worker owns
//! every later state transition.

use sqlx::PgPool;

use crate::DbError;

/// `content_type` used for markers that point at `instagram_posts` rows.
pub const POST_CONTENT_TYPE: &str = "instagram_posts";

/// Enqueues a pending enrichment job unless one already exists for
/// `(client_id, content_id, content_type)`.
///
/// Returns `1` if a marker was created, `0` if it already existed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn enqueue_enrichment_job(
    pool: &PgPool,
    client_id: &str,
    content_id: &str,
    content_type: &str,
) -> Result<u64, DbError> {
    let affected = sqlx::query(
        "INSERT INTO enrichment_jobs (client_id, content_id, content_type, status) \
         VALUES ($1, $2, $3, 'pending') \
         ON CONFLICT (client_id, content_id, content_type) DO NOTHING",
    )
    .bind(client_id)
    .bind(content_id)
    .bind(content_type)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected)
}

/// Counts a tenant's enrichment markers of any status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_enrichment_jobs(pool: &PgPool, client_id: &str) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM enrichment_jobs WHERE client_id = $1",
    )
    .bind(client_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
