//! Database operations for `instagram_post_insights`.

use chrono::NaiveDate;
use nestsync_core::PostInsight;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `instagram_post_insights` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PostInsightRow {
    pub post_id: String,
    pub date: NaiveDate,
    pub client_id: String,
    pub reach: i64,
    pub saved: i64,
    pub total_interactions: i64,
    pub views: i64,
}

/// Upserts the daily insight snapshot for a post, keyed by `(post_id, date)`.
/// Re-running the same day overwrites the counters.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_post_insight(
    pool: &PgPool,
    client_id: &str,
    insight: &PostInsight,
) -> Result<u64, DbError> {
    let affected = sqlx::query(
        "INSERT INTO instagram_post_insights \
             (post_id, date, client_id, reach, saved, total_interactions, views) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (post_id, date) DO UPDATE SET \
             reach              = EXCLUDED.reach, \
             saved              = EXCLUDED.saved, \
             total_interactions = EXCLUDED.total_interactions, \
             views              = EXCLUDED.views, \
             updated_at         = NOW()",
    )
    .bind(&insight.post_id)
    .bind(insight.date)
    .bind(client_id)
    .bind(insight.reach)
    .bind(insight.saved)
    .bind(insight.total_interactions)
    .bind(insight.views)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected)
}

/// Fetches one post's snapshot for a given date.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_post_insight(
    pool: &PgPool,
    post_id: &str,
    date: NaiveDate,
) -> Result<Option<PostInsightRow>, DbError> {
    let row = sqlx::query_as::<_, PostInsightRow>(
        "SELECT post_id, date, client_id, reach, saved, total_interactions, views \
         FROM instagram_post_insights \
         WHERE post_id = $1 AND date = $2",
    )
    .bind(post_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
