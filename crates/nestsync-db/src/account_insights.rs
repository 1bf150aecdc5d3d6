//! Database operations for `instagram_account_insights`.

use chrono::NaiveDate;
use nestsync_core::AccountInsight;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `instagram_account_insights` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct AccountInsightRow {
    pub client_id: String,
    pub account_id: String,
    pub date: NaiveDate,
    pub period: String,
    pub reach: i64,
    pub profile_views: i64,
    pub follower_count: i64,
}

/// Upserts one `(client_id, account_id, date, period)` bucket.
///
/// A `None` metric means the run did not measure it for this date: new rows
/// store `0`, existing rows keep their stored value. `follower_count` is
/// always overwritten.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_account_insight(
    pool: &PgPool,
    client_id: &str,
    insight: &AccountInsight,
) -> Result<u64, DbError> {
    let affected = sqlx::query(
        "INSERT INTO instagram_account_insights \
             (client_id, account_id, date, period, reach, profile_views, follower_count) \
         VALUES ($1, $2, $3, $4, COALESCE($5, 0), COALESCE($6, 0), $7) \
         ON CONFLICT (client_id, account_id, date, period) DO UPDATE SET \
             reach          = COALESCE($5, instagram_account_insights.reach), \
             profile_views  = COALESCE($6, instagram_account_insights.profile_views), \
             follower_count = EXCLUDED.follower_count, \
             updated_at     = NOW()",
    )
    .bind(client_id)
    .bind(&insight.account_id)
    .bind(insight.date)
    .bind(&insight.period)
    .bind(insight.reach)
    .bind(insight.profile_views)
    .bind(insight.follower_count)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected)
}

/// Lists all account-insight rows for a tenant ordered by date.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_account_insights(
    pool: &PgPool,
    client_id: &str,
) -> Result<Vec<AccountInsightRow>, DbError> {
    let rows = sqlx::query_as::<_, AccountInsightRow>(
        "SELECT client_id, account_id, date, period, reach, profile_views, follower_count \
         FROM instagram_account_insights \
         WHERE client_id = $1 \
         ORDER BY date, period",
    )
    .bind(client_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
