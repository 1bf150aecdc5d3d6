//! Database operations for `instagram_profiles` and `instagram_follower_history`.

use chrono::{DateTime, NaiveDate, Utc};
use nestsync_core::ProfileSnapshot;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `instagram_profiles` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ProfileRow {
    pub client_id: String,
    pub account_id: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub biography: Option<String>,
    pub website: Option<String>,
    pub profile_picture_url: Option<String>,
    pub followers_count: i64,
    pub follows_count: i64,
    pub media_count: i64,
    pub updated_at: DateTime<Utc>,
}

/// Upserts the profile snapshot for `(client_id, account_id)`; latest write wins.
///
/// Returns the number of rows affected (always 1 on success).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_profile(
    pool: &PgPool,
    client_id: &str,
    profile: &ProfileSnapshot,
) -> Result<u64, DbError> {
    let affected = sqlx::query(
        "INSERT INTO instagram_profiles \
             (client_id, account_id, username, name, biography, website, \
              profile_picture_url, followers_count, follows_count, media_count) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (client_id, account_id) DO UPDATE SET \
             username            = EXCLUDED.username, \
             name                = EXCLUDED.name, \
             biography           = EXCLUDED.biography, \
             website             = EXCLUDED.website, \
             profile_picture_url = EXCLUDED.profile_picture_url, \
             followers_count     = EXCLUDED.followers_count, \
             follows_count       = EXCLUDED.follows_count, \
             media_count         = EXCLUDED.media_count, \
             updated_at          = NOW()",
    )
    .bind(client_id)
    .bind(&profile.account_id)
    .bind(&profile.username)
    .bind(&profile.name)
    .bind(&profile.biography)
    .bind(&profile.website)
    .bind(&profile.profile_picture_url)
    .bind(profile.followers_count)
    .bind(profile.follows_count)
    .bind(profile.media_count)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected)
}

/// Records the daily follower count. The first sample written for a given
/// `(client_id, account_id, date)` is kept; later writes are ignored.
///
/// Returns `1` when a sample was inserted, `0` when one already existed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_follower_sample(
    pool: &PgPool,
    client_id: &str,
    account_id: &str,
    date: NaiveDate,
    followers_count: i64,
) -> Result<u64, DbError> {
    let affected = sqlx::query(
        "INSERT INTO instagram_follower_history \
             (client_id, account_id, date, followers_count) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (client_id, account_id, date) DO NOTHING",
    )
    .bind(client_id)
    .bind(account_id)
    .bind(date)
    .bind(followers_count)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected)
}

/// Fetches the stored profile for a tenant's account, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_profile(
    pool: &PgPool,
    client_id: &str,
    account_id: &str,
) -> Result<Option<ProfileRow>, DbError> {
    let row = sqlx::query_as::<_, ProfileRow>(
        "SELECT client_id, account_id, username, name, biography, website, \
                profile_picture_url, followers_count, follows_count, media_count, updated_at \
         FROM instagram_profiles \
         WHERE client_id = $1 AND account_id = $2",
    )
    .bind(client_id)
    .bind(account_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
