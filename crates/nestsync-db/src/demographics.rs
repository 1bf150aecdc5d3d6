//! Database operations for `instagram_audience_demographics`.
//!
//! The four breakdown slots are stored as opaque `JSONB` payloads.

use chrono::NaiveDate;
use nestsync_core::DemographicSlots;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `instagram_audience_demographics` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct DemographicsRow {
    pub client_id: String,
    pub account_id: String,
    pub date: NaiveDate,
    pub city: Option<Json<serde_json::Value>>,
    pub country: Option<Json<serde_json::Value>>,
    pub age_gender: Option<Json<serde_json::Value>>,
    pub locale: Option<Json<serde_json::Value>>,
}

/// Upserts the daily demographic snapshot, one row per
/// `(client_id, account_id, date)`. Slots present in `slots` replace the
/// stored value; absent slots keep whatever an earlier write stored.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_demographics(
    pool: &PgPool,
    client_id: &str,
    account_id: &str,
    date: NaiveDate,
    slots: &DemographicSlots,
) -> Result<u64, DbError> {
    let affected = sqlx::query(
        "INSERT INTO instagram_audience_demographics \
             (client_id, account_id, date, city, country, age_gender, locale) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (client_id, account_id, date) DO UPDATE SET \
             city       = COALESCE(EXCLUDED.city, instagram_audience_demographics.city), \
             country    = COALESCE(EXCLUDED.country, instagram_audience_demographics.country), \
             age_gender = COALESCE(EXCLUDED.age_gender, instagram_audience_demographics.age_gender), \
             locale     = COALESCE(EXCLUDED.locale, instagram_audience_demographics.locale), \
             updated_at = NOW()",
    )
    .bind(client_id)
    .bind(account_id)
    .bind(date)
    .bind(slots.city.as_ref().map(Json))
    .bind(slots.country.as_ref().map(Json))
    .bind(slots.age_gender.as_ref().map(Json))
    .bind(slots.locale.as_ref().map(Json))
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected)
}

/// Fetches the demographic snapshot for one day.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_demographics(
    pool: &PgPool,
    client_id: &str,
    account_id: &str,
    date: NaiveDate,
) -> Result<Option<DemographicsRow>, DbError> {
    let row = sqlx::query_as::<_, DemographicsRow>(
        "SELECT client_id, account_id, date, city, country, age_gender, locale \
         FROM instagram_audience_demographics \
         WHERE client_id = $1 AND account_id = $2 AND date = $3",
    )
    .bind(client_id)
    .bind(account_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
