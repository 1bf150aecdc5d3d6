//! The one-row-per-tenant `sync_status` ledger.
//!
//! Every write is a single upsert. Starting a backfill clears the previous
//! completion markers so a crash mid-run reads as "started, not completed".
//! Incremental runs use their own columns and never touch backfill state.

use chrono::{DateTime, Utc};
use nestsync_core::SyncMode;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `sync_status` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SyncStatusRow {
    pub client_id: String,
    pub backfill_started_at: Option<DateTime<Utc>>,
    pub backfill_completed_at: Option<DateTime<Utc>>,
    pub backfill_completed: bool,
    pub backfill_error: Option<String>,
    pub incremental_started_at: Option<DateTime<Utc>>,
    pub incremental_completed_at: Option<DateTime<Utc>>,
    pub incremental_error: Option<String>,
    pub last_run_stats: Option<Json<serde_json::Value>>,
    pub updated_at: DateTime<Utc>,
}

/// Records that a run of `mode` has started for `client_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn mark_started(
    pool: &PgPool,
    client_id: &str,
    mode: SyncMode,
    started_at: DateTime<Utc>,
) -> Result<(), DbError> {
    let sql = match mode {
        SyncMode::Backfill => {
            "INSERT INTO sync_status (client_id, backfill_started_at) \
             VALUES ($1, $2) \
             ON CONFLICT (client_id) DO UPDATE SET \
                 backfill_started_at   = EXCLUDED.backfill_started_at, \
                 backfill_completed    = FALSE, \
                 backfill_completed_at = NULL, \
                 backfill_error        = NULL, \
                 updated_at            = NOW()"
        }
        SyncMode::Incremental => {
            "INSERT INTO sync_status (client_id, incremental_started_at) \
             VALUES ($1, $2) \
             ON CONFLICT (client_id) DO UPDATE SET \
                 incremental_started_at = EXCLUDED.incremental_started_at, \
                 incremental_error      = NULL, \
                 updated_at             = NOW()"
        }
    };

    sqlx::query(sql)
        .bind(client_id)
        .bind(started_at)
        .execute(pool)
        .await?;

    Ok(())
}

/// Records a successful run together with its per-stage counts.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn mark_completed(
    pool: &PgPool,
    client_id: &str,
    mode: SyncMode,
    completed_at: DateTime<Utc>,
    stats: &serde_json::Value,
) -> Result<(), DbError> {
    let sql = match mode {
        SyncMode::Backfill => {
            "INSERT INTO sync_status \
                 (client_id, backfill_completed_at, backfill_completed, last_run_stats) \
             VALUES ($1, $2, TRUE, $3) \
             ON CONFLICT (client_id) DO UPDATE SET \
                 backfill_completed_at = EXCLUDED.backfill_completed_at, \
                 backfill_completed    = TRUE, \
                 backfill_error        = NULL, \
                 last_run_stats        = EXCLUDED.last_run_stats, \
                 updated_at            = NOW()"
        }
        SyncMode::Incremental => {
            "INSERT INTO sync_status \
                 (client_id, incremental_completed_at, last_run_stats) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (client_id) DO UPDATE SET \
                 incremental_completed_at = EXCLUDED.incremental_completed_at, \
                 incremental_error        = NULL, \
                 last_run_stats           = EXCLUDED.last_run_stats, \
                 updated_at               = NOW()"
        }
    };

    sqlx::query(sql)
        .bind(client_id)
        .bind(completed_at)
        .bind(Json(stats))
        .execute(pool)
        .await?;

    Ok(())
}

/// Records a terminal failure. Completion markers are left as they are,
/// which after [`mark_started`] means empty for backfill runs.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn mark_failed(
    pool: &PgPool,
    client_id: &str,
    mode: SyncMode,
    error_message: &str,
) -> Result<(), DbError> {
    let sql = match mode {
        SyncMode::Backfill => {
            "INSERT INTO sync_status (client_id, backfill_error) \
             VALUES ($1, $2) \
             ON CONFLICT (client_id) DO UPDATE SET \
                 backfill_error     = EXCLUDED.backfill_error, \
                 backfill_completed = FALSE, \
                 updated_at         = NOW()"
        }
        SyncMode::Incremental => {
            "INSERT INTO sync_status (client_id, incremental_error) \
             VALUES ($1, $2) \
             ON CONFLICT (client_id) DO UPDATE SET \
                 incremental_error = EXCLUDED.incremental_error, \
                 updated_at        = NOW()"
        }
    };

    sqlx::query(sql)
        .bind(client_id)
        .bind(error_message)
        .execute(pool)
        .await?;

    Ok(())
}

/// Fetches the ledger row for a tenant, if one exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_sync_status(
    pool: &PgPool,
    client_id: &str,
) -> Result<Option<SyncStatusRow>, DbError> {
    let row = sqlx::query_as::<_, SyncStatusRow>(
        "SELECT client_id, backfill_started_at, backfill_completed_at, backfill_completed, \
                backfill_error, incremental_started_at, incremental_completed_at, \
                incremental_error, last_run_stats, updated_at \
         FROM sync_status \
         WHERE client_id = $1",
    )
    .bind(client_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
