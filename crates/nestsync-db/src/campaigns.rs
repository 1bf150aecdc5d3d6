//! Database operations for `meta_ad_campaigns` and `meta_campaign_insights`.

use chrono::NaiveDate;
use nestsync_core::{CampaignInsight, NormalizedCampaign};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `meta_campaign_insights` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CampaignInsightRow {
    pub campaign_id: String,
    pub date: NaiveDate,
    pub date_window: String,
    pub client_id: String,
    pub spend: i64,
    pub impressions: i64,
    pub reach: i64,
    pub clicks: i64,
    pub cpc: i64,
    pub cpm: i64,
    pub ctr: f64,
    pub conversions: i64,
}

// ---------------------------------------------------------------------------
// meta_ad_campaigns operations
// ---------------------------------------------------------------------------

/// Upserts a campaign keyed by its provider id, mutating it in place on every sync.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_campaign(
    pool: &PgPool,
    client_id: &str,
    campaign: &NormalizedCampaign,
) -> Result<u64, DbError> {
    let affected = sqlx::query(
        "INSERT INTO meta_ad_campaigns \
             (id, client_id, ad_account_id, name, objective, status, effective_status, \
              daily_budget, lifetime_budget, budget_remaining, start_time, stop_time, created_time) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
         ON CONFLICT (id) DO UPDATE SET \
             name             = EXCLUDED.name, \
             objective        = EXCLUDED.objective, \
             status           = EXCLUDED.status, \
             effective_status = EXCLUDED.effective_status, \
             daily_budget     = EXCLUDED.daily_budget, \
             lifetime_budget  = EXCLUDED.lifetime_budget, \
             budget_remaining = EXCLUDED.budget_remaining, \
             start_time       = EXCLUDED.start_time, \
             stop_time        = EXCLUDED.stop_time, \
             created_time     = EXCLUDED.created_time, \
             updated_at       = NOW()",
    )
    .bind(&campaign.id)
    .bind(client_id)
    .bind(&campaign.ad_account_id)
    .bind(&campaign.name)
    .bind(&campaign.objective)
    .bind(&campaign.status)
    .bind(&campaign.effective_status)
    .bind(campaign.daily_budget)
    .bind(campaign.lifetime_budget)
    .bind(campaign.budget_remaining)
    .bind(campaign.start_time)
    .bind(campaign.stop_time)
    .bind(campaign.created_time)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected)
}

/// Lists the ids of campaigns stored for a tenant's ad account.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_campaign_ids(
    pool: &PgPool,
    client_id: &str,
    ad_account_id: &str,
) -> Result<Vec<String>, DbError> {
    let ids = sqlx::query_scalar::<_, String>(
        "SELECT id FROM meta_ad_campaigns \
         WHERE client_id = $1 AND ad_account_id = $2 \
         ORDER BY id",
    )
    .bind(client_id)
    .bind(ad_account_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

// ---------------------------------------------------------------------------
// meta_campaign_insights operations
// ---------------------------------------------------------------------------

/// Upserts one campaign metric snapshot keyed by `(campaign_id, date, date_window)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_campaign_insight(
    pool: &PgPool,
    client_id: &str,
    insight: &CampaignInsight,
) -> Result<u64, DbError> {
    let affected = sqlx::query(
        "INSERT INTO meta_campaign_insights \
             (campaign_id, date, date_window, client_id, spend, impressions, reach, \
              clicks, cpc, cpm, ctr, conversions) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         ON CONFLICT (campaign_id, date, date_window) DO UPDATE SET \
             spend       = EXCLUDED.spend, \
             impressions = EXCLUDED.impressions, \
             reach       = EXCLUDED.reach, \
             clicks      = EXCLUDED.clicks, \
             cpc         = EXCLUDED.cpc, \
             cpm         = EXCLUDED.cpm, \
             ctr         = EXCLUDED.ctr, \
             conversions = EXCLUDED.conversions, \
             updated_at  = NOW()",
    )
    .bind(&insight.campaign_id)
    .bind(insight.date)
    .bind(&insight.date_window)
    .bind(client_id)
    .bind(insight.spend)
    .bind(insight.impressions)
    .bind(insight.reach)
    .bind(insight.clicks)
    .bind(insight.cpc)
    .bind(insight.cpm)
    .bind(insight.ctr)
    .bind(insight.conversions)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected)
}

/// Lists a campaign's stored snapshots ordered by date.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_campaign_insights(
    pool: &PgPool,
    campaign_id: &str,
) -> Result<Vec<CampaignInsightRow>, DbError> {
    let rows = sqlx::query_as::<_, CampaignInsightRow>(
        "SELECT campaign_id, date, date_window, client_id, spend, impressions, reach, \
                clicks, cpc, cpm, ctr, conversions \
         FROM meta_campaign_insights \
         WHERE campaign_id = $1 \
         ORDER BY date, date_window",
    )
    .bind(campaign_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
