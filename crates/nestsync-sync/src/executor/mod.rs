//! The per-tenant sync run.
//!
//! A run is bracketed by two durable writes to the status ledger
//! (`mark_started`, then `mark_completed` or `mark_failed`). Between them the
//! stages of [`Stage::PIPELINE`] execute strictly in order.

mod stages;

use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use nestsync_core::{AppConfig, SyncMode};
use nestsync_meta::MetaClient;
use serde::Serialize;
use sqlx::PgPool;
use tracing::Instrument;
use uuid::Uuid;

use crate::credentials::{CredentialSource, PlatformAccounts};
use crate::error::{StageError, SyncError};
use crate::stage::{Stage, StageLedger};

/// Campaign date window used by incremental runs.
pub const INCREMENTAL_CAMPAIGN_WINDOW: &str = "last_7d";

const DEFAULT_PLATFORM: &str = "meta";
const DEFAULT_INSIGHT_WORKERS: usize = 4;
const DEFAULT_ACCOUNT_INSIGHT_DAYS: u32 = 30;
const DEFAULT_INCREMENTAL_DAYS: u32 = 3;
const DEFAULT_CAMPAIGN_WINDOW: &str = "last_90d";

#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Platform name sent to the credential source.
    pub platform: String,
    /// Concurrent per-row calls inside a fine-grained stage.
    pub insight_workers: usize,
    pub account_insight_days: u32,
    pub incremental_days: u32,
    /// Date preset for campaign insights on backfill runs.
    pub campaign_window: String,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            platform: DEFAULT_PLATFORM.to_owned(),
            insight_workers: DEFAULT_INSIGHT_WORKERS,
            account_insight_days: DEFAULT_ACCOUNT_INSIGHT_DAYS,
            incremental_days: DEFAULT_INCREMENTAL_DAYS,
            campaign_window: DEFAULT_CAMPAIGN_WINDOW.to_owned(),
        }
    }
}

impl ExecutorOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            platform: config.platform.clone(),
            insight_workers: config.insight_workers.max(1),
            account_insight_days: config.account_insight_days,
            incremental_days: config.incremental_days,
            campaign_window: config.campaign_window.clone(),
        }
    }
}

/// Per-stage counts for one run. Counts are rows affected and exist for
/// observability only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub profiles: u64,
    pub follower_samples: u64,
    pub posts: u64,
    /// The media list hit the page cap.
    pub posts_truncated: bool,
    /// Enrichment markers newly created by this run.
    pub enrichment_jobs: u64,
    pub carousel_children: u64,
    pub post_insights: u64,
    pub account_insights: u64,
    pub demographics: u64,
    pub campaigns: u64,
    pub campaign_insights: u64,
    /// Fine-grained rows skipped after an upstream error.
    pub skipped_rows: u64,
    /// Filled from the stage ledger once the pipeline finishes.
    pub skipped_stages: Vec<Stage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub tenant_id: String,
    pub mode: SyncMode,
    pub success: bool,
    pub stats: SyncStats,
    pub duration_ms: u64,
}

/// Everything a stage needs to know about the run it belongs to.
pub(crate) struct RunContext<'a> {
    pub tenant_id: &'a str,
    pub mode: SyncMode,
    pub access_token: String,
    pub accounts: PlatformAccounts,
    pub now: DateTime<Utc>,
    pub today: NaiveDate,
    /// Set by the profile stage.
    pub follower_count: Option<i64>,
}

impl RunContext<'_> {
    pub(crate) fn ig_account(&self) -> Result<&str, StageError> {
        self.accounts
            .instagram_business_account_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(StageError::MissingAccount {
                field: "instagram_business_account_id",
            })
    }

    pub(crate) fn ad_account(&self) -> Option<&str> {
        self.accounts
            .ad_account_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }

    /// Lower bound for "recent" data, `None` on backfill runs.
    pub(crate) fn incremental_since(&self, days: u32) -> Option<DateTime<Utc>> {
        match self.mode {
            SyncMode::Backfill => None,
            SyncMode::Incremental => Some(self.now - chrono::Duration::days(i64::from(days))),
        }
    }
}

/// Runs sync jobs for tenants. One executor (and one [`MetaClient`]) serves
/// any number of concurrent runs.
pub struct JobExecutor<C> {
    pool: PgPool,
    client: MetaClient,
    credentials: C,
    options: ExecutorOptions,
}

impl<C: CredentialSource> JobExecutor<C> {
    #[must_use]
    pub fn new(pool: PgPool, client: MetaClient, credentials: C, options: ExecutorOptions) -> Self {
        Self {
            pool,
            client,
            credentials,
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// Runs a full backfill for `tenant_id`.
    ///
    /// # Errors
    ///
    /// See [`Self::execute_with_mode`].
    pub async fn execute(&self, tenant_id: &str) -> Result<SyncReport, SyncError> {
        self.execute_with_mode(tenant_id, SyncMode::Backfill).await
    }

    /// Runs the pipeline for `tenant_id` in the given mode.
    ///
    /// # Errors
    ///
    /// - [`SyncError::CredentialUnavailable`] if credentials cannot be resolved.
    /// - [`SyncError::BackfillFailed`] if a stage fails fatally.
    /// - [`SyncError::StatusLedger`] if the start or completion marker
    ///   cannot be written.
    ///
    /// Every failure after `mark_started` is also recorded on the tenant's
    /// status row.
    pub async fn execute_with_mode(
        &self,
        tenant_id: &str,
        mode: SyncMode,
    ) -> Result<SyncReport, SyncError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("sync_run", %run_id, tenant_id, mode = %mode);
        self.run(run_id, tenant_id, mode).instrument(span).await
    }

    async fn run(
        &self,
        run_id: Uuid,
        tenant_id: &str,
        mode: SyncMode,
    ) -> Result<SyncReport, SyncError> {
        let started = Instant::now();

        nestsync_db::mark_started(&self.pool, tenant_id, mode, Utc::now())
            .await
            .map_err(SyncError::StatusLedger)?;
        tracing::info!("sync run started");

        let mut stats = SyncStats::default();
        if let Err(err) = self.run_pipeline(tenant_id, mode, &mut stats).await {
            tracing::error!(error = %err, stage = ?err.stage(), "sync run failed");
            self.fail_run_best_effort(tenant_id, mode, &err).await;
            return Err(err);
        }

        let stats_json = serde_json::to_value(&stats).unwrap_or_default();
        nestsync_db::mark_completed(&self.pool, tenant_id, mode, Utc::now(), &stats_json)
            .await
            .map_err(SyncError::StatusLedger)?;

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            duration_ms,
            posts = stats.posts,
            post_insights = stats.post_insights,
            skipped_rows = stats.skipped_rows,
            "sync run completed"
        );

        Ok(SyncReport {
            run_id,
            tenant_id: tenant_id.to_owned(),
            mode,
            success: true,
            stats,
            duration_ms,
        })
    }

    async fn run_pipeline(
        &self,
        tenant_id: &str,
        mode: SyncMode,
        stats: &mut SyncStats,
    ) -> Result<(), SyncError> {
        // Resolved once; every call in this run reuses the token.
        let credentials = self
            .credentials
            .resolve(tenant_id, &self.options.platform)
            .await
            .map_err(|e| SyncError::CredentialUnavailable {
                tenant_id: tenant_id.to_owned(),
                reason: e.to_string(),
            })?;

        if credentials.token_expired {
            tracing::warn!("access token is reported expired; continuing until upstream rejects it");
        }

        let now = Utc::now();
        let mut ctx = RunContext {
            tenant_id,
            mode,
            access_token: credentials.access_token,
            accounts: credentials.accounts,
            now,
            today: now.date_naive(),
            follower_count: None,
        };

        if ctx.ad_account().is_none() {
            tracing::warn!("no ad_account_id in credentials; campaign stages will be skipped");
        }

        let mut ledger = StageLedger::new();
        for stage in Stage::PIPELINE {
            if stage.needs_ad_account() && ctx.ad_account().is_none() {
                ledger.skip(stage);
                continue;
            }

            ledger
                .check(stage)
                .map_err(|cause| SyncError::BackfillFailed { stage, cause })?;

            tracing::debug!(%stage, "stage started");
            self.run_stage(stage, &mut ctx, stats)
                .await
                .map_err(|cause| SyncError::BackfillFailed { stage, cause })?;
            ledger.complete(stage);
        }

        stats.skipped_stages = ledger.skipped().to_vec();
        Ok(())
    }

    async fn run_stage(
        &self,
        stage: Stage,
        ctx: &mut RunContext<'_>,
        stats: &mut SyncStats,
    ) -> Result<(), StageError> {
        let env = stages::StageEnv {
            pool: &self.pool,
            client: &self.client,
            options: &self.options,
        };

        match stage {
            Stage::Profile => stages::profile(&env, ctx, stats).await,
            Stage::Posts => stages::posts(&env, ctx, stats).await,
            Stage::CarouselChildren => stages::carousel_children(&env, ctx, stats).await,
            Stage::PostInsights => stages::post_insights(&env, ctx, stats).await,
            Stage::AccountInsights => stages::account_insights(&env, ctx, stats).await,
            Stage::Demographics => stages::demographics(&env, ctx, stats).await,
            Stage::Campaigns => stages::campaigns(&env, ctx, stats).await,
            Stage::CampaignInsights => stages::campaign_insights(&env, ctx, stats).await,
        }
    }

    /// Records a failed run, logging rather than returning a ledger error so
    /// the original failure reaches the caller.
    async fn fail_run_best_effort(&self, tenant_id: &str, mode: SyncMode, err: &SyncError) {
        if let Err(mark_err) =
            nestsync_db::mark_failed(&self.pool, tenant_id, mode, &err.to_string()).await
        {
            tracing::error!(
                error = %mark_err,
                "failed to record sync failure in status ledger"
            );
        }
    }
}
