//! Stage bodies.
//!
//! Coarse stages propagate every error. Fine-grained stages go through
//! [`for_each_row`], which skips rows whose upstream call fails and stops on
//! anything else.

use std::future::Future;

use chrono::Duration;
use futures::stream::{self, StreamExt};
use nestsync_core::SyncMode;
use nestsync_db::{PostRef, POST_CONTENT_TYPE};
use nestsync_meta::MetaClient;
use sqlx::PgPool;

use super::{ExecutorOptions, RunContext, SyncStats, INCREMENTAL_CAMPAIGN_WINDOW};
use crate::demographics::route_demographics;
use crate::error::StageError;
use crate::metrics::{account_insights_from, metrics_for, post_insight_from};
use crate::normalize::{
    normalize_campaign, normalize_campaign_insight, normalize_child, normalize_post,
    normalize_profile,
};
use crate::stage::Stage;

pub(super) struct StageEnv<'a> {
    pub pool: &'a PgPool,
    pub client: &'a MetaClient,
    pub options: &'a ExecutorOptions,
}

#[derive(Debug, Default)]
struct RowTally {
    written: u64,
    skipped: u64,
}

/// Runs `op` for every item with at most `workers` in flight. Upstream
/// errors are logged with the row id and skipped; any other error is
/// returned once the in-flight rows settle.
async fn for_each_row<'a, T, F, Fut>(
    stage: Stage,
    items: &'a [T],
    workers: usize,
    row_id: fn(&T) -> &str,
    op: F,
) -> Result<RowTally, StageError>
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = Result<u64, StageError>> + 'a,
{
    let results: Vec<(&T, Result<u64, StageError>)> = stream::iter(items)
        .map(|item| {
            let fut = op(item);
            async move { (item, fut.await) }
        })
        .buffer_unordered(workers.max(1))
        .collect()
        .await;

    let mut tally = RowTally::default();
    for (item, result) in results {
        match result {
            Ok(written) => tally.written += written,
            Err(StageError::Upstream(err)) => {
                tracing::warn!(
                    %stage,
                    row_id = row_id(item),
                    error = %err,
                    "skipping row after upstream error"
                );
                tally.skipped += 1;
            }
            Err(other) => return Err(other),
        }
    }

    Ok(tally)
}

fn post_id(post: &PostRef) -> &str {
    &post.id
}

// ---------------------------------------------------------------------------
// Coarse stages
// ---------------------------------------------------------------------------

pub(super) async fn profile(
    env: &StageEnv<'_>,
    ctx: &mut RunContext<'_>,
    stats: &mut SyncStats,
) -> Result<(), StageError> {
    let ig_account = ctx.ig_account()?;
    let raw = env.client.fetch_profile(&ctx.access_token, ig_account).await?;
    let snapshot = normalize_profile(ig_account, &raw);

    stats.profiles += nestsync_db::upsert_profile(env.pool, ctx.tenant_id, &snapshot).await?;
    stats.follower_samples += nestsync_db::insert_follower_sample(
        env.pool,
        ctx.tenant_id,
        &snapshot.account_id,
        ctx.today,
        snapshot.followers_count,
    )
    .await?;

    ctx.follower_count = Some(snapshot.followers_count);
    tracing::info!(followers = snapshot.followers_count, "profile synced");
    Ok(())
}

pub(super) async fn posts(
    env: &StageEnv<'_>,
    ctx: &mut RunContext<'_>,
    stats: &mut SyncStats,
) -> Result<(), StageError> {
    let ig_account = ctx.ig_account()?;
    let since = ctx.incremental_since(env.options.incremental_days);
    let listing = env
        .client
        .fetch_media(&ctx.access_token, ig_account, since.map(|t| t.timestamp()))
        .await?;

    stats.posts_truncated = listing.truncated;
    for media in &listing.items {
        let post = normalize_post(ig_account, media);
        stats.posts += nestsync_db::upsert_post(env.pool, ctx.tenant_id, &post).await?;
        stats.enrichment_jobs += nestsync_db::enqueue_enrichment_job(
            env.pool,
            ctx.tenant_id,
            &post.id,
            POST_CONTENT_TYPE,
        )
        .await?;
    }

    tracing::info!(
        posts = stats.posts,
        pages = listing.pages_fetched,
        truncated = listing.truncated,
        new_enrichment_jobs = stats.enrichment_jobs,
        "posts synced"
    );
    Ok(())
}

pub(super) async fn account_insights(
    env: &StageEnv<'_>,
    ctx: &mut RunContext<'_>,
    stats: &mut SyncStats,
) -> Result<(), StageError> {
    let ig_account = ctx.ig_account()?;
    let follower_count = ctx.follower_count.ok_or(StageError::PrerequisiteMissing {
        stage: Stage::AccountInsights,
        requires: Stage::Profile,
    })?;

    let days = match ctx.mode {
        SyncMode::Backfill => env.options.account_insight_days,
        SyncMode::Incremental => env.options.incremental_days,
    };
    let since = ctx.now - Duration::days(i64::from(days));

    let data = env
        .client
        .fetch_account_insights(
            &ctx.access_token,
            ig_account,
            since.timestamp(),
            ctx.now.timestamp(),
        )
        .await?;

    for row in account_insights_from(ig_account, &data, ctx.today, follower_count) {
        stats.account_insights +=
            nestsync_db::upsert_account_insight(env.pool, ctx.tenant_id, &row).await?;
    }

    tracing::info!(rows = stats.account_insights, "account insights synced");
    Ok(())
}

pub(super) async fn demographics(
    env: &StageEnv<'_>,
    ctx: &mut RunContext<'_>,
    stats: &mut SyncStats,
) -> Result<(), StageError> {
    let ig_account = ctx.ig_account()?;
    let data = env
        .client
        .fetch_demographics(&ctx.access_token, ig_account)
        .await?;

    let slots = route_demographics(&data);
    if slots.is_empty() {
        tracing::info!("no demographic breakdowns returned");
        return Ok(());
    }

    stats.demographics += nestsync_db::upsert_demographics(
        env.pool,
        ctx.tenant_id,
        ig_account,
        ctx.today,
        &slots,
    )
    .await?;
    Ok(())
}

pub(super) async fn campaigns(
    env: &StageEnv<'_>,
    ctx: &mut RunContext<'_>,
    stats: &mut SyncStats,
) -> Result<(), StageError> {
    let Some(ad_account) = ctx.ad_account() else {
        return Ok(());
    };

    let listing = env
        .client
        .fetch_campaigns(&ctx.access_token, ad_account)
        .await?;

    for raw in &listing.items {
        let campaign = normalize_campaign(ad_account, raw);
        stats.campaigns += nestsync_db::upsert_campaign(env.pool, ctx.tenant_id, &campaign).await?;
    }

    tracing::info!(campaigns = stats.campaigns, "campaigns synced");
    Ok(())
}

// ---------------------------------------------------------------------------
// Fine-grained stages
// ---------------------------------------------------------------------------

pub(super) async fn carousel_children(
    env: &StageEnv<'_>,
    ctx: &mut RunContext<'_>,
    stats: &mut SyncStats,
) -> Result<(), StageError> {
    let since = ctx.incremental_since(env.options.incremental_days);
    let carousels = nestsync_db::list_carousel_post_ids(env.pool, ctx.tenant_id, since).await?;
    let ctx = &*ctx;

    let tally = for_each_row(
        Stage::CarouselChildren,
        &carousels,
        env.options.insight_workers,
        String::as_str,
        |parent_id| async move {
            let children = env
                .client
                .fetch_children(&ctx.access_token, parent_id)
                .await?;
            let mut written = 0;
            for raw in &children {
                let child = normalize_child(parent_id, raw);
                written += nestsync_db::upsert_post_child(env.pool, ctx.tenant_id, &child).await?;
            }
            Ok::<u64, StageError>(written)
        },
    )
    .await?;

    stats.carousel_children += tally.written;
    stats.skipped_rows += tally.skipped;
    tracing::info!(
        carousels = carousels.len(),
        children = tally.written,
        skipped = tally.skipped,
        "carousel children synced"
    );
    Ok(())
}

pub(super) async fn post_insights(
    env: &StageEnv<'_>,
    ctx: &mut RunContext<'_>,
    stats: &mut SyncStats,
) -> Result<(), StageError> {
    let since = ctx.incremental_since(env.options.incremental_days);
    let posts = nestsync_db::list_posts_for_insights(env.pool, ctx.tenant_id, since).await?;
    let ctx = &*ctx;

    let tally = for_each_row(
        Stage::PostInsights,
        &posts,
        env.options.insight_workers,
        post_id,
        |post| async move {
            let media_type = post.media_type();
            let data = env
                .client
                .fetch_media_insights(&ctx.access_token, &post.id, metrics_for(media_type))
                .await?;
            let insight = post_insight_from(&post.id, media_type, ctx.today, &data);
            let written = nestsync_db::upsert_post_insight(env.pool, ctx.tenant_id, &insight).await?;
            Ok::<u64, StageError>(written)
        },
    )
    .await?;

    stats.post_insights += tally.written;
    stats.skipped_rows += tally.skipped;
    tracing::info!(
        posts = posts.len(),
        written = tally.written,
        skipped = tally.skipped,
        "post insights synced"
    );
    Ok(())
}

pub(super) async fn campaign_insights(
    env: &StageEnv<'_>,
    ctx: &mut RunContext<'_>,
    stats: &mut SyncStats,
) -> Result<(), StageError> {
    let Some(ad_account) = ctx.ad_account() else {
        return Ok(());
    };
    let campaign_ids =
        nestsync_db::list_campaign_ids(env.pool, ctx.tenant_id, ad_account).await?;
    let window = match ctx.mode {
        SyncMode::Backfill => env.options.campaign_window.as_str(),
        SyncMode::Incremental => INCREMENTAL_CAMPAIGN_WINDOW,
    };
    let ctx = &*ctx;

    let tally = for_each_row(
        Stage::CampaignInsights,
        &campaign_ids,
        env.options.insight_workers,
        String::as_str,
        |campaign_id| async move {
            let listing = env
                .client
                .fetch_campaign_insights(&ctx.access_token, campaign_id, window)
                .await?;
            let mut written = 0;
            for raw in &listing.items {
                let Some(row) = normalize_campaign_insight(campaign_id, window, raw) else {
                    tracing::debug!(campaign_id = %campaign_id, "dropping insight row without date_start");
                    continue;
                };
                written +=
                    nestsync_db::upsert_campaign_insight(env.pool, ctx.tenant_id, &row).await?;
            }
            Ok::<u64, StageError>(written)
        },
    )
    .await?;

    stats.campaign_insights += tally.written;
    stats.skipped_rows += tally.skipped;
    tracing::info!(
        campaigns = campaign_ids.len(),
        written = tally.written,
        skipped = tally.skipped,
        %window,
        "campaign insights synced"
    );
    Ok(())
}
