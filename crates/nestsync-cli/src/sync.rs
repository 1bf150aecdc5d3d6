//! Sync command handlers for the CLI.
//!
//! Every selected tenant runs concurrently against one shared `MetaClient`,
//! so all runs draw from the same rate limiter. A failing tenant does not
//! stop the others; the command fails once all runs have settled.

use clap::{Args, Subcommand};
use futures::stream::{self, StreamExt};
use nestsync_core::{AppConfig, SyncMode, TenantsFile};
use nestsync_meta::{MetaClient, RateLimiter};
use nestsync_sync::{BrokerCredentialSource, ExecutorOptions, JobExecutor, SyncError, SyncReport};

/// Upper bound on tenant runs in flight at once.
const MAX_CONCURRENT_TENANTS: usize = 8;

/// Sub-commands available under `sync`.
#[derive(Debug, Subcommand)]
pub enum SyncCommands {
    /// Full historical sync; marks backfill complete on success
    Backfill {
        #[command(flatten)]
        target: TenantTarget,
    },
    /// Refresh recent posts, insights and campaigns
    Incremental {
        #[command(flatten)]
        target: TenantTarget,
    },
    /// Show the status ledger for one tenant
    Status {
        /// Tenant id
        #[arg(long)]
        tenant: String,
    },
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct TenantTarget {
    /// Tenant id to sync (repeat for several)
    #[arg(long = "tenant")]
    pub tenants: Vec<String>,
    /// Sync every enabled tenant in the roster file
    #[arg(long)]
    pub all: bool,
}

/// A tenant selected for a run, with the platform used for credential lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyncTarget {
    pub tenant_id: String,
    pub platform: String,
}

pub(crate) async fn run(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    command: SyncCommands,
) -> anyhow::Result<()> {
    match command {
        SyncCommands::Backfill { target } => {
            run_sync(pool, config, &target, SyncMode::Backfill).await
        }
        SyncCommands::Incremental { target } => {
            run_sync(pool, config, &target, SyncMode::Incremental).await
        }
        SyncCommands::Status { tenant } => crate::status::print_status(pool, &tenant).await,
    }
}

/// Explicit `--tenant` ids, deduplicated in the order given.
pub(crate) fn explicit_targets(ids: &[String], default_platform: &str) -> Vec<SyncTarget> {
    let mut targets: Vec<SyncTarget> = Vec::with_capacity(ids.len());
    for id in ids {
        if targets.iter().any(|t| &t.tenant_id == id) {
            continue;
        }
        targets.push(SyncTarget {
            tenant_id: id.clone(),
            platform: default_platform.to_owned(),
        });
    }
    targets
}

/// Enabled roster entries, with per-tenant platform overrides applied.
pub(crate) fn roster_targets(roster: &TenantsFile, default_platform: &str) -> Vec<SyncTarget> {
    roster
        .enabled()
        .map(|entry| SyncTarget {
            tenant_id: entry.id.clone(),
            platform: entry
                .platform
                .clone()
                .unwrap_or_else(|| default_platform.to_owned()),
        })
        .collect()
}

fn resolve_targets(target: &TenantTarget, config: &AppConfig) -> anyhow::Result<Vec<SyncTarget>> {
    if target.all {
        let roster = nestsync_core::load_tenants(&config.tenants_path)?;
        Ok(roster_targets(&roster, &config.platform))
    } else {
        Ok(explicit_targets(&target.tenants, &config.platform))
    }
}

async fn run_sync(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    target: &TenantTarget,
    mode: SyncMode,
) -> anyhow::Result<()> {
    let targets = resolve_targets(target, config)?;
    if targets.is_empty() {
        println!("no tenants selected; nothing to sync");
        return Ok(());
    }

    let limiter = RateLimiter::new(config.graph_requests_per_second, config.graph_max_in_flight);
    let client = MetaClient::with_base_url(
        &config.graph_base_url,
        config.request_timeout_secs,
        limiter,
    )
    .map_err(|e| anyhow::anyhow!("failed to build Graph client: {e}"))?
    .with_max_pages(config.max_pages)
    .with_page_size(config.page_size);
    let credentials = BrokerCredentialSource::new(
        &config.credential_broker_url,
        config.credential_broker_token.clone(),
        config.request_timeout_secs,
    )
    .map_err(|e| anyhow::anyhow!("failed to build credential source: {e}"))?;
    let base_options = ExecutorOptions::from_app_config(config);

    tracing::info!(tenants = targets.len(), %mode, "starting sync");

    let outcomes: Vec<(String, Result<SyncReport, SyncError>)> = stream::iter(targets)
        .map(|target| {
            let options = ExecutorOptions {
                platform: target.platform,
                ..base_options.clone()
            };
            let executor =
                JobExecutor::new(pool.clone(), client.clone(), credentials.clone(), options);
            async move {
                let result = executor.execute_with_mode(&target.tenant_id, mode).await;
                (target.tenant_id, result)
            }
        })
        .buffer_unordered(MAX_CONCURRENT_TENANTS)
        .collect()
        .await;

    let total = outcomes.len();
    let mut failed = 0usize;
    for (tenant_id, outcome) in outcomes {
        match outcome {
            Ok(report) => match serde_json::to_string(&report) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(tenant_id = %tenant_id, error = %e, "failed to render report"),
            },
            Err(err) => {
                failed += 1;
                eprintln!("error: {mode} sync failed for {tenant_id}: {err}");
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {total} tenant sync(s) failed");
    }
    Ok(())
}
