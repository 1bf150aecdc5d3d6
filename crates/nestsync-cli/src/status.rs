//! `sync status`: read-only view of a tenant's status ledger row.

use chrono::{DateTime, Utc};

fn fmt_ts(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(
        || "-".to_owned(),
        |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub(crate) async fn print_status(pool: &sqlx::PgPool, tenant_id: &str) -> anyhow::Result<()> {
    let Some(row) = nestsync_db::get_sync_status(pool, tenant_id).await? else {
        println!("no sync recorded for tenant {tenant_id}");
        return Ok(());
    };

    println!("tenant:                   {}", row.client_id);
    println!("backfill started:         {}", fmt_ts(row.backfill_started_at));
    println!("backfill completed:       {}", fmt_ts(row.backfill_completed_at));
    println!("backfill complete flag:   {}", row.backfill_completed);
    println!(
        "backfill error:           {}",
        row.backfill_error.as_deref().unwrap_or("-")
    );
    println!("incremental started:      {}", fmt_ts(row.incremental_started_at));
    println!("incremental completed:    {}", fmt_ts(row.incremental_completed_at));
    println!(
        "incremental error:        {}",
        row.incremental_error.as_deref().unwrap_or("-")
    );
    println!("updated:                  {}", fmt_ts(Some(row.updated_at)));

    if let Some(stats) = row.last_run_stats {
        println!("last run stats:");
        println!("{}", serde_json::to_string_pretty(&stats.0)?);
    }

    Ok(())
}
