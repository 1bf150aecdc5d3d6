mod status;
mod sync;


use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::sync::SyncCommands;

#[derive(Debug, Parser)]
#[command(name = "nestsync-cli")]
#[command(about = "Instagram and Meta Ads sync engine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Run or inspect tenant syncs
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check database connectivity
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("nestsync-cli: no command given (see --help)");
        return Ok(());
    };

    let config = nestsync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = nestsync_db::PoolConfig::from_app_config(&config);
    let pool = nestsync_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let applied = nestsync_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            nestsync_db::ping(&pool).await?;
            println!("database reachable");
        }
        Commands::Sync { command } => sync::run(&pool, &config, command).await?,
    }

    Ok(())
}
