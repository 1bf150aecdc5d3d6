use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` instead of `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let database_url = require("DATABASE_URL")?;
    let credential_broker_url = require("NESTSYNC_CREDENTIAL_BROKER_URL")?;
    let credential_broker_token = lookup("NESTSYNC_CREDENTIAL_BROKER_TOKEN").ok();

    let env = parse_environment(&or_default("NESTSYNC_ENV", "development"));
    let log_level = or_default("NESTSYNC_LOG_LEVEL", "info");
    let tenants_path = PathBuf::from(or_default("NESTSYNC_TENANTS_PATH", "./config/tenants.yaml"));

    let platform = or_default("NESTSYNC_PLATFORM", "meta");
    let graph_base_url = or_default(
        "NESTSYNC_GRAPH_BASE_URL",
        "https://graph.facebook.com/v21.0",
    );
    let graph_requests_per_second = parse_u32("NESTSYNC_GRAPH_REQUESTS_PER_SECOND", "20")?;
    let graph_max_in_flight = parse_usize("NESTSYNC_GRAPH_MAX_IN_FLIGHT", "4")?;
    let request_timeout_secs = parse_u64("NESTSYNC_REQUEST_TIMEOUT_SECS", "30")?;
    let max_pages = parse_usize("NESTSYNC_MAX_PAGES", "50")?;
    let page_size = parse_u32("NESTSYNC_PAGE_SIZE", "50")?;
    let insight_workers = parse_usize("NESTSYNC_INSIGHT_WORKERS", "4")?;
    let account_insight_days = parse_u32("NESTSYNC_ACCOUNT_INSIGHT_DAYS", "30")?;
    let incremental_days = parse_u32("NESTSYNC_INCREMENTAL_DAYS", "3")?;
    let campaign_window = or_default("NESTSYNC_CAMPAIGN_WINDOW", "last_90d");

    if graph_requests_per_second == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "NESTSYNC_GRAPH_REQUESTS_PER_SECOND".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    let db_max_connections = parse_u32("NESTSYNC_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("NESTSYNC_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("NESTSYNC_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        tenants_path,
        credential_broker_url,
        credential_broker_token,
        platform,
        graph_base_url,
        graph_requests_per_second,
        graph_max_in_flight,
        request_timeout_secs,
        max_pages,
        page_size,
        insight_workers,
        account_insight_days,
        incremental_days,
        campaign_window,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
