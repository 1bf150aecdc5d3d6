use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub tenants_path: PathBuf,
    pub credential_broker_url: String,
    pub credential_broker_token: Option<String>,
    /// Platform name sent to the credential broker (default `"meta"`).
    pub platform: String,
    pub graph_base_url: String,
    /// Ceiling for the shared Graph API limiter, across all tenants.
    pub graph_requests_per_second: u32,
    pub graph_max_in_flight: usize,
    pub request_timeout_secs: u64,
    pub max_pages: usize,
    pub page_size: u32,
    pub insight_workers: usize,
    pub account_insight_days: u32,
    pub incremental_days: u32,
    pub campaign_window: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("tenants_path", &self.tenants_path)
            .field("database_url", &"[redacted]")
            .field("credential_broker_url", &self.credential_broker_url)
            .field(
                "credential_broker_token",
                &self.credential_broker_token.as_ref().map(|_| "[redacted]"),
            )
            .field("platform", &self.platform)
            .field("graph_base_url", &self.graph_base_url)
            .field("graph_requests_per_second", &self.graph_requests_per_second)
            .field("graph_max_in_flight", &self.graph_max_in_flight)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_pages", &self.max_pages)
            .field("page_size", &self.page_size)
            .field("insight_workers", &self.insight_workers)
            .field("account_insight_days", &self.account_insight_days)
            .field("incremental_days", &self.incremental_days)
            .field("campaign_window", &self.campaign_window)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
