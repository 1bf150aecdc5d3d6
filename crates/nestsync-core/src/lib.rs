pub mod app_config;
pub mod config;
pub mod records;
pub mod sync_mode;
pub mod tenants;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{
    AccountInsight, CampaignInsight, DemographicSlots, MediaType, NormalizedCampaign,
    NormalizedChild, NormalizedPost, PostInsight, ProfileSnapshot,
};
pub use sync_mode::SyncMode;
pub use tenants::{load_tenants, parse_tenants, TenantEntry, TenantsFile};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read tenants file {path}: {source}")]
    TenantsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse tenants file: {0}")]
    TenantsFileParse(#[source] serde_yaml::Error),

    #[error("tenant validation failed: {0}")]
    Validation(String),
}
