//! Multi-tenant synchronization engine for Instagram and Meta Ads data.
//!
//! [`JobExecutor`] resolves a tenant's credentials once, then runs the
//! ordered [`Stage`] pipeline against the shared [`nestsync_meta::MetaClient`],
//! writing every record through the idempotent upserts in `nestsync_db`.

pub mod credentials;
pub mod demographics;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod normalize;
pub mod parse;
pub mod stage;

pub use credentials::{
    BrokerCredentialSource, CredentialSource, PlatformAccounts, TenantCredentials,
};
pub use error::{CredentialError, StageError, SyncError};
pub use executor::{ExecutorOptions, JobExecutor, SyncReport, SyncStats};
pub use stage::{Granularity, Stage, StageLedger};
