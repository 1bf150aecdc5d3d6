use nestsync_db::DbError;
use nestsync_meta::MetaError;
use thiserror::Error;

use crate::stage::Stage;

/// Failure looking up a tenant's platform credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The broker has no usable token for this tenant.
    #[error("no credentials for tenant {tenant_id}: {reason}")]
    Unavailable { tenant_id: String, reason: String },

    #[error("credential broker HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("credential broker returned HTTP {status}: {body}")]
    Broker { status: u16, body: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid credential broker URL \"{url}\": {reason}")]
    InvalidBrokerUrl { url: String, reason: String },
}

/// Why a single stage could not complete.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Upstream(#[from] MetaError),

    #[error("persistence error: {0}")]
    Persistence(#[from] DbError),

    #[error("credentials carry no {field}")]
    MissingAccount { field: &'static str },

    #[error("stage {stage} requires {requires}, which did not complete")]
    PrerequisiteMissing { stage: Stage, requires: Stage },
}

/// Terminal outcome of a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("credentials unavailable for tenant {tenant_id}: {reason}")]
    CredentialUnavailable { tenant_id: String, reason: String },

    #[error("sync failed at stage {stage}: {cause}")]
    BackfillFailed {
        stage: Stage,
        #[source]
        cause: StageError,
    },

    /// The status ledger itself could not be written.
    #[error("failed to record sync status: {0}")]
    StatusLedger(#[source] DbError),
}

impl SyncError {
    /// The stage the run died in, if it got that far.
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            SyncError::BackfillFailed { stage, .. } => Some(*stage),
            SyncError::CredentialUnavailable { .. } | SyncError::StatusLedger(_) => None,
        }
    }
}
