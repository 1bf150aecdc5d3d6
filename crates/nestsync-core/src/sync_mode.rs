use serde::{Deserialize, Serialize};

/// Which flavour of pipeline run is executing.
///
/// Both modes run the same ordered stages; incremental runs look back over a
/// short window instead of the full history and keep their own status columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    Backfill,
    Incremental,
}

impl SyncMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Backfill => "backfill",
            SyncMode::Incremental => "incremental",
        }
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
