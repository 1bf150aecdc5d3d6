use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One tenant entry from the roster file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantEntry {
    pub id: String,
    /// Overrides the configured default platform for this tenant.
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct TenantsFile {
    pub tenants: Vec<TenantEntry>,
}

impl TenantsFile {
    /// Tenants that should be picked up by `--all` runs.
    pub fn enabled(&self) -> impl Iterator<Item = &TenantEntry> {
        self.tenants.iter().filter(|t| t.enabled)
    }
}

/// Load and validate the tenant roster from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_tenants(path: &Path) -> Result<TenantsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TenantsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_tenants(&content)
}

/// Parse and validate a tenant roster from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_tenants(content: &str) -> Result<TenantsFile, ConfigError> {
    let file: TenantsFile = serde_yaml::from_str(content).map_err(ConfigError::TenantsFileParse)?;
    validate_tenants(&file)?;
    Ok(file)
}

fn validate_tenants(file: &TenantsFile) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for tenant in &file.tenants {
        let id = tenant.id.trim();
        if id.is_empty() {
            return Err(ConfigError::Validation(
                "tenant id must be non-empty".to_string(),
            ));
        }
        if !seen.insert(id.to_string()) {
            return Err(ConfigError::Validation(format!(
                "duplicate tenant id: '{id}'"
            )));
        }
    }

    Ok(())
}
