use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One organization (bank) to harvest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationTarget {
    pub name: String,
    /// Localities searched for this organization. When absent, the file's
    /// `default_localities` apply; when both are empty a single general
    /// search is issued.
    #[serde(default)]
    pub localities: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetsFile {
    pub organizations: Vec<OrganizationTarget>,
    #[serde(default)]
    pub default_localities: Vec<String>,
    /// Appended to every search query, e.g. `"Morocco"`.
    #[serde(default)]
    pub country: Option<String>,
}

impl TargetsFile {
    /// Localities to search for `target`, falling back to the file defaults.
    #[must_use]
    pub fn localities_for<'a>(&'a self, target: &'a OrganizationTarget) -> &'a [String] {
        match &target.localities {
            Some(own) => own,
            None => &self.default_localities,
        }
    }

    /// Keep only the organizations whose name matches `name` (case-insensitive).
    #[must_use]
    pub fn filtered(mut self, name: &str) -> Self {
        let wanted = name.trim().to_lowercase();
        self.organizations
            .retain(|org| org.name.trim().to_lowercase() == wanted);
        self
    }
}

/// Load and validate the harvest targets from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_targets(path: &Path) -> Result<TargetsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TargetsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_targets(&content)
}

/// Parse and validate targets from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_targets(content: &str) -> Result<TargetsFile, ConfigError> {
    let targets: TargetsFile = serde_yaml::from_str(content)?;
    validate_targets(&targets)?;
    Ok(targets)
}

fn validate_targets(targets: &TargetsFile) -> Result<(), ConfigError> {
    if targets.organizations.is_empty() {
        return Err(ConfigError::Validation(
            "at least one organization is required".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();

    for org in &targets.organizations {
        if org.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "organization name must be non-empty".to_string(),
            ));
        }

        if !seen_names.insert(org.name.trim().to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate organization name: '{}'",
                org.name
            )));
        }

        let localities = org.localities.iter().flatten();
        if let Some(blank) = localities
            .chain(&targets.default_localities)
            .find(|l| l.trim().is_empty())
        {
            return Err(ConfigError::Validation(format!(
                "organization '{}' has a blank locality ({blank:?})",
                org.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "targets_test.rs"]
mod tests;
