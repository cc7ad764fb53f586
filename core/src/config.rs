//! Configuration loading and validation for process groups
//!
//! This module parses a TOML configuration into `schema::GroupSpec` values,
//! applies defaults (via serde defaults on schema types), and performs
//! strict validation with field-path error messages.

use crate::{CoreError, Result};
use schema::GroupSpec;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Top-level TOML structure for group configuration
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupsFile {
    /// Groups that may be launched
    pub groups: Vec<GroupSpec>,
}

impl GroupsFile {
    /// Look up a group by id
    pub fn get(&self, id: &str) -> Option<&GroupSpec> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Validate the configuration and return `Result<()>` with field-path errors
    pub fn validate(&self) -> Result<()> {
        if self.groups.is_empty() {
            return Err(CoreError::ValidationError(
                "groups: must contain at least one group".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for (i, group) in self.groups.iter().enumerate() {
            if group.id.trim().is_empty() {
                return Err(CoreError::ValidationError(format!(
                    "groups[{}].id: cannot be empty",
                    i
                )));
            }
            if !seen.insert(group.id.as_str()) {
                return Err(CoreError::ValidationError(format!(
                    "groups[{}].id: duplicate id '{}'",
                    i, group.id
                )));
            }
            if group.command.trim().is_empty() {
                return Err(CoreError::ValidationError(format!(
                    "groups[{}].command: cannot be empty",
                    i
                )));
            }
            if group.environment.keys().any(|k| k.trim().is_empty() || k.contains('=')) {
                return Err(CoreError::ValidationError(format!(
                    "groups[{}].environment: keys cannot be empty or contain '='",
                    i
                )));
            }
            if let Some(dir) = &group.working_directory {
                if dir.trim().is_empty() {
                    return Err(CoreError::ValidationError(format!(
                        "groups[{}].workingDirectory: cannot be empty",
                        i
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Load groups from a TOML file path
pub fn load_groups_from_toml_path(path: impl AsRef<Path>) -> Result<GroupsFile> {
    let data = fs::read_to_string(&path).map_err(|e| {
        CoreError::ConfigurationError(format!("Failed to read config {:?}: {}", path.as_ref(), e))
    })?;
    load_groups_from_toml_str(&data)
}

/// Load groups from a TOML string
///
/// Accepts either a `[[groups]]` array or top-level tables keyed by group id:
///
/// ```toml
/// [build]
/// command = "make"
/// args = ["-j8"]
/// ```
pub fn load_groups_from_toml_str(input: &str) -> Result<GroupsFile> {
    let document: toml::Table = toml::from_str(input).map_err(parse_error)?;

    // A top-level `groups` key always means the array format
    if document.contains_key("groups") {
        let cfg: GroupsFile = toml::from_str(input).map_err(parse_error)?;
        cfg.validate()?;
        return Ok(cfg);
    }

    let mut groups = Vec::with_capacity(document.len());
    for (id, value) in document {
        let mut table = match value {
            toml::Value::Table(t) => t,
            other => {
                return Err(CoreError::ConfigurationError(format!(
                    "Group '{}' must be a table, found {}",
                    id,
                    other.type_str()
                )));
            }
        };
        table
            .entry("id".to_string())
            .or_insert(toml::Value::String(id.clone()));

        let spec: GroupSpec = table.try_into().map_err(|e| {
            CoreError::ConfigurationError(format!("Failed to parse group '{}': {}", id, e))
        })?;
        groups.push(spec);
    }

    let cfg = GroupsFile { groups };
    cfg.validate()?;
    Ok(cfg)
}

fn parse_error(e: toml::de::Error) -> CoreError {
    CoreError::ConfigurationError(format!("TOML parse error: {}", e))
}
