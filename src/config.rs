// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Delivery configuration
//!
//! Loaded from `pipespec.yaml` (or `.toml`) and passed explicitly into the
//! blueprint. Environment lookups such as `NOTIFY_EMAILS` happen at the CLI
//! edge and arrive here as plain values.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::errors::{PipespecError, PipespecResult};
use crate::resources::HealthCheck;

/// Recipient used when no notification address is configured
pub const DEFAULT_NOTIFY_EMAIL: &str = "email@example.com";

/// Project-level configuration file name
pub const CONFIG_FILE: &str = "pipespec.yaml";

/// Configuration of the reference delivery pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Configuration version
    #[serde(default = "default_version")]
    pub version: String,

    /// Name of the generated pipeline
    #[serde(default = "default_pipeline_name")]
    pub pipeline_name: String,

    /// Who to notify when manual approval is reached
    #[serde(default)]
    pub notify_emails: Vec<String>,

    #[serde(default)]
    pub repository: RepositoryConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    /// Container name passed to the image build as `CONTAINER_NAME`
    #[serde(default = "default_container_name")]
    pub container_name: String,

    #[serde(
        default = "EnvironmentConfig::staging",
        deserialize_with = "EnvironmentConfig::deserialize_staging"
    )]
    pub staging: EnvironmentConfig,

    #[serde(
        default = "EnvironmentConfig::production",
        deserialize_with = "EnvironmentConfig::deserialize_production"
    )]
    pub production: EnvironmentConfig,

    /// Health check applied to both environments
    #[serde(default)]
    pub health_check: HealthCheck,
}

fn default_version() -> String {
    "1".to_string()
}

fn default_pipeline_name() -> String {
    "CiCdPipeline".to_string()
}

fn default_container_name() -> String {
    "web".to_string()
}

/// Source repository settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default = "default_repository_name")]
    pub name: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    /// Group granted pull/push on the repository
    #[serde(default = "default_developer_group")]
    pub developer_group: String,
}

fn default_repository_name() -> String {
    "MyAppRepository".to_string()
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_developer_group() -> String {
    "Developers".to_string()
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            name: default_repository_name(),
            branch: default_branch(),
            developer_group: default_developer_group(),
        }
    }
}

/// Image registry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_name")]
    pub name: String,

    /// Repository URI; derived from the name when unset
    #[serde(default)]
    pub uri: Option<String>,
}

fn default_registry_name() -> String {
    "app-registry".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name: default_registry_name(),
            uri: None,
        }
    }
}

impl RegistryConfig {
    pub fn resolved_uri(&self) -> String {
        self.uri
            .clone()
            .unwrap_or_else(|| format!("registry.example.com/{}", self.name))
    }
}

/// Per-environment deployment settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Number of running instances
    pub desired_count: u32,

    /// Load balancer DNS name, if already known
    #[serde(default)]
    pub load_balancer_dns: Option<String>,
}

impl EnvironmentConfig {
    pub fn staging() -> Self {
        Self {
            desired_count: 1,
            load_balancer_dns: None,
        }
    }

    pub fn production() -> Self {
        Self {
            desired_count: 3,
            load_balancer_dns: None,
        }
    }

    fn deserialize_staging<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(EnvironmentOverride::deserialize(deserializer)?.apply(Self::staging()))
    }

    fn deserialize_production<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        Ok(EnvironmentOverride::deserialize(deserializer)?.apply(Self::production()))
    }
}

/// Environment settings as written in a file; missing fields keep the
/// environment's defaults
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnvironmentOverride {
    desired_count: Option<u32>,
    load_balancer_dns: Option<String>,
}

impl EnvironmentOverride {
    fn apply(self, mut base: EnvironmentConfig) -> EnvironmentConfig {
        if let Some(count) = self.desired_count {
            base.desired_count = count;
        }
        if self.load_balancer_dns.is_some() {
            base.load_balancer_dns = self.load_balancer_dns;
        }
        base
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            pipeline_name: default_pipeline_name(),
            notify_emails: Vec::new(),
            repository: RepositoryConfig::default(),
            registry: RegistryConfig::default(),
            container_name: default_container_name(),
            staging: EnvironmentConfig::staging(),
            production: EnvironmentConfig::production(),
            health_check: HealthCheck::default(),
        }
    }
}

impl DeliveryConfig {
    /// Load from a YAML or TOML file, chosen by extension
    pub fn load(path: &Path) -> PipespecResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PipespecError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Find and load the configuration.
    ///
    /// An explicit path wins, then `pipespec.yaml` in the project directory,
    /// then the user configuration directory. Defaults apply if none exist.
    pub fn discover(explicit: Option<&Path>, project_dir: &Path) -> PipespecResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let mut candidates = vec![project_dir.join(CONFIG_FILE)];
        if let Some(user_config) = user_config_path() {
            candidates.push(user_config);
        }

        for candidate in candidates {
            if candidate.exists() {
                debug!(path = %candidate.display(), "loading configuration");
                return Self::load(&candidate);
            }
        }

        debug!("no configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Override notification recipients from a comma-separated list.
    ///
    /// Empty or blank input leaves the configured recipients untouched.
    pub fn with_notify_override(mut self, recipients: Option<&str>) -> Self {
        let parsed: Vec<String> = recipients
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        if !parsed.is_empty() {
            self.notify_emails = parsed;
        }
        self
    }

    /// Recipients to notify, falling back to the placeholder address
    pub fn effective_notify_emails(&self) -> Vec<String> {
        if self.notify_emails.is_empty() {
            vec![DEFAULT_NOTIFY_EMAIL.to_string()]
        } else {
            self.notify_emails.clone()
        }
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> PipespecResult<()> {
        if self.container_name.trim().is_empty() {
            return Err(PipespecError::InvalidConfig {
                reason: "container_name is empty".into(),
                help: Some("The image build needs a container name, e.g. 'web'".into()),
            });
        }

        if self.production.desired_count == 0 {
            return Err(PipespecError::InvalidConfig {
                reason: "production desired_count is 0".into(),
                help: Some("Production needs at least one running instance".into()),
            });
        }

        self.health_check.validate()
    }

    /// Save to a YAML file
    pub fn save(&self, path: &Path) -> PipespecResult<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content).map_err(|e| PipespecError::FileWriteError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }
}

/// Configuration file in the user's config directory
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "pipespec").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
