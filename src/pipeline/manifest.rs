// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Pipeline manifest files
//!
//! Defines the schema for `.pipespec.yaml`. A manifest is replayed into a
//! [`PipelineSpecBuilder`] so hand-written pipelines get the same checks as
//! programmatic ones.

use serde::{Deserialize, Serialize};
use std::path::Path;

use tracing::debug;

use crate::errors::{PipespecError, PipespecResult};
use crate::pipeline::{Action, PermissionGrant, PipelineSpec, PipelineSpecBuilder};

/// Default manifest file name
pub const DEFAULT_MANIFEST: &str = ".pipespec.yaml";

/// Pipeline manifest from `.pipespec.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest version (for future compatibility)
    #[serde(default = "default_version")]
    pub version: String,

    /// Pipeline name
    pub name: String,

    /// Pipeline description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Stages in execution order
    pub stages: Vec<ManifestStage>,

    /// Grants recorded after the last stage
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grants: Vec<PermissionGrant>,
}

fn default_version() -> String {
    "1".to_string()
}

/// A stage entry in a manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestStage {
    /// Stage name
    pub name: String,

    /// Grants recorded just before this stage is added
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grants: Vec<PermissionGrant>,

    /// Actions of the stage
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Manifest {
    /// Load a manifest from a YAML file
    pub fn from_file(path: &Path) -> PipespecResult<Self> {
        if !path.exists() {
            return Err(PipespecError::ManifestNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| PipespecError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_yaml(&content)
    }

    /// Parse a manifest from a YAML string
    pub fn from_yaml(yaml: &str) -> PipespecResult<Self> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Serialize the manifest to YAML
    pub fn to_yaml(&self) -> PipespecResult<String> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Write the manifest to a file
    pub fn write(&self, path: &Path) -> PipespecResult<()> {
        let yaml = self.to_yaml()?;
        std::fs::write(path, yaml).map_err(|e| PipespecError::FileWriteError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Replay the manifest into a builder.
    ///
    /// Construction-time violations such as duplicate stage names are kept by
    /// the builder and surface from `build()`.
    pub fn to_builder(&self) -> PipelineSpecBuilder {
        let mut builder = PipelineSpecBuilder::new(self.name.clone());

        for stage in &self.stages {
            for grant in &stage.grants {
                builder.grant_permission(
                    grant.resource.clone(),
                    grant.principal.clone(),
                    grant.capability,
                );
            }

            if let Err(err) = builder.add_stage(stage.name.clone(), stage.actions.clone()) {
                debug!(stage = %stage.name, "{}", err);
            }
        }

        for grant in &self.grants {
            builder.grant_permission(
                grant.resource.clone(),
                grant.principal.clone(),
                grant.capability,
            );
        }

        builder
    }

    /// Build and validate the specification described by this manifest
    pub fn build(&self) -> PipespecResult<PipelineSpec> {
        self.to_builder().build()
    }

    /// Describe a built specification as a manifest
    pub fn from_spec(spec: &PipelineSpec, description: Option<String>) -> Self {
        let mut stages: Vec<ManifestStage> = spec
            .stages
            .iter()
            .map(|stage| ManifestStage {
                name: stage.name.clone(),
                grants: Vec::new(),
                actions: stage.actions.clone(),
            })
            .collect();
        let mut trailing = Vec::new();

        for scheduled in &spec.grants {
            match stages.get_mut(scheduled.position) {
                Some(stage) => stage.grants.push(scheduled.grant.clone()),
                None => trailing.push(scheduled.grant.clone()),
            }
        }

        Self {
            version: default_version(),
            name: spec.name.clone(),
            description,
            stages,
            grants: trailing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Capability;

    const DELIVERY: &str = r#"
version: "1"
name: "web-delivery"
stages:
  - name: Source
    actions:
      - name: CodeCommit
        kind:
          type: source
          repository: MyAppRepository
        output: sourceOutput
  - name: Build
    grants:
      - resource: app-registry
        principal: image-build-role
        capability: push
    actions:
      - name: ImageBuildAction
        kind:
          type: build
          build_spec: buildspec.deploy.yml
          privileged: true
        input: sourceOutput
        output: buildOutput
  - name: DeployToStaging
    grants:
      - resource: app-registry
        principal: staging-role
        capability: pull
    actions:
      - name: StagingEcsDeployAction
        kind:
          type: deploy
          service:
            name: staging-web
            execution_role: staging-role
          registry: app-registry
        input: buildOutput
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::from_yaml(DELIVERY).unwrap();
        assert_eq!(manifest.name, "web-delivery");
        assert_eq!(manifest.stages.len(), 3);
        assert_eq!(manifest.stages[2].grants[0].capability, Capability::Pull);
    }

    #[test]
    fn test_manifest_builds() {
        let spec = Manifest::from_yaml(DELIVERY).unwrap().build().unwrap();
        assert_eq!(spec.stage_names(), vec!["Source", "Build", "DeployToStaging"]);
        assert_eq!(spec.grants[1].position, 2);
    }

    #[test]
    fn test_manifest_without_grant_fails() {
        let yaml = DELIVERY.replace("capability: pull", "capability: push");
        let err = Manifest::from_yaml(&yaml).unwrap().build().unwrap_err();
        assert_eq!(err.violations()[0].kind(), "missing-permission");
    }

    #[test]
    fn test_from_spec_places_grants_on_stages() {
        let spec = Manifest::from_yaml(DELIVERY).unwrap().build().unwrap();
        let manifest = Manifest::from_spec(&spec, None);

        assert_eq!(manifest.stages[1].grants.len(), 1);
        assert_eq!(manifest.stages[2].grants[0].principal, "staging-role");
        assert!(manifest.grants.is_empty());
        assert_eq!(manifest.build().unwrap(), spec);
    }

    #[test]
    fn test_missing_file() {
        let err = Manifest::from_file(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, PipespecError::ManifestNotFound { .. }));
    }

    #[test]
    fn test_write_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_MANIFEST);

        Manifest::from_yaml(DELIVERY).unwrap().write(&path).unwrap();
        let reloaded = Manifest::from_file(&path).unwrap();
        assert_eq!(reloaded.stages.len(), 3);
    }
}
