// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Pipeline definition structures
//!
//! The immutable, ordered specification produced by
//! [`PipelineSpecBuilder::build`](super::PipelineSpecBuilder::build) and the
//! action, artifact and permission types it is made of.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::PipespecResult;
use crate::resources::HealthCheck;

/// A validated, ordered deployment pipeline specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// Pipeline name
    pub name: String,

    /// Stages in execution order
    pub stages: Vec<Stage>,

    /// Artifacts in declaration order
    #[serde(default)]
    pub artifacts: Vec<Artifact>,

    /// Permission grants with the position they were recorded at
    #[serde(default)]
    pub grants: Vec<ScheduledGrant>,
}

impl PipelineSpec {
    /// Parse a specification from YAML
    pub fn from_yaml(yaml: &str) -> PipespecResult<Self> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Serialize the specification to YAML
    pub fn to_yaml(&self) -> PipespecResult<String> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Serialize the specification to pretty JSON
    pub fn to_json(&self) -> PipespecResult<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    /// Get a stage by name
    pub fn get_stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Get all stage names in order
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Look up an artifact by name
    pub fn artifact(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.name == name)
    }

    /// Stages that suspend progression until an approval arrives
    pub fn approval_gates(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter().filter(|s| s.is_manual_approval())
    }

    /// Content fingerprint of the specification.
    ///
    /// BLAKE3 over the canonical JSON form, so two specs with the same
    /// stages, actions and grants hand off with the same receipt.
    pub fn fingerprint(&self) -> PipespecResult<String> {
        let canonical = serde_json::to_vec(self)?;
        Ok(blake3::hash(&canonical).to_hex().to_string())
    }
}

/// A single pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Stage name (unique within the pipeline)
    pub name: String,

    /// Zero-based execution position
    pub position: usize,

    /// Actions executed together in this stage
    pub actions: Vec<Action>,
}

impl Stage {
    /// A stage whose single action is a manual approval
    pub fn is_manual_approval(&self) -> bool {
        matches!(self.actions.as_slice(), [action] if action.is_manual_approval())
    }

    /// Artifacts this stage consumes
    pub fn inputs(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().filter_map(|a| a.input.as_deref())
    }

    /// Artifacts this stage produces
    pub fn outputs(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().filter_map(|a| a.output.as_deref())
    }
}

/// A named unit of work inside a stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Action name (unique within its stage)
    pub name: String,

    /// What the action does
    pub kind: ActionKind,

    /// Artifact consumed by this action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    /// Artifact produced by this action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Action {
    /// Create an action with no artifacts
    pub fn new(name: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            input: None,
            output: None,
        }
    }

    /// Consume an artifact
    pub fn with_input(mut self, artifact: impl Into<String>) -> Self {
        self.input = Some(artifact.into());
        self
    }

    /// Produce an artifact
    pub fn with_output(mut self, artifact: impl Into<String>) -> Self {
        self.output = Some(artifact.into());
        self
    }

    /// Short name of the action kind
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ActionKind::Source { .. } => "source",
            ActionKind::Build { .. } => "build",
            ActionKind::Test { .. } => "test",
            ActionKind::Deploy { .. } => "deploy",
            ActionKind::Approval { .. } => "approval",
        }
    }

    pub fn is_manual_approval(&self) -> bool {
        matches!(self.kind, ActionKind::Approval { .. })
    }

    /// The external resource this action targets, if any
    pub fn target(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::Source { repository, .. } => Some(repository),
            ActionKind::Deploy { service, .. } => Some(&service.name),
            ActionKind::Build { .. } | ActionKind::Test { .. } | ActionKind::Approval { .. } => {
                None
            }
        }
    }

    /// Permission the action needs before it may be scheduled
    pub fn required_grant(&self) -> Option<PermissionGrant> {
        match &self.kind {
            ActionKind::Deploy {
                service,
                registry: Some(registry),
            } => Some(PermissionGrant::new(
                registry.clone(),
                service.execution_role.clone(),
                Capability::Pull,
            )),
            _ => None,
        }
    }
}

/// Action kind with its kind-specific settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActionKind {
    /// Fetch source from a repository
    Source {
        /// Repository name
        repository: String,

        /// Branch to track
        #[serde(default = "default_branch")]
        branch: String,
    },

    /// Build with a build specification file
    Build {
        /// Build specification file inside the source
        build_spec: String,

        /// Build container image
        #[serde(default = "default_build_image")]
        image: String,

        /// Run the build container privileged (needed for image builds)
        #[serde(default)]
        privileged: bool,

        /// Environment variables passed to the build
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        env: BTreeMap<String, String>,
    },

    /// Run tests with a build specification file
    Test {
        /// Build specification file inside the source
        build_spec: String,

        /// Build container image
        #[serde(default = "default_build_image")]
        image: String,

        /// Environment variables passed to the test run
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        env: BTreeMap<String, String>,
    },

    /// Update a running service
    Deploy {
        /// Service the deploy updates
        service: ServiceTarget,

        /// Image registry the service's execution role pulls from
        #[serde(default, skip_serializing_if = "Option::is_none")]
        registry: Option<String>,
    },

    /// Suspend until a human approves
    Approval {
        /// Recipients notified when the stage is reached
        #[serde(default)]
        notify: Vec<String>,

        /// Link given to the approver (e.g. the staging URL)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        external_link: Option<String>,
    },
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_build_image() -> String {
    crate::resources::STANDARD_BUILD_IMAGE.to_string()
}

/// Deploy target reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTarget {
    /// Service name
    pub name: String,

    /// Principal the service's tasks run as
    pub execution_role: String,

    /// Number of running instances
    #[serde(default = "default_desired_count")]
    pub desired_count: u32,

    /// Environment variables set on the service's container
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Load balancer health check of the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheck>,
}

impl ServiceTarget {
    pub fn new(
        name: impl Into<String>,
        execution_role: impl Into<String>,
        desired_count: u32,
    ) -> Self {
        Self {
            name: name.into(),
            execution_role: execution_role.into(),
            desired_count,
            env: BTreeMap::new(),
            health_check: None,
        }
    }
}

fn default_desired_count() -> u32 {
    1
}

/// Capability a principal holds on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Pull,
    Push,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pull => write!(f, "pull"),
            Self::Push => write!(f, "push"),
        }
    }
}

/// Directed authorization edge: `resource → principal` with a capability
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub resource: String,
    pub principal: String,
    pub capability: Capability,
}

impl PermissionGrant {
    pub fn new(
        resource: impl Into<String>,
        principal: impl Into<String>,
        capability: Capability,
    ) -> Self {
        Self {
            resource: resource.into(),
            principal: principal.into(),
            capability,
        }
    }
}

impl std::fmt::Display for PermissionGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} → {} ({})", self.resource, self.principal, self.capability)
    }
}

/// A grant together with the stage position it takes effect at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledGrant {
    #[serde(flatten)]
    pub grant: PermissionGrant,

    /// Grants at position `n` are in place before stage `n` runs
    pub position: usize,
}

/// An artifact and the stages that touch it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,

    /// Stage producing the artifact
    pub producer: String,

    /// Stages consuming the artifact, in pipeline order
    #[serde(default)]
    pub consumers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deploy(registry: Option<&str>) -> Action {
        Action::new(
            "StagingEcsDeployAction",
            ActionKind::Deploy {
                service: ServiceTarget::new("staging-web", "staging-execution-role", 1),
                registry: registry.map(String::from),
            },
        )
    }

    #[test]
    fn test_parse_action_yaml() {
        let yaml = r#"
name: ImageBuildAction
kind:
  type: build
  build_spec: buildspec.deploy.yml
  privileged: true
  env:
    CONTAINER_NAME: web
input: sourceOutput
output: buildOutput
"#;

        let action: Action = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(action.kind_name(), "build");
        assert_eq!(action.input.as_deref(), Some("sourceOutput"));
        match &action.kind {
            ActionKind::Build {
                image,
                privileged,
                env,
                ..
            } => {
                assert_eq!(image, "aws/codebuild/standard:2.0");
                assert!(*privileged);
                assert_eq!(env["CONTAINER_NAME"], "web");
            }
            _ => panic!("Expected build action"),
        }
    }

    #[test]
    fn test_source_defaults_to_master() {
        let yaml = "name: CodeCommit\nkind:\n  type: source\n  repository: MyAppRepository\n";
        let action: Action = serde_yaml::from_str(yaml).unwrap();
        match &action.kind {
            ActionKind::Source { branch, .. } => assert_eq!(branch, "master"),
            _ => panic!("Expected source action"),
        }
        assert_eq!(action.kind_name(), "source");
    }

    #[test]
    fn test_deploy_requires_pull_on_registry() {
        let grant = deploy(Some("app-registry")).required_grant().unwrap();
        assert_eq!(grant.resource, "app-registry");
        assert_eq!(grant.principal, "staging-execution-role");
        assert_eq!(grant.capability, Capability::Pull);

        assert!(deploy(None).required_grant().is_none());
        assert_eq!(deploy(None).target(), Some("staging-web"));
    }

    #[test]
    fn test_parse_spec_yaml() {
        let yaml = r#"
name: web
stages:
  - name: DeployToStaging
    position: 0
    actions:
      - name: StagingEcsDeployAction
        kind:
          type: deploy
          service:
            name: staging-web
            execution_role: staging-execution-role
          registry: app-registry
        input: buildOutput
artifacts:
  - name: buildOutput
    producer: Build
grants:
  - resource: app-registry
    principal: staging-execution-role
    capability: pull
    position: 0
"#;

        let spec = PipelineSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.stage_names(), vec!["DeployToStaging"]);
        assert_eq!(spec.artifact("buildOutput").unwrap().producer, "Build");
        assert_eq!(spec.grants[0].grant.capability, Capability::Pull);
        assert_eq!(spec.stages[0].inputs().collect::<Vec<_>>(), vec!["buildOutput"]);

        match &spec.stages[0].actions[0].kind {
            ActionKind::Deploy { service, .. } => assert_eq!(service.desired_count, 1),
            _ => panic!("Expected deploy action"),
        }
    }

    #[test]
    fn test_approval_stage_detection() {
        let stage = Stage {
            name: "ManualApproval".into(),
            position: 0,
            actions: vec![Action::new(
                "ManualApprovalAction",
                ActionKind::Approval {
                    notify: vec!["ops@example.com".into()],
                    external_link: None,
                },
            )],
        };
        assert!(stage.is_manual_approval());
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let spec = PipelineSpec {
            name: "web".into(),
            stages: vec![],
            artifacts: vec![],
            grants: vec![],
        };
        assert_eq!(spec.fingerprint().unwrap(), spec.clone().fingerprint().unwrap());
        assert_eq!(spec.fingerprint().unwrap().len(), 64);
    }
}
