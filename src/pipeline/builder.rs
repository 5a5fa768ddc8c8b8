// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Pipeline specification builder
//!
//! Stages get their position from insertion order. Artifact and permission
//! constraints are recorded as they are declared and checked together in
//! [`PipelineSpecBuilder::build`], which reports every violation at once.
//!
//! An artifact is usable by a stage only if its producer sits at a strictly
//! earlier position. A grant is usable by a stage if it was recorded at the
//! same or an earlier position, where a grant's position is the position the
//! next added stage will take.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::errors::{PipespecError, PipespecResult};
use crate::pipeline::{
    Action, Artifact, Capability, PermissionGrant, PipelineSpec, PipelineValidator,
    ScheduledGrant, Stage, ValidationReport,
};

/// Where an artifact comes from
#[derive(Debug, Clone)]
pub(super) struct ArtifactRecord {
    pub producer: String,
    pub position: usize,
}

/// A stage's need for an artifact or a grant, checked at build time
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Requirement<T> {
    pub stage: String,
    pub needs: T,
}

/// Builder for validated, ordered pipeline specifications
#[derive(Debug, Clone)]
pub struct PipelineSpecBuilder {
    pub(super) name: String,
    pub(super) stages: Vec<Stage>,
    pub(super) positions: HashMap<String, usize>,
    pub(super) artifact_order: Vec<String>,
    pub(super) artifacts: HashMap<String, ArtifactRecord>,
    pub(super) artifact_requirements: Vec<Requirement<String>>,
    pub(super) grants: Vec<ScheduledGrant>,
    pub(super) grant_index: HashMap<PermissionGrant, usize>,
    pub(super) permission_requirements: Vec<Requirement<PermissionGrant>>,
    /// Violations detected while the builder was being filled
    pub(super) recorded: Vec<PipespecError>,
}

impl PipelineSpecBuilder {
    /// Create an empty builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            positions: HashMap::new(),
            artifact_order: Vec::new(),
            artifacts: HashMap::new(),
            artifact_requirements: Vec::new(),
            grants: Vec::new(),
            grant_index: HashMap::new(),
            permission_requirements: Vec::new(),
            recorded: Vec::new(),
        }
    }

    /// Pipeline name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of stages added so far
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Append a stage to the end of the sequence.
    ///
    /// Each action's output is declared for the new stage, each input is
    /// required by it, and each deploy action that names a registry requires
    /// pull on it for the service's execution role.
    ///
    /// # Errors
    ///
    /// [`PipespecError::DuplicateStageName`] if a stage with the same name was
    /// already added. The stage is dropped and the violation is kept for
    /// [`build`](Self::build).
    pub fn add_stage(
        &mut self,
        name: impl Into<String>,
        actions: Vec<Action>,
    ) -> PipespecResult<&mut Self> {
        let name = name.into();

        if self.positions.contains_key(&name) {
            warn!(stage = %name, "duplicate stage name");
            let err = PipespecError::DuplicateStageName { stage: name };
            self.recorded.push(err.clone());
            return Err(err);
        }

        let position = self.stages.len();
        debug!(stage = %name, position, actions = actions.len(), "adding stage");
        self.positions.insert(name.clone(), position);

        for action in &actions {
            if let Some(output) = &action.output {
                if let Err(err) = self.insert_artifact(&name, position, output) {
                    self.recorded.push(err);
                }
            }
            if let Some(input) = &action.input {
                self.push_artifact_requirement(&name, input);
            }
            if let Some(grant) = action.required_grant() {
                self.push_permission_requirement(&name, grant);
            }
        }

        self.stages.push(Stage {
            name,
            position,
            actions,
        });

        Ok(self)
    }

    /// Record that a stage produces a named artifact.
    ///
    /// # Errors
    ///
    /// [`PipespecError::UnknownStage`] if the stage was never added, or
    /// [`PipespecError::DuplicateArtifactName`] if the artifact is already
    /// declared. Either way the violation is kept for [`build`](Self::build).
    pub fn declare_artifact(
        &mut self,
        producing_stage: &str,
        name: impl Into<String>,
    ) -> PipespecResult<&mut Self> {
        let name = name.into();

        let result = match self.positions.get(producing_stage) {
            Some(&position) => self.insert_artifact(producing_stage, position, &name),
            None => Err(PipespecError::UnknownStage {
                stage: producing_stage.to_string(),
            }),
        };

        match result {
            Ok(()) => Ok(self),
            Err(err) => {
                self.recorded.push(err.clone());
                Err(err)
            }
        }
    }

    /// Require that `name` is produced by a stage strictly before
    /// `consuming_stage`. Checked by [`build`](Self::build).
    pub fn require_artifact(&mut self, consuming_stage: &str, name: &str) -> &mut Self {
        self.push_artifact_requirement(consuming_stage, name);
        self
    }

    /// Record a permission edge at the current position.
    ///
    /// Granting the same edge again is a no-op; the earliest record wins.
    pub fn grant_permission(
        &mut self,
        resource: impl Into<String>,
        principal: impl Into<String>,
        capability: Capability,
    ) -> &mut Self {
        let grant = PermissionGrant::new(resource, principal, capability);

        if self.grant_index.contains_key(&grant) {
            debug!(%grant, "grant already recorded");
            return self;
        }

        let position = self.stages.len();
        debug!(%grant, position, "recording grant");
        self.grant_index.insert(grant.clone(), self.grants.len());
        self.grants.push(ScheduledGrant { grant, position });
        self
    }

    /// Grant both pull and push
    pub fn grant_pull_push(
        &mut self,
        resource: impl Into<String>,
        principal: impl Into<String>,
    ) -> &mut Self {
        let resource = resource.into();
        let principal = principal.into();
        self.grant_permission(resource.clone(), principal.clone(), Capability::Pull)
            .grant_permission(resource, principal, Capability::Push)
    }

    /// Require that the edge is granted no later than `stage`'s position.
    /// Checked by [`build`](Self::build).
    pub fn require_permission(
        &mut self,
        stage: &str,
        resource: impl Into<String>,
        principal: impl Into<String>,
        capability: Capability,
    ) -> &mut Self {
        let grant = PermissionGrant::new(resource, principal, capability);
        self.push_permission_requirement(stage, grant);
        self
    }

    /// Check every constraint without consuming the builder
    pub fn validate(&self) -> ValidationReport {
        PipelineValidator::validate(self)
    }

    /// Produce the immutable, ordered specification.
    ///
    /// # Errors
    ///
    /// [`PipespecError::PipelineValidation`] carrying every violation found:
    /// those recorded while building plus empty stages, artifact ordering and
    /// permission ordering failures.
    pub fn build(self) -> PipespecResult<PipelineSpec> {
        let report = self.validate();

        for warning in &report.warnings {
            warn!(pipeline = %self.name, "{}", warning);
        }

        if !report.is_valid() {
            warn!(
                pipeline = %self.name,
                violations = report.errors.len(),
                "pipeline failed validation"
            );
            return Err(PipespecError::PipelineValidation {
                pipeline: self.name,
                violations: report.errors,
            });
        }

        for scheduled in &self.grants {
            if !self.permission_requirements.iter().any(|r| r.needs == scheduled.grant) {
                debug!(pipeline = %self.name, grant = %scheduled.grant, "grant not required by any stage");
            }
        }

        let artifacts = self.artifact_listing();
        info!(
            pipeline = %self.name,
            stages = self.stages.len(),
            artifacts = artifacts.len(),
            grants = self.grants.len(),
            "pipeline specification built"
        );

        Ok(PipelineSpec {
            name: self.name,
            stages: self.stages,
            artifacts,
            grants: self.grants,
        })
    }

    fn insert_artifact(&mut self, stage: &str, position: usize, name: &str) -> PipespecResult<()> {
        if let Some(existing) = self.artifacts.get(name) {
            return Err(PipespecError::DuplicateArtifactName {
                artifact: name.to_string(),
                stage: stage.to_string(),
                producer: existing.producer.clone(),
            });
        }

        self.artifact_order.push(name.to_string());
        self.artifacts.insert(
            name.to_string(),
            ArtifactRecord {
                producer: stage.to_string(),
                position,
            },
        );
        Ok(())
    }

    fn push_artifact_requirement(&mut self, stage: &str, artifact: &str) {
        let requirement = Requirement {
            stage: stage.to_string(),
            needs: artifact.to_string(),
        };
        if !self.artifact_requirements.contains(&requirement) {
            self.artifact_requirements.push(requirement);
        }
    }

    fn push_permission_requirement(&mut self, stage: &str, grant: PermissionGrant) {
        let requirement = Requirement {
            stage: stage.to_string(),
            needs: grant,
        };
        if !self.permission_requirements.contains(&requirement) {
            self.permission_requirements.push(requirement);
        }
    }

    /// Declared artifacts with consumers sorted by stage position
    fn artifact_listing(&self) -> Vec<Artifact> {
        self.artifact_order
            .iter()
            .map(|name| {
                let record = &self.artifacts[name];
                let mut consumers: Vec<(usize, String)> = self
                    .artifact_requirements
                    .iter()
                    .filter(|r| &r.needs == name)
                    .filter_map(|r| self.positions.get(&r.stage).map(|&p| (p, r.stage.clone())))
                    .collect();
                consumers.sort();
                consumers.dedup();

                Artifact {
                    name: name.clone(),
                    producer: record.producer.clone(),
                    consumers: consumers.into_iter().map(|(_, stage)| stage).collect(),
                }
            })
            .collect()
    }
}
