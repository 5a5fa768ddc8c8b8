// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Pipeline validation
//!
//! Checks a builder's stages, artifacts and grants in one pass.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::PipespecError;
use crate::pipeline::{ActionKind, PipelineSpecBuilder, Stage};

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9.@_-]{1,100}$").expect("valid name pattern"))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern"))
}

/// Whether a stage or action name is accepted by the pipeline provider
pub fn is_valid_name(name: &str) -> bool {
    name_pattern().is_match(name)
}

/// Pipeline validator
pub struct PipelineValidator;

impl PipelineValidator {
    /// Validate everything recorded in a builder
    pub fn validate(builder: &PipelineSpecBuilder) -> ValidationReport {
        let mut report = ValidationReport::new();

        // Violations seen while the builder was filled come first
        report.errors.extend(builder.recorded.iter().cloned());

        if builder.stages.is_empty() {
            report.add_warning("Pipeline has no stages defined");
        }

        for stage in &builder.stages {
            Self::validate_stage(stage, &mut report);
        }

        // Artifact names end up as graph labels
        for name in &builder.artifact_order {
            if !is_valid_name(name) {
                report.add_error(PipespecError::InvalidName {
                    kind: "artifact".into(),
                    name: name.clone(),
                });
            }
        }

        Self::check_artifacts(builder, &mut report);
        Self::check_permissions(builder, &mut report);
        Self::check_flow(builder, &mut report);

        report
    }

    /// Validate a single stage
    fn validate_stage(stage: &Stage, report: &mut ValidationReport) {
        if !is_valid_name(&stage.name) {
            report.add_error(PipespecError::InvalidName {
                kind: "stage".into(),
                name: stage.name.clone(),
            });
        }

        if stage.actions.is_empty() {
            report.add_error(PipespecError::EmptyStage {
                stage: stage.name.clone(),
            });
            return;
        }

        let mut seen = HashSet::new();
        for action in &stage.actions {
            if !is_valid_name(&action.name) {
                report.add_error(PipespecError::InvalidName {
                    kind: "action".into(),
                    name: action.name.clone(),
                });
            }

            if !seen.insert(action.name.as_str()) {
                report.add_error(PipespecError::DuplicateActionName {
                    stage: stage.name.clone(),
                    action: action.name.clone(),
                });
            }

            match &action.kind {
                ActionKind::Approval { notify, .. } => {
                    if action.output.is_some() {
                        report.add_error(PipespecError::ApprovalWithOutput {
                            stage: stage.name.clone(),
                            action: action.name.clone(),
                        });
                    }
                    if notify.is_empty() {
                        report.add_warning(&format!(
                            "Stage '{}': approval action '{}' notifies nobody",
                            stage.name, action.name
                        ));
                    }
                    for recipient in notify {
                        if !email_pattern().is_match(recipient) {
                            report.add_warning(&format!(
                                "Stage '{}': '{}' does not look like an email address",
                                stage.name, recipient
                            ));
                        }
                    }
                }
                ActionKind::Deploy { service, .. } => {
                    if service.desired_count == 0 {
                        report.add_warning(&format!(
                            "Stage '{}': service '{}' is deployed with a desired count of 0",
                            stage.name, service.name
                        ));
                    }
                    if let Some(Err(err)) = service.health_check.as_ref().map(|c| c.validate()) {
                        report.add_warning(&format!(
                            "Stage '{}': service '{}': {}",
                            stage.name, service.name, err
                        ));
                    }
                }
                _ => {}
            }
        }
    }

    /// Every required artifact must come from a strictly earlier stage
    fn check_artifacts(builder: &PipelineSpecBuilder, report: &mut ValidationReport) {
        for requirement in &builder.artifact_requirements {
            let Some(&position) = builder.positions.get(&requirement.stage) else {
                report.add_error(PipespecError::UnknownStage {
                    stage: requirement.stage.clone(),
                });
                continue;
            };

            match builder.artifacts.get(&requirement.needs) {
                None => report.add_error(PipespecError::UnknownArtifact {
                    artifact: requirement.needs.clone(),
                    stage: requirement.stage.clone(),
                }),
                Some(record) if record.position >= position => {
                    report.add_error(PipespecError::ArtifactNotYetProduced {
                        artifact: requirement.needs.clone(),
                        stage: requirement.stage.clone(),
                        producer: record.producer.clone(),
                    })
                }
                Some(_) => {}
            }
        }
    }

    /// Every required grant must be recorded at or before the stage's position
    fn check_permissions(builder: &PipelineSpecBuilder, report: &mut ValidationReport) {
        for requirement in &builder.permission_requirements {
            let Some(&position) = builder.positions.get(&requirement.stage) else {
                report.add_error(PipespecError::UnknownStage {
                    stage: requirement.stage.clone(),
                });
                continue;
            };

            let granted_in_time = builder
                .grant_index
                .get(&requirement.needs)
                .map(|&i| builder.grants[i].position <= position)
                .unwrap_or(false);

            if !granted_in_time {
                let grant = &requirement.needs;
                report.add_error(PipespecError::MissingPermission {
                    stage: requirement.stage.clone(),
                    resource: grant.resource.clone(),
                    principal: grant.principal.clone(),
                    capability: grant.capability,
                });
            }
        }
    }

    /// Non-fatal observations about how data flows through the pipeline
    fn check_flow(builder: &PipelineSpecBuilder, report: &mut ValidationReport) {
        for name in &builder.artifact_order {
            let consumed = builder
                .artifact_requirements
                .iter()
                .any(|r| &r.needs == name);
            if !consumed {
                report.add_warning(&format!(
                    "Artifact '{}' is produced by '{}' but never consumed",
                    name, builder.artifacts[name].producer
                ));
            }
        }

        if let Some(last) = builder.stages.last() {
            if last.is_manual_approval() {
                report.add_warning(&format!(
                    "Stage '{}': manual approval is the last stage and gates nothing",
                    last.name
                ));
            }
        }
    }
}

/// Result of pipeline validation
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<PipespecError>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: PipespecError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Action, ServiceTarget};
    use crate::resources::HealthCheck;
    use std::collections::BTreeMap;

    fn test_action(name: &str) -> Action {
        Action::new(
            name,
            ActionKind::Test {
                build_spec: "buildspec.test.yml".into(),
                image: "aws/codebuild/standard:2.0".into(),
                env: BTreeMap::new(),
            },
        )
    }

    fn approval(notify: Vec<&str>) -> Action {
        Action::new(
            "Approve",
            ActionKind::Approval {
                notify: notify.into_iter().map(String::from).collect(),
                external_link: None,
            },
        )
    }

    #[test]
    fn test_name_rules() {
        assert!(is_valid_name("DeployToStaging"));
        assert!(is_valid_name("deploy.staging@eu-west_1"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("Deploy To Staging"));
        assert!(!is_valid_name(&"x".repeat(101)));
    }

    #[test]
    fn test_empty_pipeline_only_warns() {
        let builder = PipelineSpecBuilder::new("empty");
        let report = builder.validate();
        assert!(report.is_valid());
        assert!(report.warnings[0].contains("no stages"));
    }

    #[test]
    fn test_invalid_and_duplicate_action_names() {
        let mut builder = PipelineSpecBuilder::new("names");
        builder
            .add_stage("Test", vec![test_action("Unit Tests"), test_action("Unit Tests")])
            .unwrap();

        let report = builder.validate();
        let kinds: Vec<_> = report.errors.iter().map(PipespecError::kind).collect();
        assert_eq!(
            kinds,
            vec!["invalid-name", "invalid-name", "duplicate-action-name"]
        );
    }

    #[test]
    fn test_approval_with_output_is_rejected() {
        let mut builder = PipelineSpecBuilder::new("gate");
        builder
            .add_stage("Gate", vec![approval(vec!["ops@example.com"]).with_output("nothing")])
            .unwrap();
        builder.add_stage("After", vec![test_action("Check").with_input("nothing")]).unwrap();

        let report = builder.validate();
        assert!(matches!(
            report.errors.as_slice(),
            [PipespecError::ApprovalWithOutput { .. }]
        ));
    }

    #[test]
    fn test_flow_warnings() {
        let mut builder = PipelineSpecBuilder::new("warn");
        builder.add_stage("Test", vec![test_action("Run").with_output("report")]).unwrap();
        builder.add_stage("Gate", vec![approval(vec!["not-an-email"])]).unwrap();

        let report = builder.validate();
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.contains("never consumed")));
        assert!(report.warnings.iter().any(|w| w.contains("email address")));
        assert!(report.warnings.iter().any(|w| w.contains("gates nothing")));
    }

    #[test]
    fn test_zero_desired_count_warns() {
        let mut builder = PipelineSpecBuilder::new("scale");
        builder
            .add_stage(
                "Deploy",
                vec![Action::new(
                    "Ship",
                    ActionKind::Deploy {
                        service: ServiceTarget::new("web", "role", 0),
                        registry: None,
                    },
                )],
            )
            .unwrap();

        let report = builder.validate();
        assert!(report.has_warnings());
        assert!(report.warnings[0].contains("desired count of 0"));
    }

    #[test]
    fn test_artifact_names_are_checked() {
        let mut builder = PipelineSpecBuilder::new("labels");
        builder.add_stage("Test", vec![test_action("Run").with_output("out\"put")]).unwrap();
        builder.add_stage("Use", vec![test_action("Read").with_input("out\"put")]).unwrap();

        let report = builder.validate();
        assert!(matches!(
            report.errors.as_slice(),
            [PipespecError::InvalidName { kind, name }] if kind == "artifact" && name == "out\"put"
        ));
    }

    #[test]
    fn test_incoherent_health_check_warns() {
        let mut service = ServiceTarget::new("web", "role", 1);
        service.health_check = Some(HealthCheck {
            interval_secs: 5,
            timeout_secs: 9,
            ..Default::default()
        });

        let mut builder = PipelineSpecBuilder::new("health");
        builder
            .add_stage(
                "Deploy",
                vec![Action::new(
                    "Ship",
                    ActionKind::Deploy {
                        service,
                        registry: None,
                    },
                )],
            )
            .unwrap();

        let report = builder.validate();
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.contains("health check timeout (9s)")));
    }

    #[test]
    fn test_requirement_on_unknown_stage() {
        let mut builder = PipelineSpecBuilder::new("unknown");
        builder.add_stage("Build", vec![test_action("Run")]).unwrap();
        builder.require_artifact("Ghost", "anything");

        let report = builder.validate();
        assert!(matches!(
            report.errors.as_slice(),
            [PipespecError::UnknownStage { stage }] if stage == "Ghost"
        ));
    }
}
