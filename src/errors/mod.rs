// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Error types
//!
//! Every structural problem in a pipeline specification is reported as a
//! [`PipespecError`]. `build()` gathers all of them into a single
//! [`PipespecError::PipelineValidation`] so users fix everything in one pass.

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::Capability;

/// Result type for pipespec operations
pub type PipespecResult<T> = Result<T, PipespecError>;

/// Main error type for pipespec
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum PipespecError {
    // ─────────────────────────────────────────────────────────────────────────
    // Stage Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Stage '{stage}' is already defined")]
    #[diagnostic(
        code(pipespec::duplicate_stage_name),
        help("Stage names must be unique within a pipeline")
    )]
    DuplicateStageName { stage: String },

    #[error("Stage '{stage}' not found in pipeline")]
    #[diagnostic(
        code(pipespec::unknown_stage),
        help("Add the stage with add_stage before referencing it")
    )]
    UnknownStage { stage: String },

    #[error("Stage '{stage}' has no actions")]
    #[diagnostic(
        code(pipespec::empty_stage),
        help("Every stage needs at least one action")
    )]
    EmptyStage { stage: String },

    #[error("Stage '{stage}' contains action '{action}' more than once")]
    #[diagnostic(code(pipespec::duplicate_action_name))]
    DuplicateActionName { stage: String, action: String },

    #[error("Invalid {kind} name '{name}'")]
    #[diagnostic(
        code(pipespec::invalid_name),
        help("Names are 1-100 characters of letters, digits, '.', '@', '_' or '-'")
    )]
    InvalidName { kind: String, name: String },

    #[error("Approval action '{action}' in stage '{stage}' declares an output artifact")]
    #[diagnostic(
        code(pipespec::approval_with_output),
        help("Manual approval only gates progression; it cannot produce artifacts")
    )]
    ApprovalWithOutput { stage: String, action: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Artifact Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Artifact '{artifact}' declared by stage '{stage}' is already produced by '{producer}'")]
    #[diagnostic(
        code(pipespec::duplicate_artifact_name),
        help("Each artifact is produced by exactly one stage; rename one of them")
    )]
    DuplicateArtifactName {
        artifact: String,
        stage: String,
        producer: String,
    },

    #[error("Stage '{stage}' consumes unknown artifact '{artifact}'")]
    #[diagnostic(
        code(pipespec::unknown_artifact),
        help("Check that an earlier stage declares '{artifact}' as an output")
    )]
    UnknownArtifact { artifact: String, stage: String },

    #[error("Stage '{stage}' consumes artifact '{artifact}' before stage '{producer}' produces it")]
    #[diagnostic(
        code(pipespec::artifact_not_yet_produced),
        help("Move '{producer}' ahead of '{stage}'")
    )]
    ArtifactNotYetProduced {
        artifact: String,
        stage: String,
        producer: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Permission Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Stage '{stage}' needs '{principal}' to have {capability} on '{resource}', which is not granted in time")]
    #[diagnostic(
        code(pipespec::missing_permission),
        help("Grant {capability} on '{resource}' to '{principal}' before adding stage '{stage}'")
    )]
    MissingPermission {
        stage: String,
        resource: String,
        principal: String,
        capability: Capability,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Aggregate
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Pipeline '{pipeline}' failed validation with {} violation(s)", .violations.len())]
    #[diagnostic(code(pipespec::pipeline_validation))]
    PipelineValidation {
        pipeline: String,
        #[related]
        violations: Vec<PipespecError>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Manifest & Config Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Manifest file not found: {path}")]
    #[diagnostic(
        code(pipespec::manifest_not_found),
        help("Create one with 'pipespec init'")
    )]
    ManifestNotFound { path: PathBuf },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(pipespec::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(pipespec::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    #[error("Invalid configuration: {reason}")]
    #[diagnostic(code(pipespec::invalid_config))]
    InvalidConfig {
        reason: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Hand-off Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Execution engine '{engine}' rejected the pipeline: {message}")]
    #[diagnostic(code(pipespec::engine_failed))]
    EngineFailed { engine: String, message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/Format Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(pipespec::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(pipespec::yaml_error))]
    Yaml { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(pipespec::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(pipespec::toml_error))]
    Toml { message: String },
}

impl From<std::io::Error> for PipespecError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for PipespecError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for PipespecError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for PipespecError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl PipespecError {
    /// Individual violations carried by an aggregate error.
    ///
    /// A non-aggregate error is returned as a one-element slice.
    pub fn violations(&self) -> &[PipespecError] {
        match self {
            Self::PipelineValidation { violations, .. } => violations,
            other => std::slice::from_ref(other),
        }
    }

    /// Short machine-friendly kind of the error, used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateStageName { .. } => "duplicate-stage-name",
            Self::UnknownStage { .. } => "unknown-stage",
            Self::EmptyStage { .. } => "empty-stage",
            Self::DuplicateActionName { .. } => "duplicate-action-name",
            Self::InvalidName { .. } => "invalid-name",
            Self::ApprovalWithOutput { .. } => "approval-with-output",
            Self::DuplicateArtifactName { .. } => "duplicate-artifact-name",
            Self::UnknownArtifact { .. } => "unknown-artifact",
            Self::ArtifactNotYetProduced { .. } => "artifact-not-yet-produced",
            Self::MissingPermission { .. } => "missing-permission",
            Self::PipelineValidation { .. } => "pipeline-validation",
            Self::ManifestNotFound { .. } => "manifest-not-found",
            Self::FileReadError { .. } => "file-read-error",
            Self::FileWriteError { .. } => "file-write-error",
            Self::InvalidConfig { .. } => "invalid-config",
            Self::EngineFailed { .. } => "engine-failed",
            Self::Io { .. } => "io",
            Self::Yaml { .. } => "yaml",
            Self::Json { .. } => "json",
            Self::Toml { .. } => "toml",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violations_of_single_error() {
        let err = PipespecError::EmptyStage { stage: "Build".into() };
        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.violations()[0].kind(), "empty-stage");
    }

    #[test]
    fn test_aggregate_message_counts_violations() {
        let err = PipespecError::PipelineValidation {
            pipeline: "web".into(),
            violations: vec![
                PipespecError::DuplicateStageName { stage: "Build".into() },
                PipespecError::UnknownArtifact {
                    artifact: "buildOutput".into(),
                    stage: "Deploy".into(),
                },
            ],
        };

        assert_eq!(
            err.to_string(),
            "Pipeline 'web' failed validation with 2 violation(s)"
        );
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn test_missing_permission_message() {
        let err = PipespecError::MissingPermission {
            stage: "DeployToStaging".into(),
            resource: "registry".into(),
            principal: "staging-role".into(),
            capability: Capability::Pull,
        };
        assert!(err.to_string().contains("pull on 'registry'"));
    }
}
