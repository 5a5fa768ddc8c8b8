// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Error recovery suggestions
//!
//! Turns validation violations into concrete next steps.

use super::PipespecError;

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Suggest a fix for a single violation, if one is known
    pub fn for_violation(error: &PipespecError) -> Option<Self> {
        match error {
            PipespecError::ArtifactNotYetProduced {
                artifact,
                stage,
                producer,
            } if stage == producer => Some(Self {
                action: format!("Produce '{}' in a stage before '{}'", artifact, stage),
                steps: vec![
                    format!("Stage '{}' both produces and consumes '{}'", stage, artifact),
                    "An artifact is only visible to stages after the one producing it".into(),
                    "Move the producing action into an earlier stage".into(),
                ],
                commands: vec![],
            }),
            PipespecError::ArtifactNotYetProduced {
                artifact,
                stage,
                producer,
            } => Some(Self::reorder_stages(artifact, stage, producer)),
            PipespecError::UnknownArtifact { artifact, stage } => Some(Self {
                action: format!("Produce artifact '{}'", artifact),
                steps: vec![
                    format!("Stage '{}' consumes '{}' but no stage outputs it", stage, artifact),
                    "Add an `output` to an action in an earlier stage, or fix the name".into(),
                ],
                commands: vec![],
            }),
            PipespecError::MissingPermission {
                stage,
                resource,
                principal,
                capability,
            } => Some(Self {
                action: format!("Grant {} on '{}' to '{}'", capability, resource, principal),
                steps: vec![
                    format!(
                        "Add a grant to stage '{}' (or any stage before it) in the manifest:",
                        stage
                    ),
                    format!(
                        "  grants: [{{ resource: {}, principal: {}, capability: {} }}]",
                        resource, principal, capability
                    ),
                ],
                commands: vec![],
            }),
            PipespecError::DuplicateStageName { stage } => Some(Self {
                action: format!("Rename one of the '{}' stages", stage),
                steps: vec!["Stage names must be unique within a pipeline".into()],
                commands: vec![],
            }),
            PipespecError::ManifestNotFound { .. } => Some(Self::create_manifest()),
            _ => None,
        }
    }

    /// Suggest moving a producer ahead of its consumer
    pub fn reorder_stages(artifact: &str, consumer: &str, producer: &str) -> Self {
        Self {
            action: format!("Move stage '{}' before '{}'", producer, consumer),
            steps: vec![
                format!("'{}' is produced by '{}'", artifact, producer),
                format!("'{}' runs first and cannot see it yet", consumer),
                "Stages run strictly in the order they are listed".into(),
            ],
            commands: vec![
                "# Show the artifact flow:".into(),
                "pipespec graph --format mermaid".into(),
            ],
        }
    }

    /// Suggest creating a manifest file
    pub fn create_manifest() -> Self {
        Self {
            action: "Create a pipeline manifest".into(),
            steps: vec![
                "No .pipespec.yaml found in current directory".into(),
                "Generate the reference delivery pipeline or write the file manually".into(),
            ],
            commands: vec![
                "# Generate the reference pipeline:".into(),
                "pipespec init".into(),
            ],
        }
    }
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "→ {}", self.action)?;

        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }

        if !self.commands.is_empty() {
            writeln!(f)?;
            for cmd in &self.commands {
                writeln!(f, "  {}", cmd)?;
            }
        }

        Ok(())
    }
}
