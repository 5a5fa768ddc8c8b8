// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Execution engine hand-off
//!
//! A validated [`PipelineSpec`] is handed to an [`ExecutionEngine`]. Real
//! engines live with the cloud provider; this module provides the seam plus
//! a dry-run engine and a rehearsal engine that walks the stages in order and
//! suspends at manual approval.

mod approval;
mod dry_run;
mod rehearsal;

pub use approval::{
    ApprovalDecision, ApprovalHandle, ApprovalRequest, Approver, ChannelApprover, FixedApprover,
    LogNotifier, Notifier,
};
pub use dry_run::DryRunEngine;
pub use rehearsal::RehearsalEngine;

use async_trait::async_trait;

use crate::errors::PipespecResult;
use crate::pipeline::PipelineSpec;

/// What happened to a stage during a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    /// Scheduled but not run (dry run)
    Planned,
    /// Ran to completion
    Completed,
    /// Manual approval granted
    Approved,
    /// Manual approval rejected; nothing after it runs
    Rejected { reason: String },
    /// Not run because an earlier stage halted the pipeline
    Skipped,
}

/// Outcome of one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub stage: String,
    pub status: StageStatus,
}

/// Receipt for a pipeline handed to an engine
#[derive(Debug, Clone)]
pub struct Submission {
    /// Engine that accepted the pipeline
    pub engine: String,
    pub pipeline: String,
    /// Fingerprint of the submitted specification
    pub fingerprint: String,
    /// Per-stage outcomes in pipeline order
    pub stages: Vec<StageOutcome>,
}

impl Submission {
    /// Whether every stage ran (or was approved)
    pub fn completed(&self) -> bool {
        self.stages
            .iter()
            .all(|o| matches!(o.status, StageStatus::Completed | StageStatus::Approved))
    }

    /// Stage that halted the pipeline, if any
    pub fn halted_at(&self) -> Option<&str> {
        self.stages
            .iter()
            .find(|o| matches!(o.status, StageStatus::Rejected { .. }))
            .map(|o| o.stage.as_str())
    }

    /// Stages that were skipped
    pub fn skipped(&self) -> Vec<&str> {
        self.stages
            .iter()
            .filter(|o| o.status == StageStatus::Skipped)
            .map(|o| o.stage.as_str())
            .collect()
    }
}

/// Trait for engines that accept validated pipelines
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Engine name used in receipts and errors
    fn name(&self) -> &str;

    /// Hand a validated specification to the engine
    async fn submit(&self, spec: &PipelineSpec) -> PipespecResult<Submission>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(stage: &str, status: StageStatus) -> StageOutcome {
        StageOutcome {
            stage: stage.into(),
            status,
        }
    }

    #[test]
    fn test_submission_summary() {
        let submission = Submission {
            engine: "test".into(),
            pipeline: "web".into(),
            fingerprint: "abc".into(),
            stages: vec![
                outcome("Build", StageStatus::Completed),
                outcome(
                    "ManualApproval",
                    StageStatus::Rejected {
                        reason: "not today".into(),
                    },
                ),
                outcome("DeployToProduction", StageStatus::Skipped),
            ],
        };

        assert!(!submission.completed());
        assert_eq!(submission.halted_at(), Some("ManualApproval"));
        assert_eq!(submission.skipped(), vec!["DeployToProduction"]);
    }
}
