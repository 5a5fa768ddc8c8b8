// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Rehearsal engine
//!
//! Walks the stages strictly in order without touching any real resource.
//! At a manual approval stage it notifies the recipients and waits for the
//! approver; a rejection stops the pipeline and every later stage is skipped.

use async_trait::async_trait;
use tracing::{info, warn};

use super::{
    ApprovalDecision, ApprovalRequest, Approver, ExecutionEngine, Notifier, StageOutcome,
    StageStatus, Submission,
};
use crate::errors::PipespecResult;
use crate::pipeline::{ActionKind, PipelineSpec, Stage};
use crate::utils::StageProgress;

/// Sequential walk-through of a pipeline
pub struct RehearsalEngine<A, N> {
    approver: A,
    notifier: N,
    show_progress: bool,
}

impl<A: Approver, N: Notifier> RehearsalEngine<A, N> {
    pub fn new(approver: A, notifier: N) -> Self {
        Self {
            approver,
            notifier,
            show_progress: false,
        }
    }

    /// Print per-stage progress to the terminal
    pub fn with_progress(mut self) -> Self {
        self.show_progress = true;
        self
    }

    fn approval_request(spec: &PipelineSpec, stage: &Stage) -> Option<ApprovalRequest> {
        stage.actions.iter().find_map(|action| match &action.kind {
            ActionKind::Approval {
                notify,
                external_link,
            } => Some(ApprovalRequest {
                pipeline: spec.name.clone(),
                stage: stage.name.clone(),
                action: action.name.clone(),
                external_link: external_link.clone(),
                recipients: notify.clone(),
            }),
            _ => None,
        })
    }
}

#[async_trait]
impl<A: Approver, N: Notifier> ExecutionEngine for RehearsalEngine<A, N> {
    fn name(&self) -> &str {
        "rehearsal"
    }

    async fn submit(&self, spec: &PipelineSpec) -> PipespecResult<Submission> {
        let names: Vec<String> = spec.stages.iter().map(|s| s.name.clone()).collect();
        let mut progress = if self.show_progress {
            StageProgress::new(names)
        } else {
            StageProgress::hidden(names)
        };
        let mut outcomes = Vec::with_capacity(spec.stages.len());
        let mut halted = false;

        for stage in &spec.stages {
            if halted {
                progress.start();
                progress.skip();
                outcomes.push(StageOutcome {
                    stage: stage.name.clone(),
                    status: StageStatus::Skipped,
                });
                continue;
            }

            progress.start();

            let status = match Self::approval_request(spec, stage) {
                Some(request) => {
                    self.notifier.notify(&request).await?;
                    match self.approver.decide(&request).await? {
                        ApprovalDecision::Approved => {
                            info!(stage = %stage.name, "approval granted");
                            StageStatus::Approved
                        }
                        ApprovalDecision::Rejected { reason } => {
                            warn!(stage = %stage.name, %reason, "approval rejected");
                            halted = true;
                            StageStatus::Rejected { reason }
                        }
                    }
                }
                None => {
                    info!(stage = %stage.name, actions = stage.actions.len(), "stage rehearsed");
                    StageStatus::Completed
                }
            };

            match &status {
                StageStatus::Rejected { reason } => progress.fail(reason),
                _ => progress.complete(),
            }

            outcomes.push(StageOutcome {
                stage: stage.name.clone(),
                status,
            });
        }

        Ok(Submission {
            engine: self.name().to_string(),
            pipeline: spec.name.clone(),
            fingerprint: spec.fingerprint()?,
            stages: outcomes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::DeliveryBlueprint;
    use crate::config::DeliveryConfig;
    use crate::engine::{ChannelApprover, FixedApprover, LogNotifier};
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct RecordingNotifier {
        seen: Arc<Mutex<Vec<ApprovalRequest>>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, request: &ApprovalRequest) -> PipespecResult<()> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(())
        }
    }

    fn spec() -> PipelineSpec {
        DeliveryBlueprint::new(&DeliveryConfig::default()).build().unwrap()
    }

    #[tokio::test]
    async fn test_approved_rehearsal_runs_everything() {
        let notifier = RecordingNotifier::default();
        let engine = RehearsalEngine::new(FixedApprover::approve(), notifier.clone());

        let submission = engine.submit(&spec()).await.unwrap();
        assert!(submission.completed());
        assert_eq!(submission.stages[4].status, StageStatus::Approved);

        let seen = notifier.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].recipients, vec!["email@example.com".to_string()]);
        assert_eq!(seen[0].external_link.as_deref(), Some("http://staging-web.elb.example.com"));
    }

    #[tokio::test]
    async fn test_rejection_skips_later_stages() {
        let engine = RehearsalEngine::new(FixedApprover::reject("staging looks wrong"), LogNotifier);

        let submission = engine.submit(&spec()).await.unwrap();
        assert!(!submission.completed());
        assert_eq!(submission.halted_at(), Some("ManualApproval"));
        assert_eq!(submission.skipped(), vec!["DeployToProduction"]);
        assert_eq!(submission.stages[3].status, StageStatus::Completed);
    }

    #[tokio::test]
    async fn test_rehearsal_waits_for_channel_decision() {
        let (approver, handle) = ChannelApprover::new();
        let engine = RehearsalEngine::new(approver, LogNotifier);
        let spec = spec();

        let run = tokio::spawn(async move { engine.submit(&spec).await });
        handle.reject("change freeze").await.unwrap();

        let submission = run.await.unwrap().unwrap();
        assert_eq!(
            submission.stages[4].status,
            StageStatus::Rejected {
                reason: "change freeze".into()
            }
        );
    }
}
