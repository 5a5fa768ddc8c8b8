// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Manual approval collaborators
//!
//! The rehearsal engine notifies recipients through a [`Notifier`] and then
//! waits on an [`Approver`] for the decision.

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::info;

use crate::errors::{PipespecError, PipespecResult};

/// What the approver is asked to decide
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalRequest {
    pub pipeline: String,
    pub stage: String,
    pub action: String,
    /// Link for the approver, e.g. the staging service URL
    pub external_link: Option<String>,
    pub recipients: Vec<String>,
}

/// Out-of-band approval signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approved,
    Rejected { reason: String },
}

/// Resolves manual approval stages
#[async_trait]
pub trait Approver: Send + Sync {
    /// Wait until the request is approved or rejected
    async fn decide(&self, request: &ApprovalRequest) -> PipespecResult<ApprovalDecision>;
}

/// Delivers approval notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, request: &ApprovalRequest) -> PipespecResult<()>;
}

/// Notifier that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, request: &ApprovalRequest) -> PipespecResult<()> {
        info!(
            pipeline = %request.pipeline,
            stage = %request.stage,
            recipients = %request.recipients.join(","),
            link = request.external_link.as_deref().unwrap_or("-"),
            "approval requested"
        );
        Ok(())
    }
}

/// Approver that always answers the same way
#[derive(Debug, Clone)]
pub struct FixedApprover {
    decision: ApprovalDecision,
}

impl FixedApprover {
    pub fn approve() -> Self {
        Self {
            decision: ApprovalDecision::Approved,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            decision: ApprovalDecision::Rejected {
                reason: reason.into(),
            },
        }
    }
}

#[async_trait]
impl Approver for FixedApprover {
    async fn decide(&self, _request: &ApprovalRequest) -> PipespecResult<ApprovalDecision> {
        Ok(self.decision.clone())
    }
}

/// Approver fed by an [`ApprovalHandle`].
///
/// `decide` awaits the next decision sent through the handle. If every
/// handle is dropped first, the approval counts as rejected.
pub struct ChannelApprover {
    rx: Mutex<mpsc::Receiver<ApprovalDecision>>,
}

/// Sending half of a [`ChannelApprover`]
#[derive(Clone)]
pub struct ApprovalHandle {
    tx: mpsc::Sender<ApprovalDecision>,
}

impl ChannelApprover {
    pub fn new() -> (Self, ApprovalHandle) {
        let (tx, rx) = mpsc::channel(8);
        (Self { rx: Mutex::new(rx) }, ApprovalHandle { tx })
    }
}

impl ApprovalHandle {
    pub async fn approve(&self) -> PipespecResult<()> {
        self.send(ApprovalDecision::Approved).await
    }

    pub async fn reject(&self, reason: impl Into<String>) -> PipespecResult<()> {
        self.send(ApprovalDecision::Rejected {
            reason: reason.into(),
        })
        .await
    }

    async fn send(&self, decision: ApprovalDecision) -> PipespecResult<()> {
        self.tx
            .send(decision)
            .await
            .map_err(|_| PipespecError::EngineFailed {
                engine: "approval".into(),
                message: "approver is no longer listening".into(),
            })
    }
}

#[async_trait]
impl Approver for ChannelApprover {
    async fn decide(&self, request: &ApprovalRequest) -> PipespecResult<ApprovalDecision> {
        let mut rx = self.rx.lock().await;
        Ok(rx.recv().await.unwrap_or_else(|| ApprovalDecision::Rejected {
            reason: format!("no decision received for stage '{}'", request.stage),
        }))
    }
}
