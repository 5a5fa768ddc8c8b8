// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Dry-run engine: prints the execution plan without running anything

use async_trait::async_trait;
use colored::Colorize;

use super::{ExecutionEngine, StageOutcome, StageStatus, Submission};
use crate::errors::PipespecResult;
use crate::pipeline::PipelineSpec;

/// Engine that accepts a pipeline and only reports the plan
#[derive(Debug, Default, Clone)]
pub struct DryRunEngine {
    quiet: bool,
}

impl DryRunEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Do not print the plan
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Render the execution plan
    pub fn render_plan(spec: &PipelineSpec) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}: {}\n", "Pipeline".bold(), spec.name));
        out.push_str(&format!("{}\n", "═".repeat(50)));
        out.push_str(&format!(
            "Execution plan ({} stage{}):\n\n",
            spec.stages.len(),
            if spec.stages.len() == 1 { "" } else { "s" }
        ));

        for stage in &spec.stages {
            out.push_str(&format!("  {}. {}", stage.position + 1, stage.name.bold()));
            if stage.is_manual_approval() {
                out.push_str(&format!(" {}", "[waits for approval]".yellow()));
            }
            out.push('\n');

            for action in &stage.actions {
                out.push_str(&format!("     - {} ({})", action.name, action.kind_name()));
                if let Some(input) = &action.input {
                    out.push_str(&format!(" {}", format!("← {}", input).dimmed()));
                }
                if let Some(output) = &action.output {
                    out.push_str(&format!(" {}", format!("→ {}", output).dimmed()));
                }
                out.push('\n');
            }

            for scheduled in spec.grants.iter().filter(|g| g.position == stage.position) {
                out.push_str(&format!(
                    "     {} {}\n",
                    "grant".cyan(),
                    scheduled.grant
                ));
            }
        }

        out
    }
}

#[async_trait]
impl ExecutionEngine for DryRunEngine {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn submit(&self, spec: &PipelineSpec) -> PipespecResult<Submission> {
        if !self.quiet {
            println!("{}", Self::render_plan(spec));
        }

        Ok(Submission {
            engine: self.name().to_string(),
            pipeline: spec.name.clone(),
            fingerprint: spec.fingerprint()?,
            stages: spec
                .stages
                .iter()
                .map(|s| StageOutcome {
                    stage: s.name.clone(),
                    status: StageStatus::Planned,
                })
                .collect(),
        })
    }
}
