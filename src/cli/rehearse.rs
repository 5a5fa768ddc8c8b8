// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Rehearse command - walk the stages in order without deploying

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::load_manifest;
use crate::engine::{ExecutionEngine, FixedApprover, LogNotifier, RehearsalEngine};
use crate::utils::{print_header, print_info};

/// Run the rehearse command
pub async fn run(manifest_path: PathBuf, reject: Option<String>, verbose: bool) -> Result<()> {
    let spec = load_manifest(&manifest_path)?.build()?;

    print_header(&format!("Rehearsing {}", spec.name));

    let approver = match reject {
        Some(reason) => FixedApprover::reject(reason),
        None => FixedApprover::approve(),
    };
    let engine = RehearsalEngine::new(approver, LogNotifier).with_progress();
    let submission = engine.submit(&spec).await?;

    println!();
    if verbose {
        for outcome in &submission.stages {
            print_info(&format!("{}: {:?}", outcome.stage, outcome.status));
        }
    }

    match submission.halted_at() {
        Some(stage) => {
            println!(
                "{} at {}; skipped: {}",
                "Pipeline halted".yellow().bold(),
                stage,
                submission.skipped().join(", ")
            );
        }
        None => println!("{}", "All stages rehearsed.".green().bold()),
    }

    Ok(())
}
