// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Plan command - build the pipeline and print what would be handed off

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::{load_manifest, OutputFormat};
use crate::engine::{DryRunEngine, ExecutionEngine};

/// Run the plan command
pub async fn run(manifest_path: PathBuf, format: OutputFormat, verbose: bool) -> Result<()> {
    let spec = load_manifest(&manifest_path)?.build()?;

    match format {
        OutputFormat::Yaml => print!("{}", spec.to_yaml()?),
        OutputFormat::Json => println!("{}", spec.to_json()?),
        OutputFormat::Text => {
            let submission = DryRunEngine::new().submit(&spec).await?;
            println!(
                "{} {} ({})",
                "Accepted by".dimmed(),
                submission.engine,
                submission.fingerprint.dimmed()
            );
            if verbose {
                for gate in spec.approval_gates() {
                    println!("  {} waits for approval", gate.name.yellow());
                }
            }
        }
    }

    Ok(())
}
