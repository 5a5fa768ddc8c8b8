// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Validate command - check a pipeline manifest

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::load_manifest;
use crate::utils::{print_success, print_violations, print_warning};

/// Run the validate command
pub async fn run(manifest_path: PathBuf, verbose: bool) -> Result<()> {
    println!("{}", "Validating pipeline...".bold());
    println!();

    let manifest = load_manifest(&manifest_path)?;
    print_success("Manifest is valid YAML");

    let builder = manifest.to_builder();
    let report = builder.validate();

    if !report.is_valid() {
        println!();
        println!("{}:", "Violations".red().bold());
        for error in &report.errors {
            print_violations(error, verbose);
        }
    }

    if report.has_warnings() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &report.warnings {
            print_warning(warning);
        }
    }

    if verbose {
        println!();
        println!("{}:", "Pipeline summary".bold());
        println!("  Name: {}", manifest.name);
        println!("  Stages: {}", manifest.stages.len());
        for (position, stage) in manifest.stages.iter().enumerate() {
            let grants = if stage.grants.is_empty() {
                String::new()
            } else {
                format!(" [{} grant(s)]", stage.grants.len())
            };
            println!("    {}. {}{}", position + 1, stage.name, grants.dimmed());
        }
    }

    println!();

    if !report.is_valid() {
        return Err(miette::miette!(
            "Pipeline '{}' failed validation with {} violation(s)",
            manifest.name,
            report.errors.len()
        ));
    }

    let spec = builder.build()?;
    println!("  Fingerprint: {}", spec.fingerprint()?.dimmed());
    if report.has_warnings() {
        println!("{}", "Pipeline is valid but has warnings.".yellow().bold());
    } else {
        println!("{}", "Pipeline is valid!".green().bold());
    }
    Ok(())
}
