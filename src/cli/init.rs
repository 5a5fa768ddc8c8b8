// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Init command - write the reference delivery pipeline as a manifest

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::load_config;
use crate::blueprint::DeliveryBlueprint;
use crate::utils::{code, print_success};

/// Run the init command
pub async fn run(
    output: PathBuf,
    force: bool,
    config: Option<PathBuf>,
    notify_email: Option<String>,
    verbose: bool,
) -> Result<()> {
    println!("{}", "Initializing pipeline manifest...".bold());
    println!();

    if output.exists() && !force {
        return Err(miette::miette!(
            "{} already exists. Use --force to overwrite.",
            output.display()
        ));
    }

    let config = load_config(config.as_deref(), notify_email.as_deref())?;
    let manifest = DeliveryBlueprint::new(&config).manifest()?;
    manifest.write(&output)?;

    print_success(&format!("Created {}", output.display()));
    println!();
    println!("{}", "Manifest written!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to adjust stages and grants", code(&output.display().to_string()));
    println!("  2. Run {} to check it", code("pipespec validate"));
    println!("  3. Run {} to walk the stages", code("pipespec rehearse"));
    println!();

    if verbose {
        println!("{}", "Generated manifest:".dimmed());
        println!("{}", "─".repeat(50).dimmed());
        println!("{}", manifest.to_yaml()?.dimmed());
    }

    Ok(())
}
