// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Blueprint command - build the reference delivery pipeline

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::{load_config, OutputFormat};
use crate::blueprint::DeliveryBlueprint;
use crate::pipeline::FlowGraph;
use crate::utils::{code, print_header, print_section};

/// Run the blueprint command
pub async fn run(
    config: Option<PathBuf>,
    notify_email: Option<String>,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let config = load_config(config.as_deref(), notify_email.as_deref())?;
    let blueprint = DeliveryBlueprint::new(&config);
    let spec = blueprint.build()?;

    match format {
        OutputFormat::Yaml => print!("{}", spec.to_yaml()?),
        OutputFormat::Json => println!("{}", spec.to_json()?),
        OutputFormat::Text => {
            print_header(&format!("Pipeline: {}", spec.name));
            print!("{}", FlowGraph::build(&spec).to_text());

            print_section("Outputs");
            for (key, value) in blueprint.outputs() {
                println!("  {}: {}", key.bold(), value);
            }

            print_section("Services");
            let resources = blueprint.resources();
            for service in [&resources.staging, &resources.production] {
                println!(
                    "  {} ({} instance(s), APP_ENV={})",
                    service.service_name().bold(),
                    service.desired_count,
                    service.app_env
                );
                println!("    health check: {}", service.health_check.summary());
            }

            print_section("Approval recipients");
            for email in config.effective_notify_emails() {
                println!("  • {}", email);
            }

            if verbose {
                print_section("Grants");
                for scheduled in &spec.grants {
                    println!("  {} before stage {}", scheduled.grant, scheduled.position + 1);
                }
            }

            println!();
            println!("Write it out with {}", code("pipespec init"));
        }
    }

    Ok(())
}
