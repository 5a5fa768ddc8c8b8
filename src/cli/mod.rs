// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! CLI command definitions and handlers

pub mod blueprint;
pub mod graph;
pub mod init;
pub mod plan;
pub mod rehearse;
pub mod validate;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use crate::config::DeliveryConfig;
use crate::pipeline::{Manifest, DEFAULT_MANIFEST};

/// Deployment pipeline specification builder
#[derive(Parser, Debug)]
#[clap(
    name = "pipespec",
    version,
    about = "Build, validate and rehearse ordered deployment pipelines",
    long_about = None,
    after_help = "Examples:\n\
        pipespec init                   Write the reference delivery pipeline\n\
        pipespec validate               Check .pipespec.yaml\n\
        pipespec graph -f mermaid       Show artifact flow\n\
        pipespec rehearse --reject no   Walk the stages, rejecting the approval\n\n\
        See 'pipespec <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the reference delivery pipeline as a manifest
    Init {
        /// Manifest to write
        #[clap(short, long, default_value = DEFAULT_MANIFEST)]
        output: PathBuf,

        /// Overwrite an existing manifest
        #[clap(long)]
        force: bool,

        /// Delivery configuration file (YAML or TOML)
        #[clap(short, long)]
        config: Option<PathBuf>,

        /// Approval recipients, comma separated
        #[clap(long, env = "NOTIFY_EMAILS")]
        notify_email: Option<String>,
    },

    /// Validate a pipeline manifest
    Validate {
        /// Manifest to validate
        #[clap(default_value = DEFAULT_MANIFEST)]
        manifest: PathBuf,
    },

    /// Show artifact flow between stages
    Graph {
        /// Manifest file
        #[clap(default_value = DEFAULT_MANIFEST)]
        manifest: PathBuf,

        /// Output format
        #[clap(short, long, value_enum, default_value = "text")]
        format: GraphFormat,
    },

    /// Build the pipeline and print the hand-off plan
    Plan {
        /// Manifest file
        #[clap(default_value = DEFAULT_MANIFEST)]
        manifest: PathBuf,

        /// Output format
        #[clap(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Walk the stages in order without deploying anything
    Rehearse {
        /// Manifest file
        #[clap(default_value = DEFAULT_MANIFEST)]
        manifest: PathBuf,

        /// Reject manual approvals with this reason
        #[clap(long, value_name = "REASON")]
        reject: Option<String>,
    },

    /// Build the reference delivery pipeline from configuration
    Blueprint {
        /// Delivery configuration file (YAML or TOML)
        #[clap(short, long)]
        config: Option<PathBuf>,

        /// Approval recipients, comma separated
        #[clap(long, env = "NOTIFY_EMAILS")]
        notify_email: Option<String>,

        /// Output format
        #[clap(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Output format for plan and blueprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Yaml,
    Json,
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

/// Load a manifest, pointing at `pipespec init` when it is missing
pub(crate) fn load_manifest(path: &Path) -> miette::Result<Manifest> {
    Ok(Manifest::from_file(path)?)
}

/// Resolve delivery configuration with the recipient override applied
pub(crate) fn load_config(
    config: Option<&Path>,
    notify_email: Option<&str>,
) -> miette::Result<DeliveryConfig> {
    let cwd = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;
    let config = DeliveryConfig::discover(config, &cwd)?;
    Ok(config.with_notify_override(notify_email))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        assert_eq!(OutputFormat::from_str("YAML", true).unwrap(), OutputFormat::Yaml);
        assert_eq!(GraphFormat::from_str("mermaid", false).unwrap(), GraphFormat::Mermaid);
        assert!(GraphFormat::from_str("svg", false).is_err());

        let cli = Cli::parse_from(["pipespec", "graph", "-f", "dot"]);
        assert!(matches!(cli.command, Commands::Graph { format: GraphFormat::Dot, .. }));
    }

    #[test]
    fn test_cli_parses_rehearse() {
        let cli = Cli::parse_from(["pipespec", "-v", "rehearse", "custom.yaml", "--reject", "freeze"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Rehearse { manifest, reject } => {
                assert_eq!(manifest, PathBuf::from("custom.yaml"));
                assert_eq!(reject.as_deref(), Some("freeze"));
            }
            other => panic!("Expected rehearse, got {:?}", other),
        }
    }
}
