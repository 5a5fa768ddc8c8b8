// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! pipespec - deployment pipeline specification builder

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pipespec::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pipespec=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    match cli.command {
        Commands::Init {
            output,
            force,
            config,
            notify_email,
        } => pipespec::cli::init::run(output, force, config, notify_email, cli.verbose).await,
        Commands::Validate { manifest } => {
            pipespec::cli::validate::run(manifest, cli.verbose).await
        }
        Commands::Graph { manifest, format } => {
            pipespec::cli::graph::run(manifest, format, cli.verbose).await
        }
        Commands::Plan { manifest, format } => {
            pipespec::cli::plan::run(manifest, format, cli.verbose).await
        }
        Commands::Rehearse { manifest, reject } => {
            pipespec::cli::rehearse::run(manifest, reject, cli.verbose).await
        }
        Commands::Blueprint {
            config,
            notify_email,
            format,
        } => pipespec::cli::blueprint::run(config, notify_email, format, cli.verbose).await,
    }
}
