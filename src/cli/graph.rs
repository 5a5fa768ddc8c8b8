// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Graph command - show artifact flow between stages

use miette::Result;
use std::path::PathBuf;

use super::{load_manifest, GraphFormat};
use crate::pipeline::FlowGraph;

/// Run the graph command
pub async fn run(manifest_path: PathBuf, format: GraphFormat, _verbose: bool) -> Result<()> {
    let spec = load_manifest(&manifest_path)?.build()?;
    let graph = FlowGraph::build(&spec);

    let output = match format {
        GraphFormat::Text => graph.to_text(),
        GraphFormat::Dot => graph.to_dot(),
        GraphFormat::Mermaid => graph.to_mermaid(),
    };

    println!("{}", output);

    Ok(())
}
