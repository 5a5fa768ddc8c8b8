// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Pipeline specification types
//!
//! This module holds the builder that turns stage descriptors into a
//! validated, ordered [`PipelineSpec`], along with the manifest format and
//! the artifact flow graph.

mod builder;
mod definition;
mod graph;
mod manifest;
mod validation;

pub use builder::PipelineSpecBuilder;
pub use definition::*;
pub use graph::FlowGraph;
pub use manifest::{Manifest, ManifestStage, DEFAULT_MANIFEST};
pub use validation::{is_valid_name, PipelineValidator, ValidationReport};
