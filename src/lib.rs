// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! # pipespec - deployment pipeline specification builder
//!
//! `pipespec` builds ordered, validated deployment pipeline specifications.
//! Stages run in strict sequence; artifacts must be produced by an earlier
//! stage than any consumer, and every permission a stage relies on must be
//! granted no later than that stage.
//!
//! ## Quick Start
//!
//! ```bash
//! # Write the reference delivery pipeline
//! pipespec init
//!
//! # Check it
//! pipespec validate
//!
//! # Walk the stages, rejecting the manual approval
//! pipespec rehearse --reject "not yet"
//! ```
//!
//! ## Library use
//!
//! ```
//! use pipespec::pipeline::{Action, ActionKind, PipelineSpecBuilder};
//!
//! let mut builder = PipelineSpecBuilder::new("web");
//! builder
//!     .add_stage(
//!         "Source",
//!         vec![Action::new(
//!             "Checkout",
//!             ActionKind::Source {
//!                 repository: "app".into(),
//!                 branch: "main".into(),
//!             },
//!         )
//!         .with_output("sourceOutput")],
//!     )
//!     .unwrap();
//! let spec = builder.build().unwrap();
//! assert_eq!(spec.stage_names(), vec!["Source"]);
//! ```

pub mod blueprint;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod pipeline;
pub mod resources;
pub mod utils;

pub use blueprint::{DeliveryBlueprint, DeliveryResources};
pub use config::DeliveryConfig;
pub use engine::{ExecutionEngine, Submission};
pub use errors::{PipespecError, PipespecResult};
pub use pipeline::{PipelineSpec, PipelineSpecBuilder, Stage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
