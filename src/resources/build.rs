// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Build projects

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::STANDARD_BUILD_IMAGE;
use crate::pipeline::ActionKind;

/// A build project the build service runs for a build or test action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildProject {
    /// Project name
    pub name: String,

    /// Build specification file inside the source artifact
    pub build_spec: String,

    /// Build container image
    pub image: String,

    /// Whether the build container runs privileged
    pub privileged: bool,

    /// Environment variables passed through to the build
    pub env: BTreeMap<String, String>,
}

impl BuildProject {
    pub fn new(name: impl Into<String>, build_spec: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            build_spec: build_spec.into(),
            image: STANDARD_BUILD_IMAGE.to_string(),
            privileged: false,
            env: BTreeMap::new(),
        }
    }

    /// Run the build container privileged
    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Principal the project's builds run as
    pub fn principal(&self) -> String {
        format!("{}-role", self.name)
    }

    /// Action kind for a build action backed by this project
    pub fn build_action(&self) -> ActionKind {
        ActionKind::Build {
            build_spec: self.build_spec.clone(),
            image: self.image.clone(),
            privileged: self.privileged,
            env: self.env.clone(),
        }
    }

    /// Action kind for a test action backed by this project
    pub fn test_action(&self) -> ActionKind {
        ActionKind::Test {
            build_spec: self.build_spec.clone(),
            image: self.image.clone(),
            env: self.env.clone(),
        }
    }
}
