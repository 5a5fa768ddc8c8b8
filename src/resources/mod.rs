// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! External collaborator handles
//!
//! Typed references to what the cloud provider owns: the source repository,
//! the image registry, build projects and the deployable services. The
//! pipeline only references these; it never creates or mutates them.

mod build;
mod service;

pub use build::BuildProject;
pub use service::{HealthCheck, ServiceEnvironment};

use serde::{Deserialize, Serialize};

/// Build image used by build and test actions
pub const STANDARD_BUILD_IMAGE: &str = "aws/codebuild/standard:2.0";

/// Managed source repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRepository {
    /// Repository name
    pub name: String,

    /// Branch the pipeline tracks
    pub branch: String,

    /// Group of developers with pull/push access
    pub developer_group: String,
}

impl SourceRepository {
    pub fn new(
        name: impl Into<String>,
        branch: impl Into<String>,
        developer_group: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            branch: branch.into(),
            developer_group: developer_group.into(),
        }
    }

    /// Clone URL handed to developers
    pub fn clone_url(&self) -> String {
        format!("codecommit://{}", self.name)
    }
}

/// Container image registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRegistry {
    /// Registry name, used as the permission resource
    pub name: String,

    /// Repository URI images are pushed to
    pub uri: String,
}

impl ImageRegistry {
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_url() {
        let repo = SourceRepository::new("MyAppRepository", "master", "Developers");
        assert_eq!(repo.clone_url(), "codecommit://MyAppRepository");
    }
}
