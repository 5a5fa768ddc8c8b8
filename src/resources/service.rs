// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Load-balanced service environments

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::errors::{PipespecError, PipespecResult};
use crate::pipeline::ServiceTarget;

/// Target-group health check of a load-balanced service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_threshold")]
    pub healthy_threshold: u32,

    #[serde(default = "default_threshold")]
    pub unhealthy_threshold: u32,

    /// Comma-separated HTTP codes counted as healthy
    #[serde(default = "default_codes")]
    pub healthy_http_codes: String,
}

fn default_interval() -> u64 {
    5
}

fn default_timeout() -> u64 {
    4
}

fn default_threshold() -> u32 {
    2
}

fn default_codes() -> String {
    "200,301,302".to_string()
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            timeout_secs: default_timeout(),
            healthy_threshold: default_threshold(),
            unhealthy_threshold: default_threshold(),
            healthy_http_codes: default_codes(),
        }
    }
}

impl HealthCheck {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// One-line description for reports
    pub fn summary(&self) -> String {
        format!(
            "every {}s, timeout {}s, healthy after {}, unhealthy after {}, codes {}",
            self.interval_secs,
            self.timeout_secs,
            self.healthy_threshold,
            self.unhealthy_threshold,
            self.healthy_http_codes
        )
    }

    /// Check the health check settings are coherent
    pub fn validate(&self) -> PipespecResult<()> {
        if self.timeout_secs >= self.interval_secs {
            return Err(PipespecError::InvalidConfig {
                reason: format!(
                    "health check timeout ({}s) must be shorter than its interval ({}s)",
                    self.timeout_secs, self.interval_secs
                ),
                help: Some("The defaults are a 5s interval with a 4s timeout".into()),
            });
        }

        let codes_ok = self
            .healthy_http_codes
            .split(',')
            .all(|code| code.trim().parse::<u16>().is_ok());
        if !codes_ok {
            return Err(PipespecError::InvalidConfig {
                reason: format!("invalid healthy HTTP codes '{}'", self.healthy_http_codes),
                help: Some("Use a comma-separated list such as 200,301,302".into()),
            });
        }

        Ok(())
    }
}

/// A deployable, load-balanced service in one environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEnvironment {
    /// Environment name, passed to the container as `APP_ENV`
    pub app_env: String,

    /// Number of running instances requested by the caller
    pub desired_count: u32,

    /// Load balancer DNS name
    pub load_balancer_dns: String,

    pub health_check: HealthCheck,
}

impl ServiceEnvironment {
    pub fn new(app_env: impl Into<String>, desired_count: u32) -> Self {
        let app_env = app_env.into();
        let load_balancer_dns = format!("{}-web.elb.example.com", app_env);
        Self {
            app_env,
            desired_count,
            load_balancer_dns,
            health_check: HealthCheck::default(),
        }
    }

    /// Use a known load balancer DNS name
    pub fn with_load_balancer_dns(mut self, dns: impl Into<String>) -> Self {
        self.load_balancer_dns = dns.into();
        self
    }

    pub fn with_health_check(mut self, health_check: HealthCheck) -> Self {
        self.health_check = health_check;
        self
    }

    /// Name of the running service
    pub fn service_name(&self) -> String {
        format!("{}-web", self.app_env)
    }

    /// Principal the service's tasks pull images as
    pub fn execution_role(&self) -> String {
        format!("{}-execution-role", self.app_env)
    }

    /// Public URL of the service
    pub fn service_url(&self) -> String {
        format!("http://{}", self.load_balancer_dns)
    }

    /// Environment variables set on the service's container
    pub fn container_env(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("APP_ENV".to_string(), self.app_env.clone())])
    }

    /// Deploy target handed to a deploy action
    pub fn target(&self) -> ServiceTarget {
        ServiceTarget {
            env: self.container_env(),
            health_check: Some(self.health_check.clone()),
            ..ServiceTarget::new(self.service_name(), self.execution_role(), self.desired_count)
        }
    }
}
