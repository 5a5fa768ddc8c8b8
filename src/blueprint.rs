// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Reference delivery pipeline
//!
//! Composes the six-stage pipeline
//! `Source → UnitTest → Build → DeployToStaging → ManualApproval → DeployToProduction`
//! from a [`DeliveryConfig`] and the collaborator handles it describes.
//! Every permission grant is derived from the resources involved and
//! recorded just before the stage that relies on it.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::DeliveryConfig;
use crate::errors::PipespecResult;
use crate::pipeline::{Action, ActionKind, Capability, Manifest, PipelineSpec, PipelineSpecBuilder};
use crate::resources::{BuildProject, ImageRegistry, ServiceEnvironment, SourceRepository};

pub const SOURCE_OUTPUT: &str = "sourceOutput";
pub const BUILD_OUTPUT: &str = "buildOutput";

/// Collaborator handles the pipeline refers to
#[derive(Debug, Clone)]
pub struct DeliveryResources {
    pub repository: SourceRepository,
    pub registry: ImageRegistry,
    pub unit_test: BuildProject,
    pub image_build: BuildProject,
    pub staging: ServiceEnvironment,
    pub production: ServiceEnvironment,
}

impl DeliveryResources {
    /// Describe the resources a configuration asks for.
    ///
    /// Desired counts come from the configuration unchanged.
    pub fn from_config(config: &DeliveryConfig) -> Self {
        let repository = SourceRepository::new(
            config.repository.name.clone(),
            config.repository.branch.clone(),
            config.repository.developer_group.clone(),
        );
        let registry = ImageRegistry::new(config.registry.name.clone(), config.registry.resolved_uri());

        let unit_test = BuildProject::new("TestProject", "buildspec.test.yml");
        let image_build = BuildProject::new("ImageBuildProject", "buildspec.deploy.yml")
            .privileged()
            .with_env("REPOSITORY_URI", registry.uri.clone())
            .with_env("CONTAINER_NAME", config.container_name.clone());

        let environment = |name: &str, env: &crate::config::EnvironmentConfig| {
            let service = ServiceEnvironment::new(name, env.desired_count)
                .with_health_check(config.health_check.clone());
            match &env.load_balancer_dns {
                Some(dns) => service.with_load_balancer_dns(dns.clone()),
                None => service,
            }
        };

        Self {
            repository,
            registry,
            unit_test,
            image_build,
            staging: environment("staging", &config.staging),
            production: environment("production", &config.production),
        }
    }
}

/// The reference delivery pipeline for one configuration
pub struct DeliveryBlueprint {
    name: String,
    notify_emails: Vec<String>,
    resources: DeliveryResources,
}

impl DeliveryBlueprint {
    pub fn new(config: &DeliveryConfig) -> Self {
        Self::with_resources(config, DeliveryResources::from_config(config))
    }

    /// Use resources described elsewhere
    pub fn with_resources(config: &DeliveryConfig, resources: DeliveryResources) -> Self {
        Self {
            name: config.pipeline_name.clone(),
            notify_emails: config.effective_notify_emails(),
            resources,
        }
    }

    pub fn resources(&self) -> &DeliveryResources {
        &self.resources
    }

    /// Fill a builder with the six delivery stages
    pub fn builder(&self) -> PipelineSpecBuilder {
        let r = &self.resources;
        let mut builder = PipelineSpecBuilder::new(self.name.clone());

        builder.grant_pull_push(r.repository.name.clone(), r.repository.developer_group.clone());
        self.push_stage(&mut builder, "Source", vec![self.source_action()]);

        self.push_stage(
            &mut builder,
            "UnitTest",
            vec![Action::new("UnitTestBuildAction", r.unit_test.test_action()).with_input(SOURCE_OUTPUT)],
        );

        builder.grant_pull_push(r.registry.name.clone(), r.image_build.principal());
        self.push_stage(
            &mut builder,
            "Build",
            vec![Action::new("ImageBuildAction", r.image_build.build_action())
                .with_input(SOURCE_OUTPUT)
                .with_output(BUILD_OUTPUT)],
        );
        builder.require_permission(
            "Build",
            r.registry.name.clone(),
            r.image_build.principal(),
            Capability::Push,
        );

        builder.grant_permission(r.registry.name.clone(), r.staging.execution_role(), Capability::Pull);
        self.push_stage(
            &mut builder,
            "DeployToStaging",
            vec![self.deploy_action("StagingEcsDeployAction", &r.staging)],
        );

        self.push_stage(
            &mut builder,
            "ManualApproval",
            vec![Action::new(
                "ManualApprovalAction",
                ActionKind::Approval {
                    notify: self.notify_emails.clone(),
                    external_link: Some(r.staging.service_url()),
                },
            )],
        );

        builder.grant_permission(
            r.registry.name.clone(),
            r.production.execution_role(),
            Capability::Pull,
        );
        self.push_stage(
            &mut builder,
            "DeployToProduction",
            vec![self.deploy_action("ProductionEcsDeployAction", &r.production)],
        );

        builder
    }

    /// Build and validate the delivery pipeline
    pub fn build(&self) -> PipespecResult<PipelineSpec> {
        self.builder().build()
    }

    /// The delivery pipeline as an editable manifest
    pub fn manifest(&self) -> PipespecResult<Manifest> {
        let spec = self.build()?;
        Ok(Manifest::from_spec(
            &spec,
            Some("Source, test, build, staging deploy, approval, production deploy".into()),
        ))
    }

    /// Values published for operators: clone URL, developer group, service URLs
    pub fn outputs(&self) -> BTreeMap<String, String> {
        let r = &self.resources;
        BTreeMap::from([
            ("GitRepo".to_string(), r.repository.clone_url()),
            ("Group".to_string(), r.repository.developer_group.clone()),
            ("RegistryUri".to_string(), r.registry.uri.clone()),
            ("StagingURL".to_string(), r.staging.service_url()),
            ("ProductionURL".to_string(), r.production.service_url()),
        ])
    }

    fn push_stage(&self, builder: &mut PipelineSpecBuilder, name: &str, actions: Vec<Action>) {
        // Stage names here are fixed and unique; a failure is still kept by the builder.
        if let Err(err) = builder.add_stage(name, actions) {
            debug!(stage = name, "{}", err);
        }
    }

    fn source_action(&self) -> Action {
        let repository = &self.resources.repository;
        Action::new(
            "CodeCommit",
            ActionKind::Source {
                repository: repository.name.clone(),
                branch: repository.branch.clone(),
            },
        )
        .with_output(SOURCE_OUTPUT)
    }

    fn deploy_action(&self, name: &str, service: &ServiceEnvironment) -> Action {
        Action::new(
            name,
            ActionKind::Deploy {
                service: service.target(),
                registry: Some(self.resources.registry.name.clone()),
            },
        )
        .with_input(BUILD_OUTPUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blueprint_stage_order() {
        let spec = DeliveryBlueprint::new(&DeliveryConfig::default()).build().unwrap();

        assert_eq!(
            spec.stage_names(),
            vec![
                "Source",
                "UnitTest",
                "Build",
                "DeployToStaging",
                "ManualApproval",
                "DeployToProduction"
            ]
        );
        assert_eq!(
            spec.artifact(SOURCE_OUTPUT).unwrap().consumers,
            vec!["UnitTest".to_string(), "Build".to_string()]
        );
        assert_eq!(
            spec.artifact(BUILD_OUTPUT).unwrap().consumers,
            vec!["DeployToStaging".to_string(), "DeployToProduction".to_string()]
        );
    }

    #[test]
    fn test_blueprint_uses_configured_desired_counts() {
        let spec = DeliveryBlueprint::new(&DeliveryConfig::default()).build().unwrap();

        let count = |stage: &str| match &spec.get_stage(stage).unwrap().actions[0].kind {
            ActionKind::Deploy { service, .. } => service.desired_count,
            _ => panic!("Expected deploy action"),
        };
        assert_eq!(count("DeployToStaging"), 1);
        assert_eq!(count("DeployToProduction"), 3);
    }

    #[test]
    fn test_blueprint_grants() {
        let spec = DeliveryBlueprint::new(&DeliveryConfig::default()).build().unwrap();

        let grants: Vec<(String, Capability, usize)> = spec
            .grants
            .iter()
            .map(|g| (g.grant.principal.clone(), g.grant.capability, g.position))
            .collect();

        assert_eq!(
            grants,
            vec![
                ("Developers".to_string(), Capability::Pull, 0),
                ("Developers".to_string(), Capability::Push, 0),
                ("ImageBuildProject-role".to_string(), Capability::Pull, 2),
                ("ImageBuildProject-role".to_string(), Capability::Push, 2),
                ("staging-execution-role".to_string(), Capability::Pull, 3),
                ("production-execution-role".to_string(), Capability::Pull, 5),
            ]
        );
    }

    #[test]
    fn test_approval_uses_notify_fallback_and_staging_url() {
        let mut config = DeliveryConfig::default();
        config.staging.load_balancer_dns = Some("staging-1.elb.amazonaws.com".into());
        let spec = DeliveryBlueprint::new(&config).build().unwrap();

        match &spec.get_stage("ManualApproval").unwrap().actions[0].kind {
            ActionKind::Approval {
                notify,
                external_link,
            } => {
                assert_eq!(notify, &vec!["email@example.com".to_string()]);
                assert_eq!(external_link.as_deref(), Some("http://staging-1.elb.amazonaws.com"));
            }
            _ => panic!("Expected approval action"),
        }
    }

    #[test]
    fn test_build_env_passthrough() {
        let config = DeliveryConfig::default();
        let spec = DeliveryBlueprint::new(&config).build().unwrap();

        match &spec.get_stage("Build").unwrap().actions[0].kind {
            ActionKind::Build {
                env, privileged, ..
            } => {
                assert!(*privileged);
                assert_eq!(env["CONTAINER_NAME"], "web");
                assert_eq!(env["REPOSITORY_URI"], config.registry.resolved_uri());
            }
            _ => panic!("Expected build action"),
        }
    }

    #[test]
    fn test_manifest_round_trip() {
        let blueprint = DeliveryBlueprint::new(&DeliveryConfig::default());
        let manifest = blueprint.manifest().unwrap();

        assert_eq!(manifest.stages[0].grants.len(), 2);
        assert_eq!(manifest.build().unwrap(), blueprint.build().unwrap());
    }

    #[test]
    fn test_custom_health_check_reaches_spec_and_manifest() {
        let mut config = DeliveryConfig::default();
        config.health_check.interval_secs = 30;
        config.health_check.timeout_secs = 20;
        let blueprint = DeliveryBlueprint::new(&config);
        let spec = blueprint.build().unwrap();

        match &spec.get_stage("DeployToProduction").unwrap().actions[0].kind {
            ActionKind::Deploy { service, .. } => {
                let check = service.health_check.as_ref().unwrap();
                assert_eq!((check.interval_secs, check.timeout_secs), (30, 20));
                assert_eq!(service.env["APP_ENV"], "production");
            }
            _ => panic!("Expected deploy action"),
        }

        let yaml = spec.to_yaml().unwrap();
        assert!(yaml.contains("interval_secs: 30"));
        assert!(yaml.contains("APP_ENV: staging"));

        let manifest = blueprint.manifest().unwrap();
        assert!(manifest.to_yaml().unwrap().contains("timeout_secs: 20"));
        assert_eq!(manifest.build().unwrap(), spec);
    }

    #[test]
    fn test_with_resources_overrides_handles() {
        let config = DeliveryConfig::default();
        let mut resources = DeliveryResources::from_config(&config);
        resources.production = ServiceEnvironment::new("prod", 2);

        let blueprint = DeliveryBlueprint::with_resources(&config, resources);
        assert_eq!(blueprint.resources().production.service_name(), "prod-web");

        let spec = blueprint.build().unwrap();
        assert_eq!(spec.grants[5].grant.principal, "prod-execution-role");
        assert_eq!(blueprint.outputs()["ProductionURL"], "http://prod-web.elb.example.com");
    }

    #[test]
    fn test_outputs() {
        let outputs = DeliveryBlueprint::new(&DeliveryConfig::default()).outputs();
        assert_eq!(outputs["GitRepo"], "codecommit://MyAppRepository");
        assert_eq!(outputs["Group"], "Developers");
    }
}
