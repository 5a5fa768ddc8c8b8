// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! End-to-end tests for the pipespec binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const DEPLOY_BEFORE_BUILD: &str = r#"
name: "broken"
stages:
  - name: Source
    actions:
      - name: Checkout
        kind:
          type: source
          repository: app
        output: sourceOutput
  - name: DeployToStaging
    actions:
      - name: Deploy
        kind:
          type: deploy
          service:
            name: staging-web
            execution_role: staging-role
          registry: app-registry
        input: buildOutput
  - name: Build
    actions:
      - name: ImageBuild
        kind:
          type: build
          build_spec: buildspec.deploy.yml
        input: sourceOutput
        output: buildOutput
"#;

fn pipespec(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pipespec").unwrap();
    cmd.current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env_remove("NOTIFY_EMAILS")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn init_then_validate() {
    let dir = TempDir::new().unwrap();

    pipespec(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created .pipespec.yaml"));

    assert!(dir.path().join(".pipespec.yaml").exists());

    pipespec(&dir)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pipeline is valid"));
}

#[test]
fn init_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    pipespec(&dir).arg("init").assert().success();

    pipespec(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    pipespec(&dir).args(["init", "--force"]).assert().success();
}

#[test]
fn init_uses_notify_emails_env() {
    let dir = TempDir::new().unwrap();

    pipespec(&dir)
        .env("NOTIFY_EMAILS", "ops@example.org,lead@example.org")
        .arg("init")
        .assert()
        .success();

    let manifest = std::fs::read_to_string(dir.path().join(".pipespec.yaml")).unwrap();
    assert!(manifest.contains("ops@example.org"));
    assert!(manifest.contains("lead@example.org"));
    assert!(!manifest.contains("email@example.com"));
}

#[test]
fn validate_reports_every_violation() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".pipespec.yaml"), DEPLOY_BEFORE_BUILD).unwrap();

    pipespec(&dir)
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("[artifact-not-yet-produced]"))
        .stdout(predicate::str::contains("[missing-permission]"));
}

#[test]
fn validate_missing_manifest() {
    let dir = TempDir::new().unwrap();

    pipespec(&dir)
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("pipespec init"));
}

#[test]
fn graph_mermaid() {
    let dir = TempDir::new().unwrap();
    pipespec(&dir).arg("init").assert().success();

    pipespec(&dir)
        .args(["graph", "--format", "mermaid"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("graph TD"))
        .stdout(predicate::str::contains("buildOutput"));
}

#[test]
fn plan_json_is_ordered() {
    let dir = TempDir::new().unwrap();
    pipespec(&dir).arg("init").assert().success();

    let output = pipespec(&dir).args(["plan", "-f", "json"]).output().unwrap();
    assert!(output.status.success());

    let spec: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = spec["stages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "Source",
            "UnitTest",
            "Build",
            "DeployToStaging",
            "ManualApproval",
            "DeployToProduction"
        ]
    );
}

#[test]
fn rehearse_rejection_skips_production() {
    let dir = TempDir::new().unwrap();
    pipespec(&dir).arg("init").assert().success();

    pipespec(&dir)
        .args(["rehearse", "--reject", "staging is broken"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pipeline halted at ManualApproval"))
        .stdout(predicate::str::contains("skipped: DeployToProduction"));
}

#[test]
fn blueprint_reads_toml_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("delivery.toml"),
        r#"
pipeline_name = "ShopPipeline"

[production]
desired_count = 5
"#,
    )
    .unwrap();

    pipespec(&dir)
        .args(["blueprint", "--config", "delivery.toml", "--format", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name: ShopPipeline"))
        .stdout(predicate::str::contains("desired_count: 5"));
}

#[test]
fn blueprint_shows_services_and_health_check() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("delivery.yaml"),
        "health_check:\n  interval_secs: 30\n  timeout_secs: 20\nstaging:\n  load_balancer_dns: staging-1.elb.amazonaws.com\n",
    )
    .unwrap();

    pipespec(&dir)
        .args(["blueprint", "--config", "delivery.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("staging-web (1 instance(s), APP_ENV=staging)"))
        .stdout(predicate::str::contains("every 30s, timeout 20s"))
        .stdout(predicate::str::contains("http://staging-1.elb.amazonaws.com"));
}

#[test]
fn verbose_validate_explains_fixes() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".pipespec.yaml"), DEPLOY_BEFORE_BUILD).unwrap();

    pipespec(&dir)
        .args(["validate", "--verbose"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Move stage 'Build' before 'DeployToStaging'"))
        .stdout(predicate::str::contains("pipespec graph --format mermaid"));
}
