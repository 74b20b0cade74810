//! CLI integration tests for hypergraph
//!
//! Runs the binary end-to-end against a throwaway database and config directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// Isolated config directory and database file
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    #[allow(deprecated)]
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("hypergraph").unwrap();
        cmd.env("HYPERGRAPH_CONFIG_DIR", self.dir.path().join("config"));
        cmd.env_remove("HYPERGRAPH_DEFAULT_ORG");
        cmd.env("RUST_LOG", "off");
        cmd.arg("--db").arg(self.dir.path().join("graph.db"));
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "{:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    fn create_entity(&self, entity_type: &str, attrs: &str) -> String {
        let entity = self.json(&["entity", "create", "--type", entity_type, "--attrs", attrs]);
        entity["id"].as_str().unwrap().to_string()
    }
}

#[test]
fn test_help() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Multi-tenant hypergraph store"));
}

#[test]
fn test_entity_lifecycle() {
    let sandbox = Sandbox::new();
    let id = sandbox.create_entity("Developer", r#"{"name": "Ada"}"#);

    let fetched = sandbox.json(&["entity", "get", &id]);
    assert_eq!(fetched["type"], "Developer");
    assert_eq!(fetched["attributes"]["name"], "Ada");

    let updated = sandbox.json(&["entity", "update", &id, "--attrs", r#"{"level": 3}"#]);
    assert_eq!(updated["attributes"]["name"], "Ada");
    assert_eq!(updated["attributes"]["level"], 3);

    sandbox
        .cmd()
        .args(["entity", "delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("deleted"));

    sandbox
        .cmd()
        .args(["entity", "get", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_entity_list_filters() {
    let sandbox = Sandbox::new();
    let rust_dev = sandbox.create_entity("Dev", r#"{"lang": "rust"}"#);
    sandbox.create_entity("Dev", r#"{"lang": "go"}"#);
    sandbox.create_entity("Proj", r#"{"lang": "rust"}"#);

    let listed = sandbox.json(&["entity", "list", "--type", "Dev", "--attr", "lang=rust"]);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], rust_dev.as_str());

    let paged = sandbox.json(&["entity", "list", "--limit", "2", "--offset", "2"]);
    assert_eq!(paged.as_array().unwrap().len(), 1);
}

#[test]
fn test_relations_and_navigation() {
    let sandbox = Sandbox::new();
    let dev = sandbox.create_entity("Dev", "{}");
    let proj = sandbox.create_entity("Proj", "{}");
    sandbox.create_entity("Dev", "{}");

    let relation = sandbox.json(&[
        "relation", "create", "--type", "WorksOn", "--source", &dev, "--target", &proj,
    ]);
    let relation_id = relation["id"].as_str().unwrap();

    let endpoints = sandbox.json(&["relation", "endpoints", relation_id]);
    assert_eq!(endpoints["source"]["id"], dev.as_str());
    assert_eq!(endpoints["target"]["id"], proj.as_str());

    let graph = sandbox.json(&["navigate", &dev, "--depth", "1"]);
    assert_eq!(graph["entities"].as_array().unwrap().len(), 2);
    assert_eq!(graph["relations"][0]["id"], relation_id);

    let filtered = sandbox.json(&["navigate", &dev, "--relation-type", "Manages"]);
    assert_eq!(filtered["entities"].as_array().unwrap().len(), 1);

    let stats = sandbox.json(&["stats"]);
    assert_eq!(stats["totalEntities"], 3);
    assert_eq!(stats["totalRelations"], 1);
}

#[test]
fn test_scale_compresses_by_type() {
    let sandbox = Sandbox::new();
    sandbox.create_entity("Dev", "{}");
    sandbox.create_entity("Dev", "{}");
    sandbox.create_entity("Proj", "{}");

    let scaled = sandbox.json(&["scale", "--mode", "compress", "--level", "folder"]);
    let entities = scaled["entities"].as_array().unwrap();
    assert_eq!(entities.len(), 2);
    assert_eq!(entities[0]["id"], "aggregated_Dev");
    assert_eq!(entities[0]["attributes"]["count"], 2);

    // Nothing was written back
    let stats = sandbox.json(&["stats"]);
    assert_eq!(stats["totalEntities"], 3);
}

#[test]
fn test_export_and_import() {
    let source = Sandbox::new();
    let id = source.create_entity("Dev", r#"{"name": "Ada"}"#);
    let export_dir = source.dir.path().join("export");

    source
        .cmd()
        .args(["export", export_dir.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 entities"));

    let target = Sandbox::new();
    let summary = target.json(&["import", export_dir.to_str().unwrap()]);
    assert_eq!(summary["entitiesImported"], 1);

    let fetched = target.json(&["entity", "get", &id]);
    assert_eq!(fetched["attributes"]["name"], "Ada");

    // Importing again skips records that already exist
    let again = target.json(&["import", export_dir.to_str().unwrap()]);
    assert_eq!(again["entitiesImported"], 0);
    assert_eq!(again["skipped"], 1);
}

#[test]
fn test_config_set_and_get() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["config", "set", "query.default_org", "acme"])
        .assert()
        .success();

    sandbox
        .cmd()
        .args(["config", "get", "query.default_org"])
        .assert()
        .success()
        .stdout(predicate::str::contains("acme"));

    sandbox
        .cmd()
        .args(["config", "set", "query.max_query_depth", "0"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_attributes_are_rejected() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["entity", "create", "--type", "Dev", "--attrs", "[1, 2]"])
        .assert()
        .failure();
}
