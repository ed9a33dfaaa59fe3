use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

fn tenantgate() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("tenantgate").unwrap()
}

#[test]
fn decode_prints_grants() {
    tenantgate()
        .args(["acl", "decode", "h:none|a:a1/or|t:team1/rw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hash: none"))
        .stdout(predicate::str::contains("team1"))
        .stdout(predicate::str::contains("read,write"))
        .stdout(predicate::str::contains("owner,read"));
}

#[test]
fn decode_json_is_structured() -> Result<(), Box<dyn std::error::Error>> {
    let output = tenantgate()
        .args(["acl", "decode", "--json", "h:none|m:1|t:team1/rw"])
        .output()?;
    assert!(output.status.success());

    let parsed: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(parsed["hashAlgorithm"], "none");
    assert_eq!(parsed["migrated"], true);
    assert_eq!(parsed["entries"]["team"]["team1"], serde_json::json!(["read", "write"]));
    Ok(())
}

#[test]
fn decode_rejects_malformed_input() {
    tenantgate()
        .args(["acl", "decode", "h:none|t:team1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse ACL"));
}

#[test]
fn hash_matches_algorithm() {
    tenantgate()
        .args(["acl", "hash", "--algorithm", "none", "team1"])
        .assert()
        .success()
        .stdout("team1\n");

    tenantgate()
        .args(["acl", "hash", "team1"])
        .assert()
        .success()
        .stdout(predicate::str::is_match("^[0-9a-f]{16}\n$").unwrap());

    tenantgate()
        .args(["acl", "hash", "--algorithm", "md5", "team1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Known algorithms"));
}

#[test]
fn check_grants_exact_levels() {
    tenantgate()
        .args([
            "acl", "check", "h:none|t:team1/rw", "--role", "team", "--id", "team1", "--level",
            "read,write",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Access Granted"));
}

#[test]
fn check_denies_with_exit_code() {
    // Owner is not implied by read+write
    tenantgate()
        .args([
            "acl", "check", "h:none|t:team1/rw", "--role", "team", "--id", "team1", "--level",
            "owner",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Access Denied"));

    // Same id under another role
    tenantgate()
        .args([
            "acl", "check", "h:none|t:team1/rw", "--role", "agent", "--id", "team1", "--level",
            "read",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Access Denied"));
}

#[test]
fn config_check_lists_active_connectors() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let storage_root = dir.path().join("data");
    fs::write(
        dir.path().join("tenantgate.yml"),
        format!(
            r#"
acl:
  hash_algorithm: xxh3
connectors:
  storage:
    name: LocalStorage
    settings:
      root: {}
  cache:
    name: RAM
  log:
    name: Console
"#,
            storage_root.display()
        ),
    )?;

    tenantgate()
        .current_dir(dir.path())
        .args(["config", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration OK"))
        .stdout(predicate::str::contains("LocalStorage"))
        .stdout(predicate::str::contains("Console"));
    Ok(())
}

#[test]
fn config_check_fails_on_unknown_connector() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let config = dir.path().join("custom.yml");
    fs::write(&config, "connectors:\n  vector_db:\n    name: Pinecone\n")?;

    tenantgate()
        .args(["config", "check", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Pinecone"));
    Ok(())
}
