//! Tests for the query-validator binary.

mod common;

use assert_cmd::Command;
use common::ModuleBuilder;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cli() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("query-validator").unwrap()
}

#[test]
fn test_sql_pass_exits_zero() {
    cli()
        .args(["sql", "--chain", "evm", "--param", "min_height=100"])
        .arg("SELECT * FROM blocks WHERE height > ${min_height}")
        .assert()
        .success()
        .stdout(predicate::str::contains("SQL query for EVM is valid"));
}

#[test]
fn test_sql_fail_exits_one_and_names_parameter() {
    cli()
        .args(["sql", "--chain", "evm"])
        .arg("SELECT * FROM blocks WHERE height > ${min_height}")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[E102]"))
        .stdout(predicate::str::contains("min_height"));
}

#[test]
fn test_sql_json_output() {
    let output = cli()
        .args(["--json", "sql", "--chain", "sui"])
        .arg("SELECT t.gas_used AS checkpoint FROM transactions t")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["target"], "sql");
    assert_eq!(json["chain"], "sui");
    assert_eq!(json["status"], "fail");
    assert_eq!(json["kind"], "chain_rule_violation");
    assert_eq!(json["code"], "E201");
    assert!(json["message"].as_str().unwrap().contains("checkpoint"));
}

#[test]
fn test_query_and_parameters_from_files() {
    let temp_dir = TempDir::new().unwrap();
    let query_path = temp_dir.path().join("query.sql");
    let params_path = temp_dir.path().join("params.json");
    fs::write(
        &query_path,
        "SELECT hash\nFROM blocks\nWHERE height > ${min_height}\n",
    )
    .unwrap();
    fs::write(&params_path, r#"{"min_height": "5"}"#).unwrap();

    cli()
        .args(["sql", "--chain", "aptos", "--file"])
        .arg(&query_path)
        .arg("--params")
        .arg(&params_path)
        .assert()
        .success();

    // --param overrides the file value.
    fs::write(&params_path, r#"[["min_height", "5"]]"#).unwrap();
    cli()
        .args(["sql", "--chain", "aptos", "--param", "min_height=7", "--file"])
        .arg(&query_path)
        .arg("--params")
        .arg(&params_path)
        .assert()
        .success();
}

#[test]
fn test_missing_query_file_exits_two() {
    cli()
        .args(["sql", "--chain", "sui", "--file", "/nonexistent/query.sql"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to read query file"));
}

#[test]
fn test_bad_param_syntax_exits_two() {
    cli()
        .args(["render", "--param", "oops", "SELECT a AS x FROM t"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("KEY=VALUE"));
}

#[test]
fn test_unknown_chain_is_a_usage_error() {
    cli()
        .args(["sql", "--chain", "solana", "SELECT 1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("solana"));
}

#[test]
fn test_render_duplicate_field() {
    cli()
        .args(["render", "SELECT a AS x, b AS x FROM t"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Render query is invalid"))
        .stdout(predicate::str::contains("duplicate render field `x`"));
}

#[test]
fn test_bytecode_command() {
    let temp_dir = TempDir::new().unwrap();
    let module_path = temp_dir.path().join("daemon.wasm");
    fs::write(
        &module_path,
        ModuleBuilder::assembly_script()
            .import_function("env", "abort")
            .build(),
    )
    .unwrap();

    cli()
        .args(["bytecode", "--chain", "sui"])
        .arg(&module_path)
        .assert()
        .success();

    cli()
        .args(["bytecode", "--chain", "aptos"])
        .arg(&module_path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("env.abort"));
}

#[test]
fn test_chains_command_lists_registry() {
    cli()
        .arg("chains")
        .assert()
        .success()
        .stdout(predicate::str::contains("SUI"))
        .stdout(predicate::str::contains("mamoru_evm.get_blocks"))
        .stdout(predicate::str::contains("Render"));

    let output = cli().args(["chains", "--json"]).output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let chains = json["chains"].as_array().unwrap();
    assert_eq!(chains.len(), 3);
    assert_eq!(chains[1]["chain"], "evm");
    assert_eq!(chains[1]["bytecode"]["max_memory_pages"], 512);
    assert!(json["render"]["tables"].is_null());
    assert_eq!(json["limits"]["max_query_bytes"], 65536);
}

#[test]
fn test_verbose_logs_go_to_stderr() {
    cli()
        .args(["--verbose", "sql", "--chain", "sui", "SELECT seq FROM transactions"])
        .assert()
        .success()
        .stderr(predicate::str::contains("validating SQL query"));
}
