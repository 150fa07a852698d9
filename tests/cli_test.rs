//! End-to-end binary tests: load a JSON-IR program, slice, and check the
//! interchange output and error surfaces.

use assert_cmd::Command;
use indoc::indoc;
use predicates::prelude::*;
use std::fs;

const PROGRAM_JSON: &str = indoc! {r#"
    {
      "classes": [
        {"name": "app.A"},
        {"name": "app.B"}
      ],
      "methods": [
        {
          "ref": {"class": "app.A", "name": "run", "ret": "void"},
          "params": ["this"],
          "body": [
            {"op": "alloc", "target": "b", "class": "app.B"},
            {"op": "invoke", "kind": "virtual",
             "signature": {"class": "app.B", "name": "helper", "ret": "void"},
             "receiver": "b"}
          ]
        },
        {
          "ref": {"class": "app.B", "name": "helper", "ret": "void"},
          "params": ["this"]
        }
      ]
    }
"#};

fn write_program(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("program.json");
    fs::write(&path, PROGRAM_JSON).unwrap();
    path
}

#[test]
fn slice_emits_the_minimal_interchange_record() {
    let dir = tempfile::tempdir().unwrap();
    let program = write_program(&dir);

    let output = Command::cargo_bin("context-slicer")
        .unwrap()
        .arg("slice")
        .arg(&program)
        .args(["--target", "<app.B: void helper()>"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["mutated_method"], "<app.B: void helper()>");
    assert_eq!(value["callers"], serde_json::json!(["<app.A: void run()>"]));
    assert!(value.get("caller_contexts").is_none());
}

#[test]
fn extended_flag_adds_call_site_evidence() {
    let dir = tempfile::tempdir().unwrap();
    let program = write_program(&dir);

    let output = Command::cargo_bin("context-slicer")
        .unwrap()
        .arg("slice")
        .arg(&program)
        .args(["--target", "<app.B: void helper()>", "--extended"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(
        value["caller_contexts"][0]["call_sites"],
        serde_json::json!(["<app.A: void run()>#1"])
    );
}

#[test]
fn slice_writes_to_an_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let program = write_program(&dir);
    let out = dir.path().join("slice.json");

    Command::cargo_bin("context-slicer")
        .unwrap()
        .arg("slice")
        .arg(&program)
        .args(["--target", "<app.B: void helper()>"])
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(value["mutated_method"], "<app.B: void helper()>");
}

#[test]
fn undefined_target_fails_with_a_typed_message() {
    let dir = tempfile::tempdir().unwrap();
    let program = write_program(&dir);

    Command::cargo_bin("context-slicer")
        .unwrap()
        .arg("slice")
        .arg(&program)
        .args(["--target", "<app.B: void gone()>"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("target method not found"));
}

#[test]
fn malformed_signature_is_rejected_before_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let program = write_program(&dir);

    Command::cargo_bin("context-slicer")
        .unwrap()
        .arg("slice")
        .arg(&program)
        .args(["--target", "app.B.helper"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid method signature"));
}

#[test]
fn graph_subcommand_reports_construction_stats() {
    let dir = tempfile::tempdir().unwrap();
    let program = write_program(&dir);

    let output = Command::cargo_bin("context-slicer")
        .unwrap()
        .arg("graph")
        .arg(&program)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["methods"], 2);
    assert_eq!(value["edges"], 1);
    assert_eq!(value["phantom_targets"], 0);
}

#[test]
fn malformed_program_model_aborts_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    // Virtual call without a receiver is structurally inconsistent.
    fs::write(
        &path,
        indoc! {r#"
            {
              "methods": [
                {
                  "ref": {"class": "app.A", "name": "run", "ret": "void"},
                  "body": [
                    {"op": "invoke", "kind": "virtual",
                     "signature": {"class": "app.B", "name": "helper", "ret": "void"}}
                  ]
                }
              ]
            }
        "#},
    )
    .unwrap();

    Command::cargo_bin("context-slicer")
        .unwrap()
        .arg("slice")
        .arg(&path)
        .args(["--target", "<app.A: void run()>"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed program model"));
}
