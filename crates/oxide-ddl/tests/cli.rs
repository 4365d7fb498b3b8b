//! End-to-end tests of the `oxide-ddl` binary.

mod common;

use std::path::{Path, PathBuf};
use std::process::Command;

use common::{catalog_change, column, list, modified_table, mydb, table1};
use oxide_ddl::prelude::*;
use tempfile::TempDir;

fn write_json<T: serde::Serialize>(dir: &Path, name: &str, value: &T) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
    path
}

fn oxide_ddl(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_oxide-ddl"))
        .args(args)
        .env_remove("OXIDE_DDL_TARGET_VERSION")
        .output()
        .unwrap()
}

#[test]
fn test_export_to_stdout() {
    let dir = TempDir::new().unwrap();
    let catalog = write_json(dir.path(), "model.json", &mydb(vec![table1()]));

    let output = oxide_ddl(&["export", "--catalog", catalog.to_str().unwrap()]);
    assert!(output.status.success());
    let script = String::from_utf8(output.stdout).unwrap();
    assert!(script.starts_with("-- MySQL Forward Engineering\n"));
    assert!(script.contains("CREATE TABLE IF NOT EXISTS `mydb`.`table1` ("));
}

#[test]
fn test_report_to_output_file() {
    let dir = TempDir::new().unwrap();
    let old_table = table1();
    let mut new_table = table1();
    new_table.columns.pop();
    let old = mydb(vec![old_table.clone()]);
    let new = mydb(vec![new_table.clone()]);
    let change = catalog_change(
        &old,
        &new,
        vec![modified_table(
            &old_table,
            &new_table,
            vec![list(
                "columns",
                vec![ListItemChange::Removed {
                    value: column(&old_table.columns[2]),
                }],
            )],
        )],
    );
    let source = write_json(dir.path(), "old.json", &old);
    let target = write_json(dir.path(), "new.json", &new);
    let change = write_json(dir.path(), "change.json", &change);
    let report = dir.path().join("report.txt");

    let output = oxide_ddl(&[
        "--output",
        report.to_str().unwrap(),
        "report",
        "--source",
        source.to_str().unwrap(),
        "--target",
        target.to_str().unwrap(),
        "--change",
        change.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let text = std::fs::read_to_string(report).unwrap();
    assert!(text.contains("Table `mydb`.`table1` was modified"));
    assert!(text.contains("Column `email` was dropped"));
}

#[test]
fn test_missing_catalog_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.json");

    let output = oxide_ddl(&["export", "--catalog", missing.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("absent.json"));
}

#[test]
fn test_rejects_malformed_target_version() {
    let dir = TempDir::new().unwrap();
    let catalog = write_json(dir.path(), "model.json", &mydb(vec![table1()]));

    let output = oxide_ddl(&[
        "--target-version",
        "eight",
        "export",
        "--catalog",
        catalog.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
}
