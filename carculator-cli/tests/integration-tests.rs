use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::{CommandCargoExt, OutputAssertExt};
use predicates::prelude::predicate;

fn asset(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../carculator-core/tests/assets")
        .join(name)
}

#[test]
fn test_that_cli_app_produces_electricity_mix() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("carculator-cli")?;
    cmd.args([
        "electricity-mix",
        "--model",
        "remind",
        "--file",
        asset("remind_electricity.csv").to_str().unwrap(),
        "--region",
        "EUR",
        "--years",
        "2020,2030",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"technologies\":[\"Hydro\",\"Nuclear\""))
        .stdout(predicate::str::contains("\"years\":[2020,2030]"));
    Ok(())
}

#[test]
fn test_that_cli_app_reports_scope_mismatch() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("carculator-cli")?;
    cmd.args([
        "fleet-array",
        "--file",
        asset("fleet_array_2020_vintages.csv").to_str().unwrap(),
        "--scope",
        asset("scope.yaml").to_str().unwrap(),
    ]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("vintage year list differs"));
    Ok(())
}

#[test]
fn test_that_cli_app_writes_output_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("fleet.yaml");
    let mut cmd = Command::cargo_bin("carculator-cli")?;
    cmd.args([
        "fleet-composition",
        "--file",
        asset("fleet_composition.csv").to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ]);
    cmd.assert().success();
    let written = std::fs::read_to_string(output)?;
    assert!(written.contains("regions"));
    Ok(())
}

#[test]
fn test_that_cli_app_reports_missing_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("carculator-cli")?;
    cmd.args(["fleet-composition", "--file", "no/such/file.csv"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Could not locate no/such/file.csv"));
    Ok(())
}
