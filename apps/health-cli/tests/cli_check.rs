use assert_cmd::prelude::*; // Add methods on commands
use assert_fs::prelude::*;
use predicates::prelude::*; // Used for writing assertions
use std::process::Command;

fn pg_health(home: &assert_fs::TempDir) -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("pg-health")?;
    cmd.env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("PG_HEALTH_POSTGRES__PRIMARY_URL");
    Ok(cmd)
}

#[test]
#[serial_test::serial(cli)]
fn list_shows_the_catalog() -> Result<(), Box<dyn std::error::Error>> {
    let home = assert_fs::TempDir::new()?;

    pg_health(&home)?
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("unused_indexes"))
        .stdout(predicate::str::contains("tables_with_missing_indexes"))
        .stdout(predicate::str::contains("37 diagnostics available"));

    Ok(())
}

#[test]
#[serial_test::serial(cli)]
fn list_json_is_parseable() -> Result<(), Box<dyn std::error::Error>> {
    let home = assert_fs::TempDir::new()?;

    let output = pg_health(&home)?.args(["list", "--json"]).output()?;
    assert!(output.status.success());
    let catalog: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let diagnostics = catalog.as_array().expect("a JSON array");
    assert_eq!(diagnostics.len(), 37);
    let unused = diagnostics
        .iter()
        .find(|d| d["name"] == "unused_indexes")
        .expect("unused_indexes is listed");
    assert_eq!(unused["topology"], "ACROSS_CLUSTER");
    assert_eq!(unused["merge_strategy"], "intersection");

    Ok(())
}

#[test]
#[serial_test::serial(cli)]
fn check_rejects_bad_schema_before_connecting() -> Result<(), Box<dyn std::error::Error>> {
    let home = assert_fs::TempDir::new()?;

    pg_health(&home)?
        .args(["check", "--schema", "public; drop table clients"])
        .args(["--primary-url", "postgres://nobody@127.0.0.1:1/none"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Invalid schema name"));

    Ok(())
}

#[test]
#[serial_test::serial(cli)]
fn check_rejects_unknown_diagnostics() -> Result<(), Box<dyn std::error::Error>> {
    let home = assert_fs::TempDir::new()?;

    pg_health(&home)?
        .args(["check", "unused_indexes", "slow_queries"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Unknown diagnostic(s): slow_queries"));

    Ok(())
}

#[test]
#[serial_test::serial(cli)]
fn check_reads_settings_from_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let home = assert_fs::TempDir::new()?;
    home.child(".pg-health").create_dir_all()?;
    home.child(".pg-health/config.toml")
        .write_str("[check]\nschema = \"1nvalid\"\n")?;

    pg_health(&home)?
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Invalid schema name '1nvalid'"));

    Ok(())
}

#[test]
#[serial_test::serial(cli)]
fn missing_explicit_config_fails() -> Result<(), Box<dyn std::error::Error>> {
    let home = assert_fs::TempDir::new()?;

    pg_health(&home)?
        .args(["--config", "/nonexistent/pg-health.toml", "list"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Failed to read settings"));

    Ok(())
}

#[test]
#[serial_test::serial(cli)]
fn migrations_validate_generator_settings() -> Result<(), Box<dyn std::error::Error>> {
    let home = assert_fs::TempDir::new()?;
    home.child(".pg-health").create_dir_all()?;
    home.child(".pg-health/config.toml")
        .write_str("[generator]\nindentation = 10\n")?;

    pg_health(&home)?
        .args(["check", "foreign_keys_without_index", "--generate-migrations"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("indentation should be in the range [0, 8]"));

    pg_health(&home)?
        .args(["check", "--generate-migrations", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));

    Ok(())
}

#[test]
#[serial_test::serial(cli)]
fn version_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let home = assert_fs::TempDir::new()?;

    pg_health(&home)?
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "pg-health {}",
            env!("CARGO_PKG_VERSION")
        )));

    Ok(())
}
