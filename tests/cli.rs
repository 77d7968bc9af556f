use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_names_the_subcommands() {
    Command::cargo_bin("nodemark")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("init-config"))
        .stdout(predicate::str::contains("version-check"));
}

#[test]
fn init_config_writes_the_template() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("benchmark.toml");

    Command::cargo_bin("nodemark")
        .unwrap()
        .arg("init-config")
        .arg("--path")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default configuration"));

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("measurement_interval"));
    assert!(raw.contains("success_size_threshold"));
}

#[test]
fn init_config_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("benchmark.toml");
    std::fs::write(&path, "# operator edits live here\n").unwrap();

    Command::cargo_bin("nodemark")
        .unwrap()
        .arg("init-config")
        .arg("--path")
        .arg(&path)
        .assert()
        .failure()
        .code(2);

    // The existing file is untouched.
    let raw = std::fs::read_to_string(&path).unwrap();
    assert_eq!(raw, "# operator edits live here\n");
}
