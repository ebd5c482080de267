//! `--config` handling

use predicates::prelude::*;

use crate::common::{SCRIPT, Workspace};

#[test]
fn invalid_config_is_reported_with_path() {
    let ws = Workspace::new();
    let file = ws.write("script.ksp", SCRIPT);
    let config = ws.config("[compiler\n");

    ws.ksp()
        .arg("--config")
        .arg(&config)
        .arg("symbols")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"))
        .stderr(predicate::str::contains("config.toml"));
}

#[test]
fn unknown_config_section_is_rejected() {
    let ws = Workspace::new();
    let file = ws.write("script.ksp", SCRIPT);
    let config = ws.config("[validat]\nenabled = true\n");

    ws.ksp()
        .arg("--config")
        .arg(&config)
        .arg("symbols")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("validat"));
}

#[test]
fn missing_explicit_config_fails() {
    let ws = Workspace::new();
    let file = ws.write("script.ksp", SCRIPT);

    ws.ksp()
        .arg("--config")
        .arg(ws.path().join("absent.toml"))
        .arg("symbols")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[cfg(unix)]
#[test]
fn default_config_is_read_from_home() {
    let ws = Workspace::new();
    let file = ws.write("script.ksp", SCRIPT);
    std::fs::create_dir(ws.path().join(".ksp")).unwrap();
    std::fs::write(ws.path().join(".ksp").join("config.toml"), "[compiler\n").unwrap();

    ws.ksp()
        .arg("symbols")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}
