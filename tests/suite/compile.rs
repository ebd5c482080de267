//! `ksp compile`

use predicates::prelude::*;

use crate::common::{UPPERCASE, Workspace};

#[test]
fn prints_compiled_text_without_output_path() {
    let ws = Workspace::new();
    let input = ws.write("in.ksp", "on init\nend on\n");
    let config = ws.raw_compiler(UPPERCASE);

    ws.ksp()
        .arg("--config")
        .arg(&config)
        .arg("compile")
        .arg(&input)
        .assert()
        .success()
        .stdout("ON INIT\nEND ON\n");
}

#[test]
fn writes_output_file_when_given() {
    let ws = Workspace::new();
    let input = ws.write("in.ksp", "on init\nend on\n");
    let output = ws.path().join("out.txt");
    let config = ws.raw_compiler(UPPERCASE);

    ws.ksp()
        .arg("--config")
        .arg(&config)
        .arg("compile")
        .arg(&input)
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("out.txt"));

    assert_eq!(std::fs::read_to_string(&output).unwrap(), "ON INIT\nEND ON\n");
}

#[test]
fn failed_compile_reports_diagnostics_and_exit_code() {
    let ws = Workspace::new();
    let input = ws.write("in.ksp", "on init\n");
    let config = ws.raw_compiler(
        "while [ $# -gt 2 ]; do shift; done\necho \"ERROR $1:1: missing end on\"\nexit 4\n",
    );

    ws.ksp()
        .arg("--config")
        .arg(&config)
        .arg("compile")
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("in.ksp:1: error: [ksp] missing end on"))
        .stderr(predicate::str::contains("exit code 4"));
}
