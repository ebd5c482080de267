//! `ksp symbols`

use predicates::prelude::*;

use crate::common::{SCRIPT, Workspace};

#[test]
fn lists_declarations_one_per_line() {
    let ws = Workspace::new();
    let file = ws.write("script.ksp", SCRIPT);

    ws.ksp()
        .arg("symbols")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("1:4\tinit\tCallback"))
        .stdout(predicate::str::contains("2:13\t$count\tVariable (Integer)"))
        .stdout(predicate::str::contains("3:21\t$volume\tUI Variable (ui_knob)"))
        .stdout(predicate::str::contains(
            "6:4\tui_control\tUI Callback for $volume",
        ));
}

#[test]
fn json_output_is_an_array_of_symbols() {
    let ws = Workspace::new();
    let file = ws.write("script.ksp", SCRIPT);

    let output = ws
        .ksp()
        .args(["symbols", "--json"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success());

    let symbols: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let symbols = symbols.as_array().unwrap();
    assert_eq!(symbols.len(), 4);
    assert_eq!(symbols[1]["name"], "count");
    assert_eq!(symbols[1]["kind"], "variable");
    assert_eq!(symbols[1]["type"], "integer");
    assert_eq!(symbols[3]["ui_type"], "ui_knob");
}

#[test]
fn missing_file_fails_with_path() {
    let ws = Workspace::new();

    ws.ksp()
        .arg("symbols")
        .arg(ws.path().join("absent.ksp"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"))
        .stderr(predicate::str::contains("absent.ksp"));
}
