//! `ksp check` against a shell script standing in for the compiler

use predicates::prelude::*;

use crate::common::{SCRIPT, Workspace};

#[test]
fn error_diagnostic_fails_the_check() {
    let ws = Workspace::new();
    let file = ws.write("script.ksp", SCRIPT);
    let config = ws.fake_compiler(r#"echo "ERROR $input:3: missing end""#);

    ws.ksp()
        .arg("--config")
        .arg(&config)
        .arg("check")
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "script.ksp:3: error: [ksp] missing end",
        ))
        .stderr(predicate::str::contains("E:1 W:0"));
}

#[test]
fn warnings_alone_pass() {
    let ws = Workspace::new();
    let file = ws.write("script.ksp", SCRIPT);
    let config = ws.fake_compiler(r#"echo "WARNING $input:7: unused variable""#);

    ws.ksp()
        .arg("--config")
        .arg(&config)
        .arg("check")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "script.ksp:7: warning: [ksp] unused variable",
        ));
}

#[test]
fn clean_script_prints_nothing() {
    let ws = Workspace::new();
    let file = ws.write("script.ksp", SCRIPT);
    let config = ws.fake_compiler("true");

    ws.ksp()
        .arg("--config")
        .arg(&config)
        .arg("check")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn nonzero_exit_fails_the_check() {
    let ws = Workspace::new();
    let file = ws.write("script.ksp", SCRIPT);
    let config = ws.fake_compiler("exit 2");

    ws.ksp()
        .arg("--config")
        .arg(&config)
        .arg("check")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Compile failed with exit code 2"));
}

#[test]
fn stderr_block_becomes_a_diagnostic() {
    let ws = Workspace::new();
    let file = ws.write("script.ksp", SCRIPT);
    let config = ws.fake_compiler(
        r#"{
echo ">>> BEGIN Error"
echo ">>> Location: $input:6"
echo "unexpected token"
echo ">>> END Error"
} >&2
exit 1"#,
    );

    ws.ksp()
        .arg("--config")
        .arg(&config)
        .arg("check")
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains("script.ksp:6: error:"))
        .stdout(predicate::str::contains("unexpected token"));
}

#[test]
fn json_output_lists_documents_and_notices() {
    let ws = Workspace::new();
    let first = ws.write("a.ksp", SCRIPT);
    let second = ws.write("b.ksp", SCRIPT);
    let config = ws.fake_compiler(
        r#"case "$input" in
*a.ksp) echo "WARNING $input:2: unused" ;;
*) exit 3 ;;
esac"#,
    );

    let output = ws
        .ksp()
        .arg("--config")
        .arg(&config)
        .args(["check", "--json"])
        .arg(&second)
        .arg(&first)
        .output()
        .unwrap();
    assert!(!output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let documents = json["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 2);
    assert!(documents[0]["document"].as_str().unwrap().ends_with("a.ksp"));
    assert_eq!(documents[0]["exit_code"], 0);
    assert_eq!(documents[0]["diagnostics"][0]["line"], 1);
    assert_eq!(documents[0]["diagnostics"][0]["severity"], "warning");
    assert_eq!(documents[0]["diagnostics"][0]["range"]["start"]["line"], 1);
    assert_eq!(documents[0]["diagnostics"][0]["range"]["start"]["character"], 0);
    assert_eq!(documents[1]["exit_code"], 3);

    let notices = json["notices"].as_array().unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0]["kind"], "compile_failed");
    assert_eq!(notices[0]["code"], 3);
}

#[test]
fn missing_executable_is_reported() {
    let ws = Workspace::new();
    let file = ws.write("script.ksp", SCRIPT);
    let config = ws.config("[compiler]\nexecutable = \"ksp-no-such-compiler\"\n");

    ws.ksp()
        .arg("--config")
        .arg(&config)
        .arg("check")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("ksp-no-such-compiler"))
        .stderr(predicate::str::contains(
            "Check the compiler executable setting",
        ));
}
