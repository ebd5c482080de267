//! `ksp serve` over piped stdio

use crate::common::{SCRIPT, Workspace};

fn events(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn answers_navigation_requests_in_order() {
    let ws = Workspace::new();
    let file = ws.write("script.ksp", SCRIPT);
    let path = file.display().to_string();

    let requests = [
        serde_json::json!({"method": "symbols", "path": path}),
        serde_json::json!({"method": "definition", "path": path, "line": 6, "character": 6}),
        serde_json::json!({"method": "references", "path": path, "line": 6, "character": 6}),
        serde_json::json!({"method": "rename", "path": path, "line": 1, "character": 14, "new_name": "$total"}),
        serde_json::json!({"method": "shutdown"}),
    ];
    let stdin: String = requests.iter().map(|r| format!("{r}\n")).collect();

    let output = ws.ksp().arg("serve").write_stdin(stdin).output().unwrap();
    assert!(output.status.success());

    let events = events(&output.stdout);
    assert_eq!(events.len(), 4);

    assert_eq!(events[0]["event"], "symbols");
    assert_eq!(events[0]["symbols"].as_array().unwrap().len(), 4);

    assert_eq!(events[1]["event"], "locations");
    assert_eq!(
        events[1]["locations"],
        serde_json::json!([{"line": 1, "character": 12}])
    );

    assert_eq!(events[2]["event"], "locations");
    assert_eq!(events[2]["locations"].as_array().unwrap().len(), 3);

    assert_eq!(events[3]["event"], "edits");
    let edits = events[3]["edits"].as_array().unwrap();
    assert_eq!(edits.len(), 2);
    assert_eq!(edits[0]["new_text"], "    declare $total");
    assert_eq!(edits[1]["new_text"], "    $total := $total + 1");
}

#[test]
fn bad_requests_produce_error_events() {
    let ws = Workspace::new();
    let stdin = concat!(
        "not json\n",
        "\n",
        "{\"method\":\"rename\",\"path\":\"a.ksp\",\"line\":0,\"character\":0,\"new_name\":\"x\",\"text\":\"on init\"}\n",
        "{\"method\":\"status\"}\n",
    );

    let output = ws.ksp().arg("serve").write_stdin(stdin).output().unwrap();
    assert!(output.status.success());

    let events = events(&output.stdout);
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["event"], "error");
    assert!(events[0]["message"].as_str().unwrap().starts_with("invalid request"));
    assert_eq!(events[1]["event"], "error");
    assert!(events[1]["message"].as_str().unwrap().contains("keyword"));
    assert_eq!(events[2]["event"], "status");
    assert_eq!(events[2]["errors"], 0);
}
