//! End-to-end CLI tests against the `nml` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn events_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

const SAMPLE: &str = r#"[
  {
    "tx_id": "tx-1", "ts": 1000, "initiator": "0xabc",
    "kind": "name.purchase",
    "data": { "buyer": "0xbuyer", "price": 5000, "start_ts": 1000,
              "expiry_ts": 32536000, "undername_limit": 10 }
  },
  {
    "tx_id": "tx-2", "ts": 2000, "initiator": "0xabc",
    "kind": "name.set-record",
    "data": { "label": "shop", "content_id": "tx-content", "ttl_secs": 900 }
  }
]"#;

#[test]
fn replay_prints_rows_in_order() {
    let events = events_file(SAMPLE);
    Command::cargo_bin("nml")
        .unwrap()
        .args(["replay", "--events"])
        .arg(events.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Purchased"))
        .stdout(predicate::str::contains("Record Updated"))
        .stdout(predicate::str::contains("tx-2"));
}

#[test]
fn replay_json_is_parseable() {
    let events = events_file(SAMPLE);
    let output = Command::cargo_bin("nml")
        .unwrap()
        .args(["replay", "--json", "--events"])
        .arg(events.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["tx_id"], "tx-1");
    assert_eq!(rows[0]["category"], "ownership");
    assert_eq!(rows[1]["snapshot"]["undernames"][0], "shop");
}

#[test]
fn snapshot_shows_final_state_only() {
    let events = events_file(SAMPLE);
    Command::cargo_bin("nml")
        .unwrap()
        .args(["snapshot", "--events"])
        .arg(events.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("0xbuyer"))
        .stdout(predicate::str::contains("shop -> tx-content"))
        .stdout(predicate::str::contains("Purchased").not());
}

#[test]
fn lookups_file_resolves_quotes() {
    let events = events_file(
        r#"[{
            "tx_id": "tx-1", "ts": 1000, "initiator": "0xabc",
            "kind": "name.purchase",
            "data": { "buyer": "0xbuyer", "price": { "quote": "q-1" } }
        }]"#,
    );
    let lookups = events_file(r#"{ "prices": { "q-1": 7700 } }"#);

    let output = Command::cargo_bin("nml")
        .unwrap()
        .args(["snapshot", "--json", "--events"])
        .arg(events.path())
        .arg("--lookups")
        .arg(lookups.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let snap: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(snap["purchase_price"], 7700);
}

#[test]
fn unknown_kind_is_tolerated() {
    let events = events_file(
        r#"[{
            "tx_id": "tx-1", "ts": 1000, "initiator": "0xabc",
            "kind": "name.mystery", "data": { "anything": true }
        }]"#,
    );
    Command::cargo_bin("nml")
        .unwrap()
        .args(["replay", "--events"])
        .arg(events.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Unknown Event"));
}

#[test]
fn missing_events_file_fails_with_context() {
    Command::cargo_bin("nml")
        .unwrap()
        .args(["replay", "--events", "/nonexistent/history.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reading events file"));
}

#[test]
fn malformed_events_file_fails_with_context() {
    let events = events_file("not json");
    Command::cargo_bin("nml")
        .unwrap()
        .args(["replay", "--events"])
        .arg(events.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("parsing events file"));
}
