
use std::thread::sleep;
use std::time::Duration;

use serde_json::json;
use test_support::{request_ok, spawn_sidecar};

#[test]
fn rapid_edits_settle_into_a_single_commit() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    for (id, value) in [("1", "F"), ("2", "Fr"), ("3", "Fruits")] {
        let scheduled = request_ok(
            &mut stdin,
            &mut reader,
            id,
            "form.setField",
            json!({ "field": "topic", "value": value }),
        );
        assert_eq!(scheduled["scheduled"], true);
    }

    // Still inside the quiet period: nothing committed, buffer pending.
    let early = request_ok(&mut stdin, &mut reader, "4", "editor.poll", json!({}));
    assert_eq!(early["applied"], false);
    assert_eq!(early["pending"], true);
    assert_eq!(early["revision"], 0);

    let snapshot = request_ok(&mut stdin, &mut reader, "5", "session.snapshot", json!({}));
    assert_eq!(snapshot["plan"]["topic"], "");

    sleep(Duration::from_millis(250));

    let late = request_ok(&mut stdin, &mut reader, "6", "editor.poll", json!({}));
    assert_eq!(late["applied"], true);
    assert_eq!(late["pending"], false);
    assert_eq!(late["revision"], 1);

    // Only the last snapshot survives; intermediate keystrokes are gone.
    let snapshot = request_ok(&mut stdin, &mut reader, "7", "session.snapshot", json!({}));
    assert_eq!(snapshot["plan"]["topic"], "Fruits");
    assert_eq!(snapshot["revision"], 1);
}

#[test]
fn identical_snapshot_never_bumps_the_revision() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "form.setField",
        json!({ "field": "topic", "value": "Fruits" }),
    );
    sleep(Duration::from_millis(250));
    let first = request_ok(&mut stdin, &mut reader, "2", "editor.poll", json!({}));
    assert_eq!(first["applied"], true);
    assert_eq!(first["revision"], 1);

    // Re-entering the same value schedules a snapshot equal to the
    // committed document; the commit short-circuits.
    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "form.setField",
        json!({ "field": "topic", "value": "Fruits" }),
    );
    sleep(Duration::from_millis(250));
    let second = request_ok(&mut stdin, &mut reader, "4", "editor.poll", json!({}));
    assert_eq!(second["applied"], false);
    assert_eq!(second["revision"], 1);
}

#[test]
fn unfocused_field_input_schedules_nothing() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    // No focus, so the edit is rejected and nothing enters the buffer.
    let result = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "field.input",
        json!({ "field": "introduction", "html": "<b>Hi</b>" }),
    );
    assert_eq!(result["changed"], false);

    let poll = request_ok(&mut stdin, &mut reader, "2", "editor.poll", json!({}));
    assert_eq!(poll["pending"], false);
}
