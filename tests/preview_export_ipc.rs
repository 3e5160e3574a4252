
use std::thread::sleep;
use std::time::Duration;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar};

#[test]
fn blank_plan_renders_placeholders_and_omits_optional_rows() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let result = request_ok(&mut stdin, &mut reader, "1", "preview.render", json!({}));
    let document = result["document"].as_str().expect("document");

    assert_eq!(document.matches("[Empty]").count(), 10);
    assert!(document.contains("Name of School"));
    assert!(document.contains("Daily Lesson Plan"));
    assert!(!document.contains("Homework"));
    assert!(!document.contains("Prior Knowledge"));
    // The six lesson-detail scalars fall back to N/A when blank; the
    // defaults fill two of them.
    assert_eq!(document.matches("N/A").count(), 4);
}

#[test]
fn inline_and_export_wrap_the_identical_document() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "form.setField",
        json!({ "field": "topic", "value": "Fruits" }),
    );
    sleep(Duration::from_millis(250));
    request_ok(&mut stdin, &mut reader, "2", "editor.poll", json!({}));

    let inline = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "preview.render",
        json!({ "mode": "inline" }),
    );
    let export = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "preview.render",
        json!({ "mode": "export" }),
    );

    assert_eq!(inline["document"], export["document"]);
    assert_ne!(inline["html"], export["html"]);
    assert!(export["html"]
        .as_str()
        .expect("html")
        .contains("Back to Editor"));

    let error = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "preview.render",
        json!({ "mode": "fullscreen" }),
    );
    assert_eq!(error["code"], "bad_params");
}

#[test]
fn preview_shows_only_the_committed_document() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "form.setField",
        json!({ "field": "schoolName", "value": "Sunrise Primary" }),
    );

    // The edit is still buffered, so the preview keeps the fallback header.
    let before = request_ok(&mut stdin, &mut reader, "2", "preview.render", json!({}));
    assert!(before["document"]
        .as_str()
        .expect("document")
        .contains("Name of School"));

    sleep(Duration::from_millis(250));
    request_ok(&mut stdin, &mut reader, "3", "editor.poll", json!({}));

    let after = request_ok(&mut stdin, &mut reader, "4", "preview.render", json!({}));
    assert!(after["document"]
        .as_str()
        .expect("document")
        .contains("Sunrise Primary"));
}

#[test]
fn print_and_pdf_carry_the_export_descriptors() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let print = request_ok(&mut stdin, &mut reader, "1", "export.print", json!({}));
    assert_eq!(print["print"]["pageSize"], "A4");
    assert_eq!(print["print"]["marginCm"], 1);
    assert!(print["html"]
        .as_str()
        .expect("html")
        .contains("preview-overlay"));

    let pdf = request_ok(&mut stdin, &mut reader, "2", "export.pdf", json!({}));
    assert_eq!(pdf["pdf"]["filename"], "Lesson_Plan_Export.pdf");
    assert_eq!(pdf["pdf"]["marginMm"], 10);
    assert_eq!(pdf["document"], print["document"]);

    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "form.setField",
        json!({ "field": "topic", "value": "Fruits" }),
    );
    sleep(Duration::from_millis(250));
    request_ok(&mut stdin, &mut reader, "4", "editor.poll", json!({}));

    let named = request_ok(&mut stdin, &mut reader, "5", "export.pdf", json!({}));
    assert_eq!(named["pdf"]["filename"], "Lesson_Plan_Fruits.pdf");
}
