use std::time::Instant;

use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::LessonPlanUpdate;

fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key)))
}

/// Every form mutation pushes the entire updated plan upstream, where it
/// sits behind the debounce window.
fn schedule_live_update(state: &mut AppState) {
    let plan = state.form.snapshot_plan();
    state.session.note_form_change(plan, Instant::now());
}

fn handle_set_field(state: &mut AppState, req: &Request) -> serde_json::Value {
    let field = match required_str(req, "field") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let value = match required_str(req, "value") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if let Err(message) = state.form.set_scalar(&field, &value) {
        return err(&req.id, "bad_params", message);
    }
    schedule_live_update(state);
    ok(&req.id, json!({ "scheduled": true }))
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let raw = req
        .params
        .get("update")
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    let update: LessonPlanUpdate = match serde_json::from_value(raw) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string()),
    };
    state.form.apply_update(update);
    schedule_live_update(state);
    ok(&req.id, json!({ "scheduled": true }))
}

fn handle_attach_image(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Some(path) = req.params.get("path").and_then(|v| v.as_str()) {
        return match state.form.attach_image_path(path) {
            Ok(attached) => ok(&req.id, json!({ "attached": attached })),
            Err(e) => err(&req.id, "file_read_failed", e.to_string()),
        };
    }
    let data = match required_str(req, "data") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let mime_type = match required_str(req, "mimeType") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let attached = state.form.attach_image_data(&data, &mime_type);
    ok(&req.id, json!({ "attached": attached }))
}

fn handle_clear_image(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.form.clear_image();
    ok(&req.id, json!({ "cleared": true }))
}

fn handle_set_textbook_text(state: &mut AppState, req: &Request) -> serde_json::Value {
    let text = match required_str(req, "text") {
        Ok(v) => v,
        Err(e) => return e,
    };
    state.form.set_textbook_text(&text);
    ok(&req.id, json!({ "set": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "form.setField" => Some(handle_set_field(state, req)),
        "form.update" => Some(handle_update(state, req)),
        "form.attachImage" => Some(handle_attach_image(state, req)),
        "form.clearImage" => Some(handle_clear_image(state, req)),
        "form.setTextbookText" => Some(handle_set_textbook_text(state, req)),
        _ => None,
    }
}
