use std::time::Instant;

use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::richtext::FormatCommand;

fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key)))
}

fn offset(req: &Request, key: &str) -> usize {
    req.params
        .get(key)
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as usize
}

fn field_name(state: &AppState, req: &Request) -> Result<String, serde_json::Value> {
    let name = required_str(req, "field")?;
    if state.form.field(&name).is_none() {
        return Err(err(
            &req.id,
            "bad_params",
            format!("unknown prose field: {}", name),
        ));
    }
    Ok(name)
}

fn schedule_live_update(state: &mut AppState) {
    let plan = state.form.snapshot_plan();
    state.session.note_form_change(plan, Instant::now());
}

fn field_status(state: &AppState, name: &str) -> serde_json::Value {
    // The caller validated the name.
    match state.form.field(name) {
        Some(f) => json!({
            "html": f.content(),
            "state": f.state().as_str(),
            "empty": f.is_empty(),
        }),
        None => json!(null),
    }
}

fn handle_focus(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match field_name(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    if let Some(f) = state.form.field_mut(&name) {
        f.focus();
    }
    ok(&req.id, field_status(state, &name))
}

fn handle_blur(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match field_name(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let before = state
        .form
        .field(&name)
        .map(|f| f.content().to_string())
        .unwrap_or_default();
    if let Some(f) = state.form.field_mut(&name) {
        f.blur();
    }
    // Blur may have flushed a parked external write.
    let changed = state
        .form
        .field(&name)
        .map(|f| f.content() != before)
        .unwrap_or(false);
    if changed {
        schedule_live_update(state);
    }
    ok(&req.id, field_status(state, &name))
}

fn handle_input(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match field_name(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let html = match required_str(req, "html") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let changed = state
        .form
        .field_mut(&name)
        .map(|f| f.input(&html))
        .unwrap_or(false);
    if changed {
        schedule_live_update(state);
    }
    let mut result = field_status(state, &name);
    result["changed"] = json!(changed);
    ok(&req.id, result)
}

fn handle_set_content(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match field_name(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let html = match required_str(req, "html") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let applied = state
        .form
        .field_mut(&name)
        .map(|f| f.set_content(&html))
        .unwrap_or(false);
    if applied {
        schedule_live_update(state);
    }
    let mut result = field_status(state, &name);
    result["applied"] = json!(applied);
    ok(&req.id, result)
}

fn handle_command(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match field_name(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let raw = match required_str(req, "command") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(command) = FormatCommand::parse(&raw) else {
        return err(
            &req.id,
            "bad_params",
            "command must be one of: bold, italic, bulletList",
        );
    };
    let start = offset(req, "start");
    let end = offset(req, "end");
    let changed = state
        .form
        .field_mut(&name)
        .map(|f| f.command(command, start, end))
        .unwrap_or(false);
    if changed {
        schedule_live_update(state);
    }
    let mut result = field_status(state, &name);
    result["changed"] = json!(changed);
    ok(&req.id, result)
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match field_name(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(&req.id, field_status(state, &name))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "field.focus" => Some(handle_focus(state, req)),
        "field.blur" => Some(handle_blur(state, req)),
        "field.input" => Some(handle_input(state, req)),
        "field.setContent" => Some(handle_set_content(state, req)),
        "field.command" => Some(handle_command(state, req)),
        "field.get" => Some(handle_get(state, req)),
        _ => None,
    }
}
