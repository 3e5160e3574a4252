use std::time::Instant;

use serde_json::json;

use crate::form::EditableForm;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::session::Session;

fn handle_health(_state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}

fn handle_reset(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.session = Session::default();
    state.form = EditableForm::default();
    ok(&req.id, json!({ "reset": true }))
}

fn handle_snapshot(state: &mut AppState, req: &Request) -> serde_json::Value {
    let plan = match serde_json::to_value(state.session.plan()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "encode_failed", e.to_string()),
    };
    ok(
        &req.id,
        json!({
            "plan": plan,
            "revision": state.session.revision(),
            "loading": state.session.is_loading(),
            "lastError": state.session.last_error(),
        }),
    )
}

/// The host's debounce tick: commits the latest buffered form snapshot if
/// its quiet period has elapsed.
fn handle_poll(state: &mut AppState, req: &Request) -> serde_json::Value {
    let applied = state.session.poll(Instant::now());
    ok(
        &req.id,
        json!({
            "applied": applied,
            "revision": state.session.revision(),
            "pending": state.session.has_pending_form_change(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "session.reset" => Some(handle_reset(state, req)),
        "session.snapshot" => Some(handle_snapshot(state, req)),
        "editor.poll" => Some(handle_poll(state, req)),
        _ => None,
    }
}
