use serde_json::json;

use crate::generate::{self, GENERATION_FAILED_MESSAGE};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

/// One-shot generation: snapshot the form, call the backend, merge by
/// precedence, commit immediately. Any failure collapses into the single
/// generic message; internal detail never reaches the host.
fn handle_run(state: &mut AppState, req: &Request) -> serde_json::Value {
    if !state.session.begin_generation() {
        return err(
            &req.id,
            "generation_in_flight",
            "a generation request is already running",
        );
    }

    let params = state.form.snapshot_params();
    match generate::run(&params, state.backend.as_ref()) {
        Ok(plan) => {
            state.session.complete_generation(Ok(plan.clone()));
            state.form.apply_external_plan(&plan);
            let plan_json = match serde_json::to_value(&plan) {
                Ok(v) => v,
                Err(e) => return err(&req.id, "encode_failed", e.to_string()),
            };
            ok(
                &req.id,
                json!({
                    "plan": plan_json,
                    "revision": state.session.revision(),
                }),
            )
        }
        Err(e) => {
            state.session.complete_generation(Err(e));
            err(&req.id, "generation_failed", GENERATION_FAILED_MESSAGE)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "generate.run" => Some(handle_run(state, req)),
        _ => None,
    }
}
