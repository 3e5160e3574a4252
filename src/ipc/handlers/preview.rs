use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::render::{self, PreviewMode};

/// Renders the committed document only; buffered form edits stay invisible
/// until their debounce window elapses.
fn handle_render(state: &mut AppState, req: &Request) -> serde_json::Value {
    let raw = req
        .params
        .get("mode")
        .and_then(|v| v.as_str())
        .unwrap_or("inline");
    let Some(mode) = PreviewMode::parse(raw) else {
        return err(&req.id, "bad_params", "mode must be one of: inline, export");
    };
    let plan = state.session.plan();
    ok(
        &req.id,
        json!({
            "html": render::render_preview(plan, mode),
            "document": render::render_document(plan),
            "revision": state.session.revision(),
        }),
    )
}

fn handle_print(state: &mut AppState, req: &Request) -> serde_json::Value {
    let plan = state.session.plan();
    ok(
        &req.id,
        json!({
            "html": render::render_preview(plan, PreviewMode::Export),
            "document": render::render_document(plan),
            "print": render::print_options(),
        }),
    )
}

fn handle_pdf(state: &mut AppState, req: &Request) -> serde_json::Value {
    let plan = state.session.plan();
    ok(
        &req.id,
        json!({
            "html": render::render_preview(plan, PreviewMode::Export),
            "document": render::render_document(plan),
            "pdf": render::pdf_options(plan),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "preview.render" => Some(handle_render(state, req)),
        "export.print" => Some(handle_print(state, req)),
        "export.pdf" => Some(handle_pdf(state, req)),
        _ => None,
    }
}
