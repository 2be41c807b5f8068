use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::session::Resolution;

/// Drives start-destination resolution for the current launch. On success
/// the navigator is (re)rooted at the resolved destination; a directory
/// failure is reported as retryable instead of silently landing on
/// welcome.
async fn handle_resolve(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    match services.resolver.resolve().await {
        Resolution::Destination(dest) => {
            services.navigator.reset(dest.clone());
            ok(&req.id, json!({ "destination": dest.route() }))
        }
        Resolution::Failed { reason } => err(
            &req.id,
            "resolution_failed",
            reason,
            Some(json!({ "retryable": true })),
        ),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.resolve" => Some(handle_resolve(state, req).await),
        _ => None,
    }
}
