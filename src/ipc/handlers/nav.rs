use serde_json::json;

use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::params::{optional_bool, optional_str, required_str};
use crate::ipc::types::{AppState, Request, Services};
use crate::model::Destination;
use crate::nav::Navigator;

fn stack_json(navigator: &Navigator) -> serde_json::Value {
    json!({
        "stack": navigator.stack().iter().map(Destination::route).collect::<Vec<_>>(),
        "current": navigator.current().route(),
    })
}

fn parse_destination(route: &str, key: &str) -> Result<Destination, HandlerErr> {
    Destination::from_route(route)
        .ok_or_else(|| HandlerErr::bad_params(format!("{} is not a known route: {}", key, route)))
}

fn navigate(services: &mut Services, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let dest = parse_destination(&required_str(params, "destination")?, "destination")?;
    let clear_up_to = match optional_str(params, "clearUpTo") {
        Some(route) => Some(parse_destination(&route, "clearUpTo")?),
        None => None,
    };
    let inclusive = optional_bool(params, "inclusive");

    services
        .navigator
        .navigate(dest, clear_up_to.as_ref(), inclusive);
    Ok(stack_json(&services.navigator))
}

fn pop_back(services: &mut Services) -> serde_json::Value {
    let popped = services.navigator.pop_back();
    let mut out = stack_json(&services.navigator);
    out["popped"] = json!(popped);
    out
}

async fn handle_navigate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match navigate(services, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

async fn handle_pop_back(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ok(&req.id, pop_back(services))
}

async fn handle_stack(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ok(&req.id, stack_json(&services.navigator))
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "nav.navigate" => Some(handle_navigate(state, req).await),
        "nav.popBack" => Some(handle_pop_back(state, req).await),
        "nav.stack" => Some(handle_stack(state, req).await),
        _ => None,
    }
}
