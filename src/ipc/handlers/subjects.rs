use chrono::Utc;
use serde_json::json;

use crate::gateway::Filter;
use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::params::{required_str, required_u64};
use crate::ipc::types::{AppState, Request, Services};

pub const SUBJECTS_COLLECTION: &str = "subjects";

pub async fn subject_exists(services: &Services, code: &str) -> Result<bool, HandlerErr> {
    Ok(services
        .store
        .get_document(SUBJECTS_COLLECTION, code)
        .await?
        .is_some())
}

async fn add(services: &Services, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let code = required_str(params, "code")?;
    let name = required_str(params, "name")?;
    let semester = required_u64(params, "semester")?;
    let faculty_id = required_str(params, "facultyId")?;

    if subject_exists(services, &code).await? {
        return Err(HandlerErr {
            code: "already_exists",
            message: format!("subject {} already exists", code),
            details: None,
        });
    }
    let doc = json!({
        "code": code,
        "name": name,
        "semester": semester,
        "facultyId": faculty_id,
        "createdAt": Utc::now().to_rfc3339(),
    })
    .as_object()
    .cloned()
    .unwrap_or_default();
    services
        .store
        .set_document(SUBJECTS_COLLECTION, &code, doc)
        .await?;
    Ok(json!({ "code": code }))
}

async fn list_by(services: &Services, filter: Filter) -> Result<serde_json::Value, HandlerErr> {
    let docs = services.store.query(SUBJECTS_COLLECTION, &filter).await?;
    Ok(json!({ "subjects": docs }))
}

async fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match add(services, &req.params).await {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

async fn handle_for_semester(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let semester = match required_u64(&req.params, "semester") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    match list_by(services, Filter::new().field_eq("semester", semester)).await {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

async fn handle_for_faculty(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let faculty_id = match required_str(&req.params, "facultyId") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    match list_by(services, Filter::new().field_eq("facultyId", faculty_id.as_str())).await {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.add" => Some(handle_add(state, req).await),
        "subjects.forSemester" => Some(handle_for_semester(state, req).await),
        "subjects.forFaculty" => Some(handle_for_faculty(state, req).await),
        _ => None,
    }
}
