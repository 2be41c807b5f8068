use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::gateway::Filter;
use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::handlers::subjects::subject_exists;
use crate::ipc::params::{optional_str, required_date, required_str};
use crate::ipc::types::{AppState, Request, Services};

const ASSIGNMENTS_COLLECTION: &str = "assignments";
const SUBMISSIONS_COLLECTION: &str = "submissions";

async fn post(services: &Services, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let subject_code = required_str(params, "subjectCode")?;
    let title = required_str(params, "title")?;
    let due_date = required_date(params, "dueDate")?;
    let file_url = optional_str(params, "fileUrl");

    if !subject_exists(services, &subject_code).await? {
        return Err(HandlerErr::not_found("subject not found"));
    }

    let assignment_id = Uuid::new_v4().to_string();
    let mut doc = json!({
        "id": assignment_id,
        "subjectCode": subject_code,
        "title": title,
        "dueDate": due_date,
        "postedAt": Utc::now().to_rfc3339(),
    });
    if let Some(url) = file_url {
        doc["fileUrl"] = json!(url);
    }
    services
        .store
        .set_document(
            ASSIGNMENTS_COLLECTION,
            &assignment_id,
            doc.as_object().cloned().unwrap_or_default(),
        )
        .await?;
    Ok(json!({ "assignmentId": assignment_id }))
}

async fn list(services: &Services, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let subject_code = required_str(params, "subjectCode")?;
    let filter = Filter::new().field_eq("subjectCode", subject_code.as_str());
    let docs = services.store.query(ASSIGNMENTS_COLLECTION, &filter).await?;
    Ok(json!({ "assignments": docs }))
}

/// One submission per (assignment, student); a resubmission replaces the
/// earlier one. Lateness is judged against the assignment's due date.
async fn submit(services: &Services, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let assignment_id = required_str(params, "assignmentId")?;
    let enrollment_id = required_str(params, "enrollmentId")?;
    let file_url = required_str(params, "fileUrl")?;

    let assignment = services
        .store
        .get_document(ASSIGNMENTS_COLLECTION, &assignment_id)
        .await?
        .ok_or_else(|| HandlerErr::not_found("assignment not found"))?;

    let submitted_at = Utc::now();
    let late = assignment
        .get("dueDate")
        .and_then(|v| v.as_str())
        .and_then(|raw| chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .map(|due| submitted_at.date_naive() > due)
        .unwrap_or(false);

    let key = format!("{}_{}", assignment_id, enrollment_id);
    let doc = json!({
        "assignmentId": assignment_id,
        "enrollmentId": enrollment_id,
        "fileUrl": file_url,
        "submittedAt": submitted_at.to_rfc3339(),
        "late": late,
    })
    .as_object()
    .cloned()
    .unwrap_or_default();
    services
        .store
        .set_document(SUBMISSIONS_COLLECTION, &key, doc)
        .await?;
    Ok(json!({ "assignmentId": assignment_id, "enrollmentId": enrollment_id, "late": late }))
}

async fn submissions(services: &Services, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let assignment_id = required_str(params, "assignmentId")?;
    let filter = Filter::new().field_eq("assignmentId", assignment_id.as_str());
    let docs = services.store.query(SUBMISSIONS_COLLECTION, &filter).await?;
    Ok(json!({ "submissions": docs }))
}

async fn handle_post(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match post(services, &req.params).await {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

async fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match list(services, &req.params).await {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

async fn handle_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match submit(services, &req.params).await {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

async fn handle_submissions(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match submissions(services, &req.params).await {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assignments.post" => Some(handle_post(state, req).await),
        "assignments.list" => Some(handle_list(state, req).await),
        "assignments.submit" => Some(handle_submit(state, req).await),
        "assignments.submissions" => Some(handle_submissions(state, req).await),
        _ => None,
    }
}
