use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::gateway::Filter;
use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::handlers::subjects::subject_exists;
use crate::ipc::params::{optional_str, required_str};
use crate::ipc::types::{AppState, Request, Services};

const NOTES_COLLECTION: &str = "notes";

/// The note body lives in the external blob store; only its reference and
/// metadata pass through here.
async fn upload(services: &Services, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let subject_code = required_str(params, "subjectCode")?;
    let title = required_str(params, "title")?;
    let file_url = required_str(params, "fileUrl")?;
    let uploaded_by = optional_str(params, "uploadedBy");

    if !subject_exists(services, &subject_code).await? {
        return Err(HandlerErr::not_found("subject not found"));
    }

    let note_id = Uuid::new_v4().to_string();
    let mut doc = json!({
        "id": note_id,
        "subjectCode": subject_code,
        "title": title,
        "fileUrl": file_url,
        "uploadedAt": Utc::now().to_rfc3339(),
    });
    if let Some(uploaded_by) = uploaded_by {
        doc["uploadedBy"] = json!(uploaded_by);
    }
    services
        .store
        .set_document(
            NOTES_COLLECTION,
            &note_id,
            doc.as_object().cloned().unwrap_or_default(),
        )
        .await?;
    Ok(json!({ "noteId": note_id }))
}

async fn list(services: &Services, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let subject_code = required_str(params, "subjectCode")?;
    let filter = Filter::new().field_eq("subjectCode", subject_code.as_str());
    let docs = services.store.query(NOTES_COLLECTION, &filter).await?;
    Ok(json!({ "notes": docs }))
}

async fn handle_upload(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match upload(services, &req.params).await {
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

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "notes.upload" => Some(handle_upload(state, req).await),
        "notes.list" => Some(handle_list(state, req).await),
        _ => None,
    }
}
