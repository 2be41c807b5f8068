use serde_json::json;

use crate::gateway::Filter;
use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::handlers::subjects::subject_exists;
use crate::ipc::params::{optional_str, required_date, required_str, required_str_array};
use crate::ipc::types::{AppState, Request, Services};

const ATTENDANCE_COLLECTION: &str = "attendance";

/// Records one session's roll call. Re-marking the same subject/date
/// replaces that day's sheet.
async fn mark(services: &Services, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let subject_code = required_str(params, "subjectCode")?;
    let date = required_date(params, "date")?;
    let present_ids = required_str_array(params, "presentIds")?;
    let marked_by = optional_str(params, "markedBy");

    if !subject_exists(services, &subject_code).await? {
        return Err(HandlerErr::not_found("subject not found"));
    }

    let key = format!("{}_{}", subject_code, date);
    let mut doc = json!({
        "subjectCode": subject_code,
        "date": date,
        "present": present_ids,
    });
    if let Some(marked_by) = marked_by {
        doc["markedBy"] = json!(marked_by);
    }
    services
        .store
        .set_document(
            ATTENDANCE_COLLECTION,
            &key,
            doc.as_object().cloned().unwrap_or_default(),
        )
        .await?;
    Ok(json!({ "subjectCode": subject_code, "date": date }))
}

/// Per-student aggregate over every recorded session of a subject.
async fn summary(services: &Services, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let subject_code = required_str(params, "subjectCode")?;
    let enrollment_id = required_str(params, "enrollmentId")?;

    if !subject_exists(services, &subject_code).await? {
        return Err(HandlerErr::not_found("subject not found"));
    }

    let filter = Filter::new().field_eq("subjectCode", subject_code.as_str());
    let sheets = services.store.query(ATTENDANCE_COLLECTION, &filter).await?;

    let total = sheets.len();
    let attended = sheets
        .iter()
        .filter(|sheet| {
            sheet
                .get("present")
                .and_then(|v| v.as_array())
                .map(|ids| ids.iter().any(|id| id.as_str() == Some(&enrollment_id)))
                .unwrap_or(false)
        })
        .count();
    let percent = if total == 0 {
        0.0
    } else {
        (attended as f64 * 100.0 / total as f64 * 10.0).round() / 10.0
    };

    Ok(json!({
        "subjectCode": subject_code,
        "enrollmentId": enrollment_id,
        "totalSessions": total,
        "attended": attended,
        "percent": percent,
    }))
}

async fn handle_mark(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match mark(services, &req.params).await {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

async fn handle_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match summary(services, &req.params).await {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.mark" => Some(handle_mark(state, req).await),
        "attendance.summary" => Some(handle_summary(state, req).await),
        _ => None,
    }
}
