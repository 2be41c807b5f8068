use serde_json::json;
use tracing::info;

use crate::gateway::Filter;
use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::handlers::auth::user_document;
use crate::ipc::params::{optional_str, required_str};
use crate::ipc::types::{AppState, Request, Services};
use crate::model::{AccountStatus, Role, UserRecord};
use crate::session::USERS_COLLECTION;

fn record_json(record: &UserRecord) -> serde_json::Value {
    json!({
        "uid": record.uid,
        "email": record.email,
        "role": record.role.as_str(),
        "status": record.status.map(AccountStatus::as_str),
        "enrollmentId": record.enrollment_id,
        "facultyId": record.faculty_id,
    })
}

async fn pending_list(services: &Services) -> Result<serde_json::Value, HandlerErr> {
    let filter = Filter::new().field_eq("status", AccountStatus::Pending.as_str());
    let docs = services.store.query(USERS_COLLECTION, &filter).await?;
    let mut accounts = Vec::new();
    for doc in &docs {
        // A document the decoder rejects is surfaced rather than listed.
        let record = UserRecord::decode(doc)
            .map_err(|e| HandlerErr::bad_params(format!("corrupt user record: {}", e)))?;
        accounts.push(record_json(&record));
    }
    Ok(json!({ "accounts": accounts }))
}

async fn set_status(services: &Services, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let uid = required_str(params, "uid")?;
    let status_raw = required_str(params, "status")?;
    let status = AccountStatus::parse(&status_raw)
        .ok_or_else(|| HandlerErr::bad_params(format!("unrecognized status: {}", status_raw)))?;
    if status == AccountStatus::Pending {
        return Err(HandlerErr::bad_params("status must be approved or rejected"));
    }

    let existing = services.store.get_document(USERS_COLLECTION, &uid).await?;
    let Some(doc) = existing else {
        return Err(HandlerErr::not_found("user record not found"));
    };
    let record = UserRecord::decode(&doc)
        .map_err(|e| HandlerErr::bad_params(format!("corrupt user record: {}", e)))?;
    if record.role == Role::Admin {
        return Err(HandlerErr::bad_params("admin accounts carry no approval status"));
    }

    let fields = json!({ "status": status.as_str() })
        .as_object()
        .cloned()
        .unwrap_or_default();
    services
        .store
        .update_fields(USERS_COLLECTION, &uid, fields)
        .await?;
    info!(uid = %uid, status = status.as_str(), "approval status updated");
    Ok(json!({ "uid": uid, "status": status.as_str() }))
}

/// Privileged creation: the account is approved immediately and the
/// admin's own cached session is untouched.
async fn create_user(services: &Services, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let email = required_str(params, "email")?;
    let password = required_str(params, "password")?;
    let role_raw = required_str(params, "role")?;
    let role = Role::parse(&role_raw)
        .ok_or_else(|| HandlerErr::bad_params(format!("unrecognized role: {}", role_raw)))?;
    let full_name = optional_str(params, "fullName");
    let enrollment_id = optional_str(params, "enrollmentId");
    let faculty_id = optional_str(params, "facultyId");

    let identity = services.auth.create_account(&email, &password).await?;
    let doc = user_document(
        &identity.uid,
        &identity.email,
        role,
        AccountStatus::Approved,
        full_name.as_deref(),
        enrollment_id.as_deref(),
        faculty_id.as_deref(),
    );
    services
        .store
        .set_document(USERS_COLLECTION, &identity.uid, doc)
        .await?;
    info!(uid = %identity.uid, role = role.as_str(), "account created by admin");
    Ok(json!({
        "uid": identity.uid,
        "email": identity.email,
        "role": role.as_str(),
        "status": AccountStatus::Approved.as_str(),
    }))
}

async fn handle_pending_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match pending_list(services).await {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

async fn handle_set_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match set_status(services, &req.params).await {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

async fn handle_create_user(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match create_user(services, &req.params).await {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "admin.pendingList" => Some(handle_pending_list(state, req).await),
        "admin.setStatus" => Some(handle_set_status(state, req).await),
        "admin.createUser" => Some(handle_create_user(state, req).await),
        _ => None,
    }
}
