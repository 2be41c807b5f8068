use chrono::Utc;
use serde_json::json;
use tracing::info;

use crate::gateway::Document;
use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::params::{optional_str, required_str};
use crate::ipc::types::{AppState, Request, Services};
use crate::model::{AccountStatus, Destination, Role};
use crate::session::USERS_COLLECTION;

pub fn user_document(
    uid: &str,
    email: &str,
    role: Role,
    status: AccountStatus,
    full_name: Option<&str>,
    enrollment_id: Option<&str>,
    faculty_id: Option<&str>,
) -> Document {
    let mut doc = json!({
        "uid": uid,
        "email": email,
        "role": role.as_str(),
        "status": status.as_str(),
        "createdAt": Utc::now().to_rfc3339(),
    });
    if let Some(name) = full_name {
        doc["fullName"] = json!(name);
    }
    if let Some(id) = enrollment_id {
        doc["enrollmentId"] = json!(id);
    }
    if let Some(id) = faculty_id {
        doc["facultyId"] = json!(id);
    }
    doc.as_object().cloned().unwrap_or_default()
}

/// Public self-service sign-up: students and faculty only, always landing
/// in the pending queue. Admin accounts come from the privileged flow in
/// the approvals handler.
async fn sign_up(services: &mut Services, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let email = required_str(params, "email")?;
    let password = required_str(params, "password")?;
    let role_raw = required_str(params, "role")?;
    let role = Role::parse(&role_raw)
        .ok_or_else(|| HandlerErr::bad_params(format!("unrecognized role: {}", role_raw)))?;
    if role == Role::Admin {
        return Err(HandlerErr::bad_params(
            "admin accounts are created through admin.createUser",
        ));
    }
    let full_name = optional_str(params, "fullName");
    let enrollment_id = optional_str(params, "enrollmentId");
    let faculty_id = optional_str(params, "facultyId");
    match role {
        Role::Student if enrollment_id.is_none() => {
            return Err(HandlerErr::bad_params("student sign-up requires enrollmentId"))
        }
        Role::Faculty if faculty_id.is_none() => {
            return Err(HandlerErr::bad_params("faculty sign-up requires facultyId"))
        }
        _ => {}
    }

    let identity = services.auth.sign_up(&email, &password).await?;
    let doc = user_document(
        &identity.uid,
        &identity.email,
        role,
        AccountStatus::Pending,
        full_name.as_deref(),
        enrollment_id.as_deref(),
        faculty_id.as_deref(),
    );
    services
        .store
        .set_document(USERS_COLLECTION, &identity.uid, doc)
        .await?;

    // New auth event: the next resolve re-reads the ambient identity.
    services.resolver.invalidate().await;
    info!(uid = %identity.uid, role = role.as_str(), "account created, pending approval");
    Ok(json!({
        "uid": identity.uid,
        "email": identity.email,
        "role": role.as_str(),
        "status": AccountStatus::Pending.as_str(),
    }))
}

async fn sign_in(services: &mut Services, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let email = required_str(params, "email")?;
    let password = required_str(params, "password")?;
    let identity = services.auth.sign_in(&email, &password).await?;
    services.resolver.invalidate().await;
    Ok(json!({ "uid": identity.uid, "email": identity.email }))
}

async fn sign_out(services: &mut Services) -> serde_json::Value {
    services.auth.sign_out();
    services.resolver.invalidate().await;
    services.navigator.reset(Destination::Welcome);
    json!({ "signedOut": true })
}

async fn handle_sign_up(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match sign_up(services, &req.params).await {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

async fn handle_sign_in(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match sign_in(services, &req.params).await {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

async fn handle_sign_out(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(services) = state.services.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ok(&req.id, sign_out(services).await)
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.signUp" => Some(handle_sign_up(state, req).await),
        "auth.signIn" => Some(handle_sign_in(state, req).await),
        "auth.signOut" => Some(handle_sign_out(state, req).await),
        _ => None,
    }
}
