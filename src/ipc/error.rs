use serde_json::json;

use crate::gateway::{AuthError, StoreError};

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            code: "not_found",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<StoreError> for HandlerErr {
    fn from(e: StoreError) -> Self {
        let code = match e {
            StoreError::Network(_) => "store_network",
            StoreError::PermissionDenied(_) => "permission_denied",
        };
        Self {
            code,
            message: e.to_string(),
            details: None,
        }
    }
}

impl From<AuthError> for HandlerErr {
    fn from(e: AuthError) -> Self {
        let code = match e {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::EmailInUse => "email_in_use",
            AuthError::WeakPassword => "weak_password",
            AuthError::Network(_) => "auth_network",
            AuthError::Unknown(_) => "auth_failed",
        };
        Self {
            code,
            message: e.to_string(),
            details: None,
        }
    }
}
