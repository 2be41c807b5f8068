use serde_json::Value;

use crate::gateway::Document;

/// Account role as stored on the user document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Faculty,
    Admin,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Self::Student),
            "faculty" => Some(Self::Faculty),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Faculty => "faculty",
            Self::Admin => "admin",
        }
    }
}

/// Approval state for student/faculty accounts awaiting admin review.
/// Admin accounts are implicitly trusted and carry no meaningful status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Pending,
    Approved,
    Rejected,
}

impl AccountStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// The directory document carried under users/{uid}.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub uid: String,
    pub email: String,
    pub role: Role,
    pub status: Option<AccountStatus>,
    pub enrollment_id: Option<String>,
    pub faculty_id: Option<String>,
}

/// A user document that cannot be decoded into a [`UserRecord`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed user record: {0}")]
pub struct MalformedRecord(pub String);

fn required_str(doc: &Document, key: &str) -> Result<String, MalformedRecord> {
    doc.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| MalformedRecord(format!("missing {}", key)))
}

fn optional_str(doc: &Document, key: &str) -> Option<String> {
    doc.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

impl UserRecord {
    /// Decodes a directory document in one fail-fast step. A missing or
    /// unrecognized role is an error here, never a silent default.
    pub fn decode(doc: &Document) -> Result<Self, MalformedRecord> {
        let uid = required_str(doc, "uid")?;
        let email = required_str(doc, "email")?;
        let role_raw = required_str(doc, "role")?;
        let role = Role::parse(&role_raw)
            .ok_or_else(|| MalformedRecord(format!("unrecognized role: {}", role_raw)))?;
        let status = match doc.get("status") {
            None | Some(Value::Null) => None,
            Some(v) => {
                let s = v
                    .as_str()
                    .ok_or_else(|| MalformedRecord("status must be a string".to_string()))?;
                Some(
                    AccountStatus::parse(s)
                        .ok_or_else(|| MalformedRecord(format!("unrecognized status: {}", s)))?,
                )
            }
        };
        Ok(Self {
            uid,
            email,
            role,
            status,
            enrollment_id: optional_str(doc, "enrollmentId"),
            faculty_id: optional_str(doc, "facultyId"),
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == Some(AccountStatus::Pending)
    }
}

/// A named target screen in the navigation graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Welcome,
    Login,
    Signup,
    PendingApproval,
    StudentHome,
    FacultyHome,
    AdminApproval,
    /// Parameterized detail route of the form `<prefix>/<id>`.
    Detail { prefix: String, id: String },
}

impl Destination {
    pub fn route(&self) -> String {
        match self {
            Self::Welcome => "welcome".to_string(),
            Self::Login => "login".to_string(),
            Self::Signup => "signup".to_string(),
            Self::PendingApproval => "pending".to_string(),
            Self::StudentHome => "student_home".to_string(),
            Self::FacultyHome => "faculty_home".to_string(),
            Self::AdminApproval => "admin_approval".to_string(),
            Self::Detail { prefix, id } => format!("{}/{}", prefix, id),
        }
    }

    pub fn from_route(route: &str) -> Option<Self> {
        match route {
            "welcome" => Some(Self::Welcome),
            "login" => Some(Self::Login),
            "signup" => Some(Self::Signup),
            "pending" => Some(Self::PendingApproval),
            "student_home" => Some(Self::StudentHome),
            "faculty_home" => Some(Self::FacultyHome),
            "admin_approval" => Some(Self::AdminApproval),
            other => {
                let (prefix, id) = other.split_once('/')?;
                if prefix.is_empty() || id.is_empty() {
                    return None;
                }
                Some(Self::Detail {
                    prefix: prefix.to_string(),
                    id: id.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().expect("object").clone()
    }

    #[test]
    fn decode_full_record() {
        let rec = UserRecord::decode(&doc(json!({
            "uid": "u1",
            "email": "s@college.edu",
            "role": "student",
            "status": "approved",
            "enrollmentId": "EN-42"
        })))
        .expect("decode");
        assert_eq!(rec.role, Role::Student);
        assert_eq!(rec.status, Some(AccountStatus::Approved));
        assert_eq!(rec.enrollment_id.as_deref(), Some("EN-42"));
        assert!(rec.faculty_id.is_none());
    }

    #[test]
    fn decode_without_status_is_not_pending() {
        let rec = UserRecord::decode(&doc(json!({
            "uid": "u2",
            "email": "a@college.edu",
            "role": "admin"
        })))
        .expect("decode");
        assert!(rec.status.is_none());
        assert!(!rec.is_pending());
    }

    #[test]
    fn decode_fails_fast_on_bad_role() {
        let err = UserRecord::decode(&doc(json!({
            "uid": "u3",
            "email": "x@college.edu",
            "role": "registrar"
        })))
        .expect_err("must not default");
        assert!(err.0.contains("unrecognized role"));
    }

    #[test]
    fn decode_fails_fast_on_missing_role() {
        let err = UserRecord::decode(&doc(json!({
            "uid": "u4",
            "email": "x@college.edu"
        })))
        .expect_err("must not default");
        assert!(err.0.contains("missing role"));
    }

    #[test]
    fn routes_round_trip() {
        for dest in [
            Destination::Welcome,
            Destination::Login,
            Destination::Signup,
            Destination::PendingApproval,
            Destination::StudentHome,
            Destination::FacultyHome,
            Destination::AdminApproval,
            Destination::Detail {
                prefix: "admin_student_details".to_string(),
                id: "EN-42".to_string(),
            },
        ] {
            assert_eq!(Destination::from_route(&dest.route()), Some(dest));
        }
        assert_eq!(Destination::from_route("nowhere"), None);
        assert_eq!(Destination::from_route("prefix/"), None);
    }
}
