//! Contracts for the external collaborators: the authentication provider
//! and the document directory. The session core only ever sees these
//! traits; concrete backends are injected at workspace open.

pub mod local;

use async_trait::async_trait;
use serde_json::Value;

/// A directory document: a flat bag of JSON fields.
pub type Document = serde_json::Map<String, Value>;

/// The opaque account reference issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("email already in use")]
    EmailInUse,
    #[error("password too weak")]
    WeakPassword,
    #[error("auth network error: {0}")]
    Network(String),
    #[error("auth error: {0}")]
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("directory network error: {0}")]
    Network(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
}

/// Conjunction of field-equality predicates applied by [`DirectoryStore::query`].
#[derive(Debug, Clone, Default)]
pub struct Filter {
    terms: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.terms.push((field.to_string(), value.into()));
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.terms
            .iter()
            .all(|(field, value)| doc.get(field) == Some(value))
    }
}

/// The external authentication provider.
///
/// `current_identity` is a non-blocking read of the cached session; only
/// sign-in and sign-up hit the network.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    fn current_identity(&self) -> Option<Identity>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Privileged account creation (admin flows). Unlike `sign_up`, the
    /// cached session is left untouched.
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Clears the cached session. Always succeeds locally.
    fn sign_out(&self);
}

/// The external document database: collections of key -> document.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Returns `Ok(None)` when the document is absent; `Err` only for
    /// transport/permission failures.
    async fn get_document(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Document>, StoreError>;

    async fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    async fn set_document(
        &self,
        collection: &str,
        key: &str,
        fields: Document,
    ) -> Result<(), StoreError>;

    /// Merges `fields` into the existing document, creating it if absent.
    async fn update_fields(
        &self,
        collection: &str,
        key: &str,
        fields: Document,
    ) -> Result<(), StoreError>;

    async fn delete_document(&self, collection: &str, key: &str) -> Result<(), StoreError>;
}
