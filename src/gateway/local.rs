//! Workspace-local backends for the gateway contracts, stored in the
//! workspace SQLite file. They stand in for the hosted auth/document
//! providers while satisfying the same contracts.

use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{AuthError, AuthGateway, DirectoryStore, Document, Filter, Identity, StoreError};

pub type SharedConnection = Arc<Mutex<Connection>>;

// Firebase-style minimum; anything shorter is rejected before hashing.
const MIN_PASSWORD_LEN: usize = 6;

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

pub struct LocalAuthGateway {
    conn: SharedConnection,
    cached: Mutex<Option<Identity>>,
}

impl LocalAuthGateway {
    /// Opens the gateway over the workspace database, restoring the
    /// persisted session cache if one exists.
    pub fn open(conn: SharedConnection) -> anyhow::Result<Self> {
        let cached = {
            let guard = conn.lock().map_err(|_| anyhow::anyhow!("poisoned db lock"))?;
            guard
                .query_row(
                    "SELECT c.uid, c.email
                     FROM auth_session s JOIN credentials c ON c.uid = s.uid
                     WHERE s.slot = 0",
                    [],
                    |r| {
                        Ok(Identity {
                            uid: r.get(0)?,
                            email: r.get(1)?,
                        })
                    },
                )
                .optional()?
        };
        Ok(Self {
            conn,
            cached: Mutex::new(cached),
        })
    }

    fn remember(&self, identity: &Identity) -> Result<(), AuthError> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| AuthError::Unknown("poisoned db lock".to_string()))?;
        guard
            .execute(
                "INSERT INTO auth_session(slot, uid) VALUES(0, ?)
                 ON CONFLICT(slot) DO UPDATE SET uid = excluded.uid",
                [&identity.uid],
            )
            .map_err(|e| AuthError::Network(e.to_string()))?;
        drop(guard);
        if let Ok(mut cached) = self.cached.lock() {
            *cached = Some(identity.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl AuthGateway for LocalAuthGateway {
    fn current_identity(&self) -> Option<Identity> {
        self.cached.lock().ok().and_then(|c| c.clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let row = {
            let guard = self
                .conn
                .lock()
                .map_err(|_| AuthError::Unknown("poisoned db lock".to_string()))?;
            guard
                .query_row(
                    "SELECT uid, password_hash, salt FROM credentials WHERE email = ?",
                    [email],
                    |r| {
                        Ok((
                            r.get::<_, String>(0)?,
                            r.get::<_, String>(1)?,
                            r.get::<_, String>(2)?,
                        ))
                    },
                )
                .optional()
                .map_err(|e| AuthError::Network(e.to_string()))?
        };
        let Some((uid, stored_hash, salt)) = row else {
            return Err(AuthError::InvalidCredentials);
        };
        if hash_password(&salt, password) != stored_hash {
            return Err(AuthError::InvalidCredentials);
        }
        let identity = Identity {
            uid,
            email: email.to_string(),
        };
        self.remember(&identity)?;
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let identity = self.create_account(email, password).await?;
        self.remember(&identity)?;
        Ok(identity)
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        let uid = Uuid::new_v4().to_string();
        let salt = Uuid::new_v4().to_string();
        let hash = hash_password(&salt, password);
        {
            let guard = self
                .conn
                .lock()
                .map_err(|_| AuthError::Unknown("poisoned db lock".to_string()))?;
            let exists: Option<i64> = guard
                .query_row("SELECT 1 FROM credentials WHERE email = ?", [email], |r| {
                    r.get(0)
                })
                .optional()
                .map_err(|e| AuthError::Network(e.to_string()))?;
            if exists.is_some() {
                return Err(AuthError::EmailInUse);
            }
            guard
                .execute(
                    "INSERT INTO credentials(email, uid, password_hash, salt, created_at)
                     VALUES(?, ?, ?, ?, ?)",
                    (email, &uid, &hash, &salt, Utc::now().to_rfc3339()),
                )
                .map_err(|e| AuthError::Network(e.to_string()))?;
        }
        Ok(Identity {
            uid,
            email: email.to_string(),
        })
    }

    fn sign_out(&self) {
        if let Ok(mut cached) = self.cached.lock() {
            *cached = None;
        }
        // Clearing the persisted slot is best-effort; the in-memory cache
        // is already gone.
        if let Ok(guard) = self.conn.lock() {
            let _ = guard.execute("DELETE FROM auth_session WHERE slot = 0", []);
        }
    }
}

pub struct SqliteDirectoryStore {
    conn: SharedConnection,
}

impl SqliteDirectoryStore {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn read_document(
        conn: &Connection,
        collection: &str,
        key: &str,
    ) -> Result<Option<Document>, StoreError> {
        let raw: Option<String> = conn
            .query_row(
                "SELECT fields_json FROM documents WHERE collection = ? AND key = ?",
                (collection, key),
                |r| r.get(0),
            )
            .optional()
            .map_err(|e| StoreError::Network(e.to_string()))?;
        let Some(raw) = raw else { return Ok(None) };
        let doc: Document =
            serde_json::from_str(&raw).map_err(|e| StoreError::Network(e.to_string()))?;
        Ok(Some(doc))
    }

    fn write_document(
        conn: &Connection,
        collection: &str,
        key: &str,
        fields: &Document,
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_string(fields).map_err(|e| StoreError::Network(e.to_string()))?;
        conn.execute(
            "INSERT INTO documents(collection, key, fields_json, updated_at)
             VALUES(?, ?, ?, ?)
             ON CONFLICT(collection, key) DO UPDATE SET
               fields_json = excluded.fields_json,
               updated_at = excluded.updated_at",
            (collection, key, &raw, Utc::now().to_rfc3339()),
        )
        .map_err(|e| StoreError::Network(e.to_string()))?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Network("poisoned db lock".to_string()))
    }
}

#[async_trait]
impl DirectoryStore for SqliteDirectoryStore {
    async fn get_document(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Document>, StoreError> {
        let guard = self.lock()?;
        Self::read_document(&guard, collection, key)
    }

    async fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare("SELECT fields_json FROM documents WHERE collection = ? ORDER BY key")
            .map_err(|e| StoreError::Network(e.to_string()))?;
        let raws = stmt
            .query_map([collection], |r| r.get::<_, String>(0))
            .and_then(|it| it.collect::<Result<Vec<_>, _>>())
            .map_err(|e| StoreError::Network(e.to_string()))?;
        let mut out = Vec::new();
        for raw in raws {
            let doc: Document =
                serde_json::from_str(&raw).map_err(|e| StoreError::Network(e.to_string()))?;
            if filter.matches(&doc) {
                out.push(doc);
            }
        }
        Ok(out)
    }

    async fn set_document(
        &self,
        collection: &str,
        key: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        let guard = self.lock()?;
        Self::write_document(&guard, collection, key, &fields)
    }

    async fn update_fields(
        &self,
        collection: &str,
        key: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        let guard = self.lock()?;
        let mut doc = Self::read_document(&guard, collection, key)?.unwrap_or_default();
        for (field, value) in fields {
            doc.insert(field, value);
        }
        Self::write_document(&guard, collection, key, &doc)
    }

    async fn delete_document(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "DELETE FROM documents WHERE collection = ? AND key = ?",
                (collection, key),
            )
            .map_err(|e| StoreError::Network(e.to_string()))?;
        Ok(())
    }
}
