//! Start-destination resolution: the one decision flow the app runs per
//! launch. Given the cached identity and the users/{uid} document, pick
//! exactly one start screen.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::gateway::{AuthGateway, DirectoryStore, StoreError};
use crate::model::{Destination, Role, UserRecord};

pub const USERS_COLLECTION: &str = "users";

// Remote calls get an explicit bound instead of hanging on the transport.
const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one resolution attempt.
///
/// `Failed` is deliberately distinct from a `Welcome` destination: a
/// transient directory failure must not silently demote a signed-in user
/// to the logged-out flow. The caller decides whether to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Destination(Destination),
    Failed { reason: String },
}

pub struct SessionResolver {
    auth: Arc<dyn AuthGateway>,
    store: Arc<dyn DirectoryStore>,
    remote_timeout: Duration,
    resolved: Mutex<Option<Destination>>,
}

/// Maps a decoded user record to its start screen. Admins are routed to
/// the approval console regardless of status; pending student/faculty
/// accounts are held at the pending screen.
pub fn destination_for(record: &UserRecord) -> Destination {
    match record.role {
        Role::Admin => Destination::AdminApproval,
        _ if record.is_pending() => Destination::PendingApproval,
        Role::Student => Destination::StudentHome,
        Role::Faculty => Destination::FacultyHome,
    }
}

impl SessionResolver {
    pub fn new(auth: Arc<dyn AuthGateway>, store: Arc<dyn DirectoryStore>) -> Self {
        Self {
            auth,
            store,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            resolved: Mutex::new(None),
        }
    }

    pub fn with_timeout(mut self, remote_timeout: Duration) -> Self {
        self.remote_timeout = remote_timeout;
        self
    }

    /// Computes the start destination for this launch.
    ///
    /// Successful resolutions are memoized: re-invocation (a re-rendered
    /// loading screen, for instance) returns the cached destination
    /// without touching either gateway again. Failed attempts are not
    /// memoized, so the caller may retry.
    pub async fn resolve(&self) -> Resolution {
        let mut resolved = self.resolved.lock().await;
        if let Some(dest) = resolved.as_ref() {
            return Resolution::Destination(dest.clone());
        }

        let Some(identity) = self.auth.current_identity() else {
            debug!("no cached identity, starting at welcome");
            *resolved = Some(Destination::Welcome);
            return Resolution::Destination(Destination::Welcome);
        };

        // The record fetch is only issued once the identity is known; no
        // speculative lookups.
        let fetched = tokio::time::timeout(
            self.remote_timeout,
            self.store.get_document(USERS_COLLECTION, &identity.uid),
        )
        .await
        .unwrap_or_else(|_| Err(StoreError::Network("directory fetch timed out".to_string())));

        let dest = match fetched {
            Err(e) => {
                warn!(uid = %identity.uid, error = %e, "resolution failed, retry allowed");
                return Resolution::Failed {
                    reason: e.to_string(),
                };
            }
            Ok(None) => {
                debug!(uid = %identity.uid, "no user record, treating session as logged out");
                Destination::Welcome
            }
            Ok(Some(doc)) => match UserRecord::decode(&doc) {
                Ok(record) => destination_for(&record),
                Err(e) => {
                    // Corrupt directory data is terminal, not retryable.
                    warn!(uid = %identity.uid, error = %e, "falling back to welcome");
                    Destination::Welcome
                }
            },
        };

        debug!(destination = %dest.route(), "session resolved");
        *resolved = Some(dest.clone());
        Resolution::Destination(dest)
    }

    /// Starts a new resolution epoch. Called after sign-in/sign-out so the
    /// next `resolve` re-reads the ambient identity.
    pub async fn invalidate(&self) {
        *self.resolved.lock().await = None;
    }
}
