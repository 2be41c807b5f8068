use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use crate::gateway::local::{LocalAuthGateway, SharedConnection, SqliteDirectoryStore};
use crate::gateway::{AuthGateway, DirectoryStore};
use crate::model::Destination;
use crate::nav::Navigator;
use crate::session::SessionResolver;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything constructed at workspace open: the injected gateways, the
/// per-launch resolver and the navigation stack.
pub struct Services {
    pub auth: Arc<dyn AuthGateway>,
    pub store: Arc<dyn DirectoryStore>,
    pub resolver: SessionResolver,
    pub navigator: Navigator,
}

impl Services {
    pub fn open(conn: SharedConnection) -> anyhow::Result<Self> {
        let auth: Arc<dyn AuthGateway> = Arc::new(LocalAuthGateway::open(Arc::clone(&conn))?);
        let store: Arc<dyn DirectoryStore> = Arc::new(SqliteDirectoryStore::new(conn));
        let resolver = SessionResolver::new(Arc::clone(&auth), Arc::clone(&store));
        Ok(Self {
            auth,
            store,
            resolver,
            navigator: Navigator::new(Destination::Welcome),
        })
    }
}

#[derive(Default)]
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub services: Option<Services>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}
