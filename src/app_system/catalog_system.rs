use std::sync::Arc;

use tracing::{error, info};

use crate::catalog_actor::CatalogActor;
use crate::cli::Config;
use crate::clients::CatalogClient;
use crate::remote::{CatalogService, HttpCatalogService, RemoteError};
use crate::session::{FileKeyValueStore, SessionGate};

const CATALOG_BUFFER: usize = 32;

/// Root of the application: owns the running catalog actor and the session gate,
/// and hands both to whatever drives the UI.
pub struct CatalogSystem {
    pub catalog: CatalogClient,
    pub session: SessionGate,
    handle: tokio::task::JoinHandle<()>,
}

impl CatalogSystem {
    /// Starts the catalog actor on `service`.
    pub fn new<S: CatalogService>(service: S, session: SessionGate) -> Self {
        let (actor, catalog) = CatalogActor::new(CATALOG_BUFFER, service);
        let handle = tokio::spawn(actor.run());
        info!("Catalog system started");
        Self { catalog, session, handle }
    }

    /// Wires the HTTP catalog service and the file-backed session store from `config`.
    pub fn from_config(config: &Config) -> Result<Self, RemoteError> {
        let service = HttpCatalogService::new(config.api_base_url.clone(), config.request_timeout)?;
        let store = Arc::new(FileKeyValueStore::new(config.session_file.clone()));
        let session = SessionGate::new(store, config.access_pin.clone());
        Ok(Self::new(service, session))
    }

    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");
        if let Err(e) = self.catalog.shutdown().await {
            error!(error = %e, "Catalog actor already gone");
        }
        drop(self.catalog);

        if let Err(e) = self.handle.await {
            error!("Actor task failed: {:?}", e);
            return Err(format!("Actor task failed: {:?}", e));
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
