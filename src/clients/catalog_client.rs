use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::catalog_actor::{CatalogError, CatalogRequest};
use crate::domain::{Product, ProductCreate, ProductPatch};
use crate::view::ViewQuery;

/// Handle for the catalog actor. Cheap to clone; every clone talks to the same
/// in-memory catalog.
#[derive(Clone)]
pub struct CatalogClient {
    sender: mpsc::Sender<CatalogRequest>,
    loading: watch::Receiver<bool>,
}

impl CatalogClient {
    pub fn new(sender: mpsc::Sender<CatalogRequest>, loading: watch::Receiver<bool>) -> Self {
        Self { sender, loading }
    }

    /// Observes whether a load is in flight.
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading.clone()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Asks the actor to stop once its outstanding remote calls finish.
    pub async fn shutdown(&self) -> Result<(), CatalogError> {
        debug!("Sending shutdown");
        self.sender
            .send(CatalogRequest::Shutdown)
            .await
            .map_err(|_| CatalogError::ActorCommunicationError("Actor closed".to_string()))
    }
}

// Fetch the full collection and replace the local catalog.
client_method!(CatalogClient => fn load() -> Vec<Product> as CatalogRequest::Load);
// Validate locally, create remotely, then reload. Returns the created record.
client_method!(CatalogClient => fn create(product: ProductCreate) -> Product as CatalogRequest::Create);
client_method!(CatalogClient => fn update(id: String, patch: ProductPatch) -> Product as CatalogRequest::Update);
client_method!(CatalogClient => fn remove(id: String) -> () as CatalogRequest::Remove);
client_method!(CatalogClient => fn snapshot() -> Vec<Product> as CatalogRequest::Snapshot);
client_method!(CatalogClient => fn project(query: ViewQuery) -> Vec<Product> as CatalogRequest::Project);
#[cfg(test)]
client_method!(CatalogClient => fn get_generation() -> u64 as CatalogRequest::GetGeneration);
