use tokio::sync::oneshot;

use super::CatalogError;
use crate::domain::{Product, ProductCreate, ProductFields, ProductPatch};
use crate::remote::RemoteError;
use crate::view::ViewQuery;

pub type Response<T> = oneshot::Sender<Result<T, CatalogError>>;

/// Requests accepted by the catalog actor. Each variant carries its parameters
/// and a oneshot channel for the reply.
#[derive(Debug)]
pub enum CatalogRequest {
    Load {
        respond_to: Response<Vec<Product>>,
    },
    Create {
        product: ProductCreate,
        respond_to: Response<Product>,
    },
    Update {
        id: String,
        patch: ProductPatch,
        respond_to: Response<Product>,
    },
    Remove {
        id: String,
        respond_to: Response<()>,
    },
    Snapshot {
        respond_to: Response<Vec<Product>>,
    },
    Project {
        query: ViewQuery,
        respond_to: Response<Vec<Product>>,
    },
    Shutdown,
    #[cfg(test)]
    GetGeneration {
        respond_to: Response<u64>,
    },
}

/// Who is waiting on a load: a plain `load()` caller, or a `create()` caller whose
/// product was accepted and is waiting for the follow-up reload.
pub(super) enum LoadWaiter {
    Load(Response<Vec<Product>>),
    Create {
        created: Product,
        respond_to: Response<Product>,
    },
}

/// Results of remote calls, fed back into the actor loop so they are applied one
/// at a time.
pub(super) enum Completion {
    Loaded {
        generation: u64,
        result: Result<Vec<Product>, RemoteError>,
        waiter: LoadWaiter,
    },
    Created {
        result: Result<Product, RemoteError>,
        respond_to: Response<Product>,
    },
    Updated {
        id: String,
        sent: ProductFields,
        result: Result<Option<ProductPatch>, RemoteError>,
        respond_to: Response<Product>,
    },
    Removed {
        id: String,
        result: Result<(), RemoteError>,
        respond_to: Response<()>,
    },
}
