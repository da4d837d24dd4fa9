use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn, Instrument};

use super::messages::{Completion, LoadWaiter, Response};
use super::{CatalogError, CatalogRequest};
use crate::clients::CatalogClient;
use crate::domain::{Product, ProductCreate, ProductPatch};
use crate::remote::CatalogService;
use crate::view;

const LOAD_FAILED: &str = "Failed to load products.";
const CREATE_FAILED: &str = "Failed to add product.";
const UPDATE_FAILED: &str = "Failed to update product.";
const DELETE_FAILED: &str = "Failed to delete product.";

/// Owner of the in-memory catalog.
///
/// Remote calls run in spawned tasks; their results come back on an internal
/// channel and are applied inside [`CatalogActor::run`], one at a time, so the
/// collection has exactly one mutator and is never observed half-updated.
///
/// Every load is stamped with a generation. Only the most recently issued load may
/// replace the collection; older responses are discarded when they arrive.
/// Concurrent update/remove of the same id are not ordered: whichever completes
/// last decides the in-memory state.
pub struct CatalogActor<S: CatalogService> {
    receiver: mpsc::Receiver<CatalogRequest>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    service: Arc<S>,
    products: Vec<Product>,
    generation: u64,
    loads_in_flight: usize,
    in_flight: usize,
    loading: watch::Sender<bool>,
}

impl<S: CatalogService> CatalogActor<S> {
    pub fn new(buffer_size: usize, service: S) -> (Self, CatalogClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (loading, loading_rx) = watch::channel(false);
        let actor = Self {
            receiver,
            completions_tx,
            completions,
            service: Arc::new(service),
            products: Vec::new(),
            generation: 0,
            loads_in_flight: 0,
            in_flight: 0,
            loading,
        };
        let client = CatalogClient::new(sender, loading_rx);
        (actor, client)
    }

    /// Main actor loop. Stops after the request channel closes (or `Shutdown`
    /// arrives) and every outstanding remote call has completed.
    #[instrument(name = "catalog_actor", skip(self))]
    pub async fn run(mut self) {
        info!("CatalogActor starting");
        let mut accepting = true;

        loop {
            tokio::select! {
                msg = self.receiver.recv(), if accepting => match msg {
                    Some(CatalogRequest::Shutdown) | None => {
                        info!(in_flight = self.in_flight, "CatalogActor shutting down");
                        accepting = false;
                    }
                    Some(request) => self.handle_request(request),
                },
                Some(done) = self.completions.recv(), if self.in_flight > 0 => {
                    self.in_flight -= 1;
                    self.handle_completion(done);
                }
                else => break,
            }

            if !accepting && self.in_flight == 0 {
                break;
            }
        }

        info!("CatalogActor stopped");
    }

    fn handle_request(&mut self, request: CatalogRequest) {
        match request {
            CatalogRequest::Load { respond_to } => self.start_load(LoadWaiter::Load(respond_to)),
            CatalogRequest::Create { product, respond_to } => self.handle_create(product, respond_to),
            CatalogRequest::Update { id, patch, respond_to } => self.handle_update(id, patch, respond_to),
            CatalogRequest::Remove { id, respond_to } => self.handle_remove(id, respond_to),
            CatalogRequest::Snapshot { respond_to } => {
                let _ = respond_to.send(Ok(self.products.clone()));
            }
            CatalogRequest::Project { query, respond_to } => {
                let _ = respond_to.send(Ok(view::project(&self.products, &query)));
            }
            // Intercepted by the run loop.
            CatalogRequest::Shutdown => {}
            #[cfg(test)]
            CatalogRequest::GetGeneration { respond_to } => {
                let _ = respond_to.send(Ok(self.generation));
            }
        }
    }

    fn handle_completion(&mut self, done: Completion) {
        match done {
            Completion::Loaded { generation, result, waiter } => self.finish_load(generation, result, waiter),
            Completion::Created { result, respond_to } => match result {
                Ok(created) => {
                    info!(product_id = %created.id, "Product created, reloading catalog");
                    self.start_load(LoadWaiter::Create { created, respond_to });
                }
                Err(e) => {
                    warn!(error = %e, "Create failed");
                    let _ = respond_to.send(Err(CatalogError::transport(&e, CREATE_FAILED)));
                }
            },
            Completion::Updated { id, sent, result, respond_to } => {
                let outcome = match result {
                    Ok(echo) => self.apply_update(&id, &sent.as_patch(), echo.as_ref()),
                    Err(e) => {
                        warn!(product_id = %id, error = %e, "Update failed");
                        Err(CatalogError::transport(&e, UPDATE_FAILED))
                    }
                };
                let _ = respond_to.send(outcome);
            }
            Completion::Removed { id, result, respond_to } => {
                let outcome = match result {
                    Ok(()) => {
                        let before = self.products.len();
                        self.products.retain(|p| p.id != id);
                        info!(product_id = %id, removed = before - self.products.len(), "Product deleted");
                        Ok(())
                    }
                    Err(e) => {
                        warn!(product_id = %id, error = %e, "Delete failed");
                        Err(CatalogError::transport(&e, DELETE_FAILED))
                    }
                };
                let _ = respond_to.send(outcome);
            }
        }
    }

    /// Runs `work` in its own task and routes its completion back to the loop.
    fn spawn<F>(&mut self, work: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        self.in_flight += 1;
        let completions = self.completions_tx.clone();
        tokio::spawn(
            async move {
                let done = work.await;
                let _ = completions.send(done);
            }
            .in_current_span(),
        );
    }

    fn start_load(&mut self, waiter: LoadWaiter) {
        self.generation += 1;
        let generation = self.generation;
        self.loads_in_flight += 1;
        self.loading.send_replace(true);
        debug!(generation, "Issuing load");

        let service = Arc::clone(&self.service);
        self.spawn(async move {
            let result = service.list().await;
            Completion::Loaded { generation, result, waiter }
        });
    }

    #[instrument(skip(self, result, waiter))]
    fn finish_load(&mut self, generation: u64, result: Result<Vec<Product>, crate::remote::RemoteError>, waiter: LoadWaiter) {
        self.loads_in_flight -= 1;
        if self.loads_in_flight == 0 {
            self.loading.send_replace(false);
        }

        let outcome = match result {
            Ok(mut products) if generation == self.generation => {
                for product in &mut products {
                    product.refresh_derived();
                }
                self.products = products;
                info!(count = self.products.len(), "Catalog loaded");
                Ok(self.products.clone())
            }
            Ok(_) => {
                debug!(latest = self.generation, "Discarding stale load");
                Ok(self.products.clone())
            }
            Err(e) => {
                warn!(error = %e, "Load failed");
                Err(CatalogError::transport(&e, LOAD_FAILED))
            }
        };

        match waiter {
            LoadWaiter::Load(respond_to) => {
                let _ = respond_to.send(outcome);
            }
            LoadWaiter::Create { created, respond_to } => {
                if let Err(e) = &outcome {
                    warn!(error = %e, "Reload after create failed; catalog may be out of date");
                }
                let _ = respond_to.send(Ok(created));
            }
        }
    }

    #[instrument(fields(name = %product.name), skip(self, product, respond_to))]
    fn handle_create(&mut self, product: ProductCreate, respond_to: Response<Product>) {
        debug!("Processing create request");
        let payload = product.into_fields();
        if let Err(message) = payload.validate() {
            warn!(%message, "Rejected invalid product");
            let _ = respond_to.send(Err(CatalogError::ValidationError(message)));
            return;
        }

        let service = Arc::clone(&self.service);
        self.spawn(async move {
            let result = service.create(&payload).await;
            Completion::Created { result, respond_to }
        });
    }

    #[instrument(fields(product_id = %id), skip(self, id, patch, respond_to))]
    fn handle_update(&mut self, id: String, patch: ProductPatch, respond_to: Response<Product>) {
        debug!("Processing update request");
        let Some(current) = self.products.iter().find(|p| p.id == id) else {
            warn!("Product not in catalog");
            let _ = respond_to.send(Err(CatalogError::NotFound(id)));
            return;
        };

        let sent = current.fields().patched(&patch);
        if let Err(message) = sent.validate() {
            warn!(%message, "Rejected invalid update");
            let _ = respond_to.send(Err(CatalogError::ValidationError(message)));
            return;
        }

        let service = Arc::clone(&self.service);
        self.spawn(async move {
            let result = service.update(&id, &sent).await;
            Completion::Updated { id, sent, result, respond_to }
        });
    }

    #[instrument(fields(product_id = %id), skip(self, id, respond_to))]
    fn handle_remove(&mut self, id: String, respond_to: Response<()>) {
        debug!("Processing remove request");
        let service = Arc::clone(&self.service);
        self.spawn(async move {
            let result = service.delete(&id).await;
            Completion::Removed { id, result, respond_to }
        });
    }

    /// Merges an acknowledged update into the stored record. Fields the service
    /// echoed are applied first and the fields that were sent on top, so an echo of
    /// the pre-update document cannot undo the edit.
    fn apply_update(&mut self, id: &str, sent: &ProductPatch, echo: Option<&ProductPatch>) -> Result<Product, CatalogError> {
        let Some(record) = self.products.iter_mut().find(|p| p.id == id) else {
            warn!(product_id = %id, "Updated product is no longer in the catalog");
            return Err(CatalogError::NotFound(id.to_string()));
        };
        if let Some(echo) = echo {
            record.apply(echo);
        }
        record.apply(sent);
        info!(product_id = %id, price_per_unit = record.price_per_unit, "Product updated");
        Ok(record.clone())
    }
}
