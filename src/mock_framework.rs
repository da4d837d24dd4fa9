//! # Mock Framework
//!
//! Stand-ins for the remote catalog service.
//!
//! Use [`create_mock_service`] to get a service and a receiver of the calls made on
//! it, then helpers like [`expect_list`] or [`expect_update`] to assert each call and
//! decide its outcome. [`FakeCatalogService`] is a small in-memory service for
//! flows where scripting every reply would be noise.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::{mpsc, oneshot};

use crate::domain::{Product, ProductFields, ProductPatch};
use crate::remote::{CatalogService, RemoteError};

pub type Reply<T> = oneshot::Sender<Result<T, RemoteError>>;

/// A call received by [`MockCatalogService`].
#[derive(Debug)]
pub enum ServiceCall {
    List { respond_to: Reply<Vec<Product>> },
    Create { fields: ProductFields, respond_to: Reply<Product> },
    Update { id: String, fields: ProductFields, respond_to: Reply<Option<ProductPatch>> },
    Delete { id: String, respond_to: Reply<()> },
}

/// Forwards every call to the test holding the receiver and waits for its reply.
///
/// # Testing Strategy
/// The catalog actor is exercised for real; only the network edge is replaced.
/// Because the test answers each call itself, it controls ordering precisely,
/// including replying to two outstanding loads in reverse order.
#[derive(Clone)]
pub struct MockCatalogService {
    sender: mpsc::UnboundedSender<ServiceCall>,
}

pub fn create_mock_service() -> (MockCatalogService, mpsc::UnboundedReceiver<ServiceCall>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (MockCatalogService { sender }, receiver)
}

impl MockCatalogService {
    async fn call<T>(&self, make: impl FnOnce(Reply<T>) -> ServiceCall) -> Result<T, RemoteError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(make(respond_to))
            .map_err(|_| RemoteError::Transport("mock receiver closed".to_string()))?;
        response
            .await
            .map_err(|_| RemoteError::Transport("mock reply dropped".to_string()))?
    }
}

impl CatalogService for MockCatalogService {
    async fn list(&self) -> Result<Vec<Product>, RemoteError> {
        self.call(|respond_to| ServiceCall::List { respond_to }).await
    }

    async fn create(&self, fields: &ProductFields) -> Result<Product, RemoteError> {
        let fields = fields.clone();
        self.call(|respond_to| ServiceCall::Create { fields, respond_to }).await
    }

    async fn update(&self, id: &str, fields: &ProductFields) -> Result<Option<ProductPatch>, RemoteError> {
        let (id, fields) = (id.to_string(), fields.clone());
        self.call(|respond_to| ServiceCall::Update { id, fields, respond_to }).await
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        let id = id.to_string();
        self.call(|respond_to| ServiceCall::Delete { id, respond_to }).await
    }
}

/// Helper to verify that the next call is a list request
pub async fn expect_list(receiver: &mut mpsc::UnboundedReceiver<ServiceCall>) -> Option<Reply<Vec<Product>>> {
    match receiver.recv().await {
        Some(ServiceCall::List { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next call is a create request
pub async fn expect_create(
    receiver: &mut mpsc::UnboundedReceiver<ServiceCall>,
) -> Option<(ProductFields, Reply<Product>)> {
    match receiver.recv().await {
        Some(ServiceCall::Create { fields, respond_to }) => Some((fields, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is an update request
pub async fn expect_update(
    receiver: &mut mpsc::UnboundedReceiver<ServiceCall>,
) -> Option<(String, ProductFields, Reply<Option<ProductPatch>>)> {
    match receiver.recv().await {
        Some(ServiceCall::Update { id, fields, respond_to }) => Some((id, fields, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is a delete request
pub async fn expect_delete(receiver: &mut mpsc::UnboundedReceiver<ServiceCall>) -> Option<(String, Reply<()>)> {
    match receiver.recv().await {
        Some(ServiceCall::Delete { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// A product as the service would return it.
pub fn sample_product(id: &str, name: &str, shop: &str, cost_price: f64, quantity: f64) -> Product {
    let fields = crate::domain::ProductCreate::new(name, quantity, crate::domain::Unit::Kg, cost_price, shop)
        .into_fields();
    Product::from_fields(id, fields, None)
}

#[derive(Default)]
struct FakeState {
    products: Vec<Product>,
    next_id: u64,
    requests: usize,
    fail_next: Option<RemoteError>,
}

/// In-memory catalog service that assigns ids and creation timestamps the way the
/// real service does. Clones share state, so a test can keep one to inspect.
#[derive(Clone, Default)]
pub struct FakeCatalogService {
    state: Arc<Mutex<FakeState>>,
}

fn not_found(id: &str) -> RemoteError {
    RemoteError::Status { status: 404, message: Some(format!("Product {} not found", id)) }
}

impl FakeCatalogService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests the service has received.
    pub fn requests(&self) -> usize {
        self.with_state(|state| state.requests)
    }

    pub fn stored(&self) -> Vec<Product> {
        self.with_state(|state| state.products.clone())
    }

    /// Makes the next request fail with `err` without touching stored data.
    pub fn fail_next(&self, err: RemoteError) {
        self.with_state(|state| state.fail_next = Some(err));
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut state)
    }

    /// Counts the request and consumes a pending injected failure.
    fn handle<T>(&self, f: impl FnOnce(&mut FakeState) -> Result<T, RemoteError>) -> Result<T, RemoteError> {
        self.with_state(|state| {
            state.requests += 1;
            match state.fail_next.take() {
                Some(err) => Err(err),
                None => f(state),
            }
        })
    }

    fn timestamp(n: u64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(n as i64)
    }
}

impl CatalogService for FakeCatalogService {
    async fn list(&self) -> Result<Vec<Product>, RemoteError> {
        self.handle(|state| Ok(state.products.clone()))
    }

    async fn create(&self, fields: &ProductFields) -> Result<Product, RemoteError> {
        self.handle(|state| {
            if fields.quantity <= 0.0 {
                return Err(RemoteError::Status { status: 400, message: Some("Quantity must be positive".to_string()) });
            }
            state.next_id += 1;
            let id = format!("prod_{}", state.next_id);
            let product = Product::from_fields(id, fields.clone(), Some(Self::timestamp(state.next_id)));
            state.products.push(product.clone());
            Ok(product)
        })
    }

    async fn update(&self, id: &str, fields: &ProductFields) -> Result<Option<ProductPatch>, RemoteError> {
        self.handle(|state| {
            let record = state.products.iter_mut().find(|p| p.id == id).ok_or_else(|| not_found(id))?;
            record.apply(&fields.as_patch());
            let echo = ProductPatch { created_at: record.created_at, ..record.fields().as_patch() };
            Ok(Some(echo))
        })
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.handle(|state| {
            let before = state.products.len();
            state.products.retain(|p| p.id != id);
            if state.products.len() == before {
                Err(not_found(id))
            } else {
                Ok(())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_service() {
        let (service, mut receiver) = create_mock_service();

        let list_task = tokio::spawn(async move { service.list().await });

        let responder = expect_list(&mut receiver).await.expect("Expected List call");
        responder.send(Ok(vec![sample_product("p1", "Rice", "A", 50.0, 2.0)])).unwrap();

        let products = list_task.await.unwrap().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price_per_unit, 25.0);
    }

    #[tokio::test]
    async fn fake_service_assigns_ids_and_timestamps() {
        let service = FakeCatalogService::new();
        let fields = crate::domain::ProductCreate::new("Oil", 5.0, crate::domain::Unit::Lit, 25.0, "X").into_fields();

        let first = service.create(&fields).await.unwrap();
        let second = service.create(&fields).await.unwrap();

        assert_eq!(first.id, "prod_1");
        assert_eq!(second.id, "prod_2");
        assert!(second.created_at > first.created_at);
        assert_eq!(service.requests(), 2);
    }

    #[tokio::test]
    async fn fake_service_injects_one_failure() {
        let service = FakeCatalogService::new();
        service.fail_next(RemoteError::Transport("offline".into()));

        assert!(service.list().await.is_err());
        assert!(service.list().await.unwrap().is_empty());
        assert_eq!(service.delete("missing").await, Err(not_found("missing")));
    }
}
