use std::time::Duration;

use reqwest::{Response, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{CatalogService, RemoteError};
use crate::domain::{Product, ProductFields, ProductPatch};

const PRODUCTS_PATH: [&str; 2] = ["api", "products"];

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// [`CatalogService`] over the service's HTTP/JSON API.
#[derive(Clone)]
pub struct HttpCatalogService {
    base: Url,
    client: reqwest::Client,
}

impl HttpCatalogService {
    /// `base_url` is the service root, e.g. `http://localhost:5000`. Request timeouts
    /// are enforced here rather than by the store.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let base_url = base_url.into();
        let base = Url::parse(&base_url)
            .map_err(|e| RemoteError::Transport(format!("Invalid service URL {:?}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::Transport(format!("Invalid service URL {:?}", base_url)));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(Self { base, client })
    }

    fn collection_url(&self) -> Url {
        self.endpoint(None)
    }

    /// The id is pushed as a single percent-encoded path segment.
    fn item_url(&self, id: &str) -> Url {
        self.endpoint(Some(id))
    }

    fn endpoint(&self, id: Option<&str>) -> Url {
        let mut url = self.base.clone();
        // `new` rejects cannot-be-a-base URLs, so the segments are always editable.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(PRODUCTS_PATH);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url
    }
}

/// Turns a non-success response into [`RemoteError::Status`], keeping the service's
/// `message` when the body carries one.
async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty());
    warn!(status = status.as_u16(), body = %body, "Catalog service rejected request");
    Err(RemoteError::Status { status: status.as_u16(), message })
}

/// Decodes the collection record by record. A record that cannot be read is logged
/// and skipped so one bad document does not hide the rest of the catalog.
fn decode_products(body: &str) -> Result<Vec<Product>, RemoteError> {
    let records: Vec<serde_json::Value> =
        serde_json::from_str(body).map_err(|e| RemoteError::Decode(e.to_string()))?;
    let total = records.len();
    let products: Vec<Product> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value::<Product>(record) {
            Ok(product) => Some(product),
            Err(e) => {
                warn!(index, error = %e, "Skipping unreadable product record");
                None
            }
        })
        .collect();
    if products.len() < total {
        warn!(skipped = total - products.len(), total, "Some product records were skipped");
    }
    Ok(products)
}

impl CatalogService for HttpCatalogService {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Product>, RemoteError> {
        debug!("Sending request");
        let response = self.client.get(self.collection_url()).send().await?;
        let body = check_status(response).await?.text().await?;
        decode_products(&body)
    }

    #[instrument(skip(self, payload), fields(name = %payload.name))]
    async fn create(&self, payload: &ProductFields) -> Result<Product, RemoteError> {
        debug!("Sending request");
        let response = self
            .client
            .post(self.collection_url())
            .json(payload)
            .send()
            .await?;
        let mut product: Product = check_status(response).await?.json().await?;
        product.refresh_derived();
        Ok(product)
    }

    #[instrument(skip(self, payload))]
    async fn update(&self, id: &str, payload: &ProductFields) -> Result<Option<ProductPatch>, RemoteError> {
        debug!("Sending request");
        let response = self.client.put(self.item_url(id)).json(payload).send().await?;
        let body = check_status(response).await?.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<ProductPatch>(&body) {
            Ok(echo) => Ok(Some(echo)),
            Err(e) => {
                debug!(error = %e, "Ignoring unreadable update acknowledgment");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        debug!("Sending request");
        let response = self.client.delete(self.item_url(id)).send().await?;
        let response = check_status(response).await?;
        debug!(no_content = response.status() == StatusCode::NO_CONTENT, "Delete acknowledged");
        Ok(())
    }
}
