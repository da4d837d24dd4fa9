//! The remote catalog service the store synchronizes with.
//!
//! [`CatalogService`] is the request/response contract; [`HttpCatalogService`] speaks
//! it over HTTP/JSON. Tests substitute the implementations in `mock_framework`.

mod error;
mod http;

pub use error::*;
pub use http::*;

use std::future::Future;

use crate::domain::{Product, ProductFields, ProductPatch};

pub trait CatalogService: Send + Sync + 'static {
    /// Fetches the whole collection in service order.
    fn list(&self) -> impl Future<Output = Result<Vec<Product>, RemoteError>> + Send;

    /// Creates a product and returns the record with its service-assigned fields.
    fn create(&self, fields: &ProductFields) -> impl Future<Output = Result<Product, RemoteError>> + Send;

    /// Replaces the fields of `id`. Returns whatever subset of the record the
    /// service echoed back, or `None` when it acknowledged without a body.
    fn update(
        &self,
        id: &str,
        fields: &ProductFields,
    ) -> impl Future<Output = Result<Option<ProductPatch>, RemoteError>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = Result<(), RemoteError>> + Send;
}
