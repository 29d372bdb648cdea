//! SDK client for the admin tax-rate endpoints
//!
//! The binding layer talks to the API through the `TaxRateSdk` trait, so
//! tests substitute a mock and the HTTP transport stays swappable. `HttpSdk`
//! is the reqwest-backed implementation.

mod http;

pub use http::HttpSdk;

use crate::types::{
    CreateTaxRatePayload, ListTaxRatesQuery, TaxRateDeleteResponse, TaxRateListResponse,
    TaxRateResponse, UpdateTaxRatePayload,
};
use crate::Result;
use async_trait::async_trait;

/// Contract consumed by the hooks layer
///
/// All operations are asynchronous and single-attempt; retry policy, if any,
/// lives with the caller's cache configuration, never here.
#[async_trait]
pub trait TaxRateSdk: Send + Sync {
    /// Fetch one tax rate by id
    async fn retrieve(
        &self,
        id: &str,
        query: Option<&ListTaxRatesQuery>,
    ) -> Result<TaxRateResponse>;

    /// Fetch a page of tax rates matching `query`
    async fn list(&self, query: Option<&ListTaxRatesQuery>) -> Result<TaxRateListResponse>;

    /// Create a tax rate
    async fn create(&self, payload: &CreateTaxRatePayload) -> Result<TaxRateResponse>;

    /// Update a tax rate
    async fn update(&self, id: &str, payload: &UpdateTaxRatePayload) -> Result<TaxRateResponse>;

    /// Delete a tax rate
    async fn delete(&self, id: &str) -> Result<TaxRateDeleteResponse>;
}
