//! reqwest implementation of the tax-rate SDK

use super::TaxRateSdk;
use crate::config::AdminConfig;
use crate::types::{
    CreateTaxRatePayload, ListTaxRatesQuery, TaxRateDeleteResponse, TaxRateListResponse,
    TaxRateResponse, UpdateTaxRatePayload,
};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// Error body returned by the admin API
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// HTTP client for the admin tax-rate endpoints
#[derive(Debug, Clone)]
pub struct HttpSdk {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpSdk {
    /// Create with explicit base URL and token
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into();
        tracing::info!(%base_url, "Creating admin API client");
        Self {
            base_url,
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create from loaded configuration
    pub fn from_config(config: &AdminConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.base_url.clone(), config.token.clone()))
    }

    fn url(&self, path: &str, query: Option<&ListTaxRatesQuery>) -> String {
        let mut url = format!("{}/admin/tax-rates{}", self.base_url, path);
        if let Some(qs) = query.and_then(query_string) {
            url.push('?');
            url.push_str(&qs);
        }
        url
    }

    /// Map a non-success response to an error, decoding the API's error body
    /// when it has one
    async fn error_for(&self, id: Option<&str>, response: reqwest::Response) -> Error {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Error::NotFound(id.unwrap_or("tax rate").to_string());
        }
        let message = response
            .json::<ErrorResponse>()
            .await
            .map(|e| e.message)
            .unwrap_or_else(|_| "Unknown error".to_string());
        Error::Api {
            status: status.as_u16(),
            message,
        }
    }
}

/// Build a URL query string from the filter's set fields
///
/// Returns `None` when every field is unset.
fn query_string(query: &ListTaxRatesQuery) -> Option<String> {
    if query.is_empty() {
        return None;
    }
    let object = match serde_json::to_value(query) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => return None,
    };
    let pairs: Vec<String> = object
        .iter()
        .map(|(k, v)| {
            let raw = match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{}={}", k, urlencoding::encode(&raw))
        })
        .collect();
    Some(pairs.join("&"))
}

#[async_trait]
impl TaxRateSdk for HttpSdk {
    async fn retrieve(
        &self,
        id: &str,
        query: Option<&ListTaxRatesQuery>,
    ) -> Result<TaxRateResponse> {
        let url = self.url(&format!("/{}", id), query);
        tracing::debug!(%url, "GET tax rate");

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.error_for(Some(id), response).await);
        }

        Ok(response.json().await?)
    }

    async fn list(&self, query: Option<&ListTaxRatesQuery>) -> Result<TaxRateListResponse> {
        let url = self.url("", query);
        tracing::debug!(%url, "GET tax rates");

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.error_for(None, response).await);
        }

        Ok(response.json().await?)
    }

    async fn create(&self, payload: &CreateTaxRatePayload) -> Result<TaxRateResponse> {
        let url = self.url("", None);
        tracing::debug!(%url, name = %payload.name, "POST tax rate");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.error_for(None, response).await);
        }

        Ok(response.json().await?)
    }

    async fn update(&self, id: &str, payload: &UpdateTaxRatePayload) -> Result<TaxRateResponse> {
        let url = self.url(&format!("/{}", id), None);
        tracing::debug!(%url, "POST tax rate update");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.error_for(Some(id), response).await);
        }

        Ok(response.json().await?)
    }

    async fn delete(&self, id: &str) -> Result<TaxRateDeleteResponse> {
        let url = self.url(&format!("/{}", id), None);
        tracing::debug!(%url, "DELETE tax rate");

        let response = self
            .client
            .delete(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.error_for(Some(id), response).await);
        }

        Ok(response.json().await?)
    }
}
