//! API request/response shapes for the admin tax-rate resource
//!
//! Matches the admin API JSON schema. Response wrappers mirror the envelope
//! the server uses (`{"tax_rate": {...}}`, `{"tax_rates": [...], "count": n}`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tax rate record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRate {
    /// Unique identifier (e.g., "txr_01H...")
    pub id: String,

    /// Display name
    pub name: String,

    /// Tax code (e.g., "US-TX")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Percentage rate (e.g., 7.25); None when the rate is inherited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,

    /// Whether this is the default rate for its region
    #[serde(default)]
    pub is_default: bool,

    /// Whether this rate combines with the region default
    #[serde(default)]
    pub is_combinable: bool,

    /// Owning tax region
    pub tax_region_id: String,

    /// Free-form metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Envelope for single-record responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRateResponse {
    pub tax_rate: TaxRate,
}

/// Envelope for list responses, with pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRateListResponse {
    pub tax_rates: Vec<TaxRate>,
    pub count: usize,
    pub offset: usize,
    pub limit: usize,
}

/// Envelope for delete responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRateDeleteResponse {
    /// Identifier of the deleted record
    pub id: String,

    /// Resource type tag ("tax_rate")
    pub object: String,

    pub deleted: bool,
}

/// Payload for creating a tax rate
///
/// Field validation is owned by the server; this layer forwards the payload
/// as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateTaxRatePayload {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,

    pub tax_region_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_combinable: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Partial payload for updating a tax rate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTaxRatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_combinable: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Filter/pagination parameters for list and retrieve calls
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListTaxRatesQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,

    /// Sort order (e.g., "-created_at")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,

    /// Free-text search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_region_id: Option<String>,
}

impl ListTaxRatesQuery {
    /// Whether every field is unset
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
