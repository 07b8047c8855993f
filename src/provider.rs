//! Provider-agnostic collaborator interfaces
//!
//! Scanners never talk to a cloud SDK directly. They go through three traits:
//!
//! - `InventoryProvider`: lists resources and their billing attributes
//! - `MetricsProvider`: returns time-series samples for one metric
//! - `PricingCatalog`: optional live price lookups
//!
//! The AWS implementations live in `crate::aws`. Tests substitute in-memory
//! fakes or `mockall` mocks.

use crate::error::Result;
use crate::types::{
    Bucket, ComputeInstance, DatabaseInstance, DatabaseSnapshot, Volume, VolumeFilter,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Statistic requested from the metrics backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statistic {
    Average,
    Sum,
}

/// Metric dimension (name/value pair)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Lookback window for a metrics query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window of `days` ending at `end`
    pub fn days_ending_at(end: DateTime<Utc>, days: u32) -> Self {
        Self {
            start: end - Duration::days(i64::from(days)),
            end,
        }
    }

    /// Window of `days` ending now
    pub fn last_days(days: u32) -> Self {
        Self::days_ending_at(Utc::now(), days)
    }
}

/// A single metrics request
#[derive(Debug, Clone, PartialEq)]
pub struct MetricQuery {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Vec<Dimension>,
    pub window: TimeWindow,
    pub period_secs: i32,
    pub statistic: Statistic,
    /// Region to query; `None` means the provider's default region
    pub region: Option<String>,
}

impl MetricQuery {
    pub fn new(
        namespace: &str,
        metric_name: &str,
        dimensions: Vec<Dimension>,
        window: TimeWindow,
        period_secs: i32,
        statistic: Statistic,
    ) -> Self {
        Self {
            namespace: namespace.to_string(),
            metric_name: metric_name.to_string(),
            dimensions,
            window,
            period_secs,
            statistic,
            region: None,
        }
    }

    pub fn in_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Value of the named dimension, if present
    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }
}

/// One time-series sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// TERM_MATCH filter for price list queries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceFilter {
    pub field: String,
    pub value: String,
}

impl PriceFilter {
    pub fn term(field: &str, value: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

/// Lists resources from the cloud provider
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    /// Running compute instances in `region`
    async fn list_running_compute(&self, region: &str) -> Result<Vec<ComputeInstance>>;

    /// Block volumes in `region`, optionally filtered
    async fn list_volumes(&self, region: &str, filter: Option<VolumeFilter>)
        -> Result<Vec<Volume>>;

    /// Managed database instances in `region`
    async fn list_database_instances(&self, region: &str) -> Result<Vec<DatabaseInstance>>;

    /// Manually created database snapshots in `region`
    async fn list_manual_snapshots(&self, region: &str) -> Result<Vec<DatabaseSnapshot>>;

    /// All buckets in the account; `region` and storage fields are unset
    async fn list_buckets(&self) -> Result<Vec<Bucket>>;

    /// Region a bucket lives in
    async fn get_bucket_region(&self, bucket_name: &str) -> Result<String>;
}

/// Time-series metrics backend
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn get_samples(&self, query: &MetricQuery) -> Result<Vec<Sample>>;
}

/// Live price list
#[async_trait]
pub trait PricingCatalog: Send + Sync {
    /// Price per unit in USD for the first product matching `filters` in
    /// `region`, or `None` if no product matched.
    async fn lookup_price(
        &self,
        service_code: &str,
        filters: &[PriceFilter],
        region: &str,
    ) -> Result<Option<f64>>;
}
