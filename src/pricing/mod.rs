//! Monthly cost estimation
//!
//! `PricingResolver` turns billing attributes into an estimated monthly cost.
//! With online pricing preferred and a catalog configured, it asks the live
//! price list first; otherwise, or when the lookup fails or matches nothing, it
//! uses the static default tables. A key missing from the default table falls
//! back to the kind's designated default key and the estimate carries a note
//! the caller records as a diagnostic.
//!
//! Pricing never fails. The resolver is created once per run and shared by
//! `Arc` across scanners; successful catalog lookups are cached for its
//! lifetime, keyed by `(kind, key attributes, region)`. Failed lookups are not
//! cached, so a later resource may still get a live price.

pub mod catalog;
mod ebs;
mod ec2;
mod rds;
mod s3;

pub use ebs::{ebs_price_per_gb, provisioned_performance_cost, EBS_DEFAULT_TYPE};
pub use ec2::{ec2_hourly_rate, EC2_DEFAULT_TYPE};
pub use rds::{rds_hourly_rate, rds_storage_price_per_gb, RDS_DEFAULT_CLASS, SNAPSHOT_PRICE_PER_GB};
pub use s3::{normalize_storage_class, s3_price_per_gb, S3_DEFAULT_CLASS};

use crate::provider::{PriceFilter, PricingCatalog};
use crate::types::PriceSource;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Priced resource kind, part of the cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceKind {
    Compute,
    BlockStorage,
    Database,
    ObjectStorage,
}

impl fmt::Display for PriceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriceKind::Compute => "compute",
            PriceKind::BlockStorage => "block-storage",
            PriceKind::Database => "database",
            PriceKind::ObjectStorage => "object-storage",
        };
        write!(f, "{}", name)
    }
}

/// Cache key for catalog prices
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceKey {
    pub kind: PriceKind,
    pub attributes: Vec<String>,
    pub region: String,
}

impl PriceKey {
    pub fn new(kind: PriceKind, attributes: &[&str], region: &str) -> Self {
        Self {
            kind,
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
            region: region.to_string(),
        }
    }
}

/// Estimated monthly cost with its provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceEstimate {
    /// USD per month, rounded to cents
    pub monthly_cost: f64,
    pub source: PriceSource,
    /// Set when the default key stood in for an unknown attribute
    pub note: Option<String>,
}

impl PriceEstimate {
    fn new(monthly_cost: f64, source: PriceSource) -> Self {
        Self {
            monthly_cost: crate::utils::round_currency(monthly_cost),
            source,
            note: None,
        }
    }

    fn with_note(mut self, note: String) -> Self {
        self.note = Some(note);
        self
    }
}

/// A rate from the static tables
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TableRate {
    pub rate: f64,
    pub fell_back: bool,
}

impl TableRate {
    pub(crate) fn lookup(
        table: fn(&str) -> Option<f64>,
        key: &str,
        default_key: &str,
        default_rate: f64,
    ) -> Self {
        match table(key) {
            Some(rate) => Self {
                rate,
                fell_back: false,
            },
            None => Self {
                rate: table(default_key).unwrap_or(default_rate),
                fell_back: true,
            },
        }
    }

    pub(crate) fn source(&self) -> PriceSource {
        if self.fell_back {
            PriceSource::DefaultFallback
        } else {
            PriceSource::DefaultTable
        }
    }
}

/// Shared price resolver with a lookup cache
pub struct PricingResolver {
    catalog: Option<Arc<dyn PricingCatalog>>,
    cache: Mutex<HashMap<PriceKey, f64>>,
}

impl PricingResolver {
    /// Resolver with a live catalog
    pub fn new(catalog: Arc<dyn PricingCatalog>) -> Self {
        Self {
            catalog: Some(catalog),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolver that only uses the static tables
    pub fn offline() -> Self {
        Self {
            catalog: None,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn has_catalog(&self) -> bool {
        self.catalog.is_some()
    }

    /// Number of cached catalog prices
    pub async fn cached_prices(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Catalog unit price for `key`, from cache or a live lookup.
    ///
    /// Returns `None` when online pricing is not preferred, no catalog is
    /// configured, the lookup fails, or no product matched. Only positive
    /// prices are cached.
    pub(crate) async fn online_rate(
        &self,
        prefer_online: bool,
        key: PriceKey,
        service_code: &str,
        filters: &[PriceFilter],
    ) -> Option<f64> {
        if !prefer_online {
            return None;
        }
        let catalog = self.catalog.as_ref()?;

        if let Some(price) = self.cache.lock().await.get(&key).copied() {
            debug!("Price cache hit for {} {:?}: {}", key.kind, key.attributes, price);
            return Some(price);
        }

        // The lock is not held across the lookup; concurrent misses for the
        // same key may both query the catalog and the last insert wins.
        match catalog.lookup_price(service_code, filters, &key.region).await {
            Ok(Some(price)) if price > 0.0 => {
                debug!(
                    "Catalog price for {} {:?} in {}: {}",
                    key.kind, key.attributes, key.region, price
                );
                self.cache.lock().await.insert(key, price);
                Some(price)
            }
            Ok(_) => {
                debug!(
                    "No catalog price for {} {:?} in {}, using default table",
                    key.kind, key.attributes, key.region
                );
                None
            }
            Err(e) => {
                warn!(
                    "Price lookup failed for {} {:?} in {}, using default table: {}",
                    key.kind, key.attributes, key.region, e
                );
                None
            }
        }
    }
}

impl fmt::Debug for PricingResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PricingResolver")
            .field("catalog", &self.catalog.is_some())
            .finish_non_exhaustive()
    }
}

pub(crate) fn fallback_note(kind: PriceKind, key: &str, default_key: &str) -> String {
    warn!("No default {} price for {}, using {} as fallback", kind, key, default_key);
    format!(
        "No default {} price for '{}', estimated with '{}'",
        kind, key, default_key
    )
}
