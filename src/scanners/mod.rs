//! Resource scanners
//!
//! Each scanner lists one kind of resource, fetches its metrics, classifies
//! it and prices what it flags. `analyze()` returns a fresh `ScanResult` per
//! call; scanners keep no result state between calls.
//!
//! Provider failures never abort a scan. A failed listing yields no
//! resources, a failed metrics fetch yields an empty series, and both record
//! a `Diagnostic` in the result.

pub mod ebs;
pub mod ec2;
pub mod rds;
pub mod s3;

pub use ebs::EbsScanner;
pub use ec2::Ec2Scanner;
pub use rds::RdsScanner;
pub use s3::S3Scanner;

use crate::pricing::{PriceEstimate, PricingResolver};
use crate::provider::{InventoryProvider, MetricQuery, MetricsProvider, Sample};
use crate::report::{ScanSummary, SettingsEcho};
use crate::types::{Diagnostic, Finding};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::error;

/// Scanner identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScannerKind {
    Ec2,
    Ebs,
    Rds,
    S3,
}

impl ScannerKind {
    pub fn label(self) -> &'static str {
        match self {
            ScannerKind::Ec2 => "EC2 instances",
            ScannerKind::Ebs => "EBS volumes",
            ScannerKind::Rds => "RDS databases",
            ScannerKind::S3 => "S3 buckets",
        }
    }
}

impl fmt::Display for ScannerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScannerKind::Ec2 => "ec2",
            ScannerKind::Ebs => "ebs",
            ScannerKind::Rds => "rds",
            ScannerKind::S3 => "s3",
        };
        write!(f, "{}", name)
    }
}

/// Collaborators and run-wide settings shared by all scanners
#[derive(Clone)]
pub struct ScanContext {
    pub region: String,
    pub inventory: Arc<dyn InventoryProvider>,
    pub metrics: Arc<dyn MetricsProvider>,
    pub pricing: Arc<PricingResolver>,
    pub prefer_online_pricing: bool,
    /// Concurrent per-resource evaluations
    pub concurrency: usize,
}

impl ScanContext {
    pub fn new(
        region: impl Into<String>,
        inventory: Arc<dyn InventoryProvider>,
        metrics: Arc<dyn MetricsProvider>,
        pricing: Arc<PricingResolver>,
    ) -> Self {
        Self {
            region: region.into(),
            inventory,
            metrics,
            pricing,
            prefer_online_pricing: true,
            concurrency: 8,
        }
    }

    pub fn with_online_pricing(mut self, prefer_online: bool) -> Self {
        self.prefer_online_pricing = prefer_online;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetch a series, degrading a failure to an empty series plus a
    /// diagnostic
    pub(crate) async fn samples_or_empty(
        &self,
        scope: &str,
        resource_id: &str,
        query: &MetricQuery,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Sample> {
        match self.metrics.get_samples(query).await {
            Ok(samples) => samples,
            Err(e) => {
                error!(
                    "Error fetching {} for {}: {}",
                    query.metric_name, resource_id, e
                );
                diagnostics.push(Diagnostic::for_resource(
                    scope,
                    resource_id,
                    format!("{}: {}", query.metric_name, e),
                ));
                Vec::new()
            }
        }
    }
}

impl fmt::Debug for ScanContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanContext")
            .field("region", &self.region)
            .field("prefer_online_pricing", &self.prefer_online_pricing)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

/// Findings and diagnostics of one `analyze()` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanResult {
    pub findings: Vec<Finding>,
    pub diagnostics: Vec<Diagnostic>,
    pub resources_scanned: usize,
    /// Resources skipped because a required metric had no data
    pub insufficient_data: usize,
}

impl ScanResult {
    pub(crate) fn absorb(&mut self, evaluation: Evaluation) {
        self.findings.extend(evaluation.findings);
        self.diagnostics.extend(evaluation.diagnostics);
        if evaluation.insufficient_data {
            self.insufficient_data += 1;
        }
    }

    /// Order findings by resource id then category, and diagnostics by
    /// scope then resource id. Evaluation completes in arbitrary order.
    pub(crate) fn sort_entries(&mut self) {
        self.findings.sort_by(|a, b| {
            a.resource_id()
                .cmp(b.resource_id())
                .then(a.category.cmp(&b.category))
        });
        self.diagnostics.sort_by(|a, b| {
            a.scope
                .cmp(&b.scope)
                .then_with(|| a.resource_id.cmp(&b.resource_id))
        });
    }

    pub(crate) fn listing_failed(scope: &str, error: &crate::error::SentinelError) -> Self {
        Self {
            diagnostics: vec![Diagnostic::new(scope, error.to_string())],
            ..Self::default()
        }
    }
}

/// Outcome of evaluating a single resource
#[derive(Debug, Default)]
pub(crate) struct Evaluation {
    pub findings: Vec<Finding>,
    pub diagnostics: Vec<Diagnostic>,
    pub insufficient_data: bool,
}

impl Evaluation {
    /// Record the pricing note, if any, as a diagnostic
    pub(crate) fn note_price(&mut self, resource_id: &str, estimate: &PriceEstimate) {
        if let Some(note) = &estimate.note {
            self.diagnostics
                .push(Diagnostic::for_resource("pricing", resource_id, note.clone()));
        }
    }
}

/// Common scanner interface
#[async_trait]
pub trait Scanner: Send + Sync {
    fn kind(&self) -> ScannerKind;

    fn region(&self) -> &str;

    /// Settings echoed into the summary
    fn settings(&self) -> SettingsEcho;

    /// List, fetch metrics, classify and price
    async fn analyze(&self) -> ScanResult;

    fn summarize(&self, result: ScanResult) -> ScanSummary {
        ScanSummary::from_result(self.kind(), self.region(), self.settings(), result)
    }

    async fn scan(&self) -> ScanSummary {
        let result = self.analyze().await;
        self.summarize(result)
    }
}

/// Round a reported metric to two decimals
pub(crate) fn round_metric(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
