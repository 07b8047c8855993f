//! Unused S3 bucket detection
//!
//! Buckets are account-wide, so each bucket's region is resolved first and
//! its metrics are queried there. A bucket with request datapoints at or
//! below the threshold is unused. A bucket with no request datapoints at all
//! is assumed to have request metrics disabled: it is reported for follow-up
//! but not counted as savings.

use super::{Evaluation, ScanContext, ScanResult, Scanner, ScannerKind};
use crate::classify::{classify_bucket, BucketActivity};
use crate::config::S3Settings;
use crate::error::Result;
use crate::metrics::{latest, reduce_samples, Reduction};
use crate::provider::{Dimension, MetricQuery, Statistic, TimeWindow};
use crate::report::SettingsEcho;
use crate::types::{
    Bucket, Diagnostic, Evidence, Finding, FindingCategory, ResourceDescriptor, UNKNOWN_REGION,
};
use crate::utils::format_bytes;
use crate::validation::validate_region;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

const NAMESPACE: &str = "AWS/S3";
const PERIOD_SECS: i32 = 86_400;
/// Storage gauges are published once a day
const STORAGE_LOOKBACK_DAYS: u32 = 2;

/// Latest storage gauges of a bucket
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StorageMetrics {
    pub size_bytes: u64,
    pub object_count: u64,
}

pub struct S3Scanner {
    ctx: ScanContext,
    settings: S3Settings,
}

impl S3Scanner {
    pub fn new(ctx: ScanContext, settings: S3Settings) -> Result<Self> {
        validate_region(&ctx.region)?;
        settings.validate()?;
        Ok(Self { ctx, settings })
    }

    /// All buckets in the account with their resolved region
    /// (`"unknown"` when the location lookup failed)
    pub async fn list_buckets(&self, diagnostics: &mut Vec<Diagnostic>) -> Result<Vec<Bucket>> {
        let mut buckets = self.ctx.inventory.list_buckets().await?;
        info!("Found {} S3 buckets in account", buckets.len());
        for bucket in &mut buckets {
            bucket.region = match self.ctx.inventory.get_bucket_region(&bucket.name).await {
                Ok(region) => region,
                Err(e) => {
                    warn!("Could not get region for bucket {}: {}", bucket.name, e);
                    diagnostics.push(Diagnostic::for_resource(
                        "s3:get_bucket_region",
                        &bucket.name,
                        e.to_string(),
                    ));
                    UNKNOWN_REGION.to_string()
                }
            };
        }
        Ok(buckets)
    }

    /// Total requests over the window, `None` when no datapoints exist
    pub async fn fetch_requests(
        &self,
        bucket: &Bucket,
        window: TimeWindow,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<u64> {
        let query = MetricQuery::new(
            NAMESPACE,
            "AllRequests",
            vec![
                Dimension::new("BucketName", &bucket.name),
                Dimension::new("FilterId", "EntireBucket"),
            ],
            window,
            PERIOD_SECS,
            Statistic::Sum,
        )
        .in_region(&bucket.region);
        let samples = self
            .ctx
            .samples_or_empty("s3:get_samples", &bucket.name, &query, diagnostics)
            .await;
        reduce_samples(&samples, Reduction::Sum).map(|total| total.max(0.0).round() as u64)
    }

    /// Newest bucket size and object count
    pub async fn fetch_storage(
        &self,
        bucket: &Bucket,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> StorageMetrics {
        let window = TimeWindow::last_days(STORAGE_LOOKBACK_DAYS);
        let mut gauges = [0u64; 2];
        let metrics = [
            ("BucketSizeBytes", "StandardStorage"),
            ("NumberOfObjects", "AllStorageTypes"),
        ];
        for (gauge, (metric, storage_type)) in gauges.iter_mut().zip(metrics) {
            let query = MetricQuery::new(
                NAMESPACE,
                metric,
                vec![
                    Dimension::new("BucketName", &bucket.name),
                    Dimension::new("StorageType", storage_type),
                ],
                window,
                PERIOD_SECS,
                Statistic::Average,
            )
            .in_region(&bucket.region);
            let samples = self
                .ctx
                .samples_or_empty("s3:get_samples", &bucket.name, &query, diagnostics)
                .await;
            *gauge = latest(&samples).map_or(0, |v| v.max(0.0) as u64);
        }
        StorageMetrics {
            size_bytes: gauges[0],
            object_count: gauges[1],
        }
    }

    async fn evaluate(&self, mut bucket: Bucket, window: TimeWindow) -> Evaluation {
        let mut evaluation = Evaluation::default();
        let name = bucket.name.clone();
        let days = self.settings.days;

        if bucket.region == UNKNOWN_REGION {
            warn!("Skipping bucket {}: unknown region", name);
            return evaluation;
        }

        let requests = self.fetch_requests(&bucket, window, &mut evaluation.diagnostics).await;
        let storage = self.fetch_storage(&bucket, &mut evaluation.diagnostics).await;
        bucket.size_bytes = storage.size_bytes;
        bucket.size_formatted = format_bytes(storage.size_bytes);
        bucket.object_count = storage.object_count;

        let category = match classify_bucket(requests, self.settings.request_threshold) {
            BucketActivity::Active => {
                info!(
                    "ACTIVE: {} - Requests: {} over {} days",
                    name,
                    requests.unwrap_or(0),
                    days
                );
                return evaluation;
            }
            BucketActivity::Unused => {
                warn!(
                    "UNUSED: {} - Requests: {} over {} days",
                    name,
                    requests.unwrap_or(0),
                    days
                );
                FindingCategory::UnusedBucket
            }
            BucketActivity::MetricsNotEnabled => {
                info!("NO METRICS: {} - Request metrics not enabled", name);
                FindingCategory::MetricsNotEnabled
            }
        };

        let estimate = self
            .ctx
            .pricing
            .s3_monthly_cost(
                bucket.size_bytes,
                &self.settings.storage_class,
                &bucket.region,
                self.ctx.prefer_online_pricing,
            )
            .await;
        evaluation.note_price(&name, &estimate);
        evaluation.findings.push(Finding::new(
            category,
            ResourceDescriptor::Bucket(bucket),
            Evidence::Requests {
                total_requests: requests,
                request_threshold: self.settings.request_threshold,
            },
            days,
            estimate.monthly_cost,
            estimate.source,
        ));
        evaluation
    }
}

#[async_trait]
impl Scanner for S3Scanner {
    fn kind(&self) -> ScannerKind {
        ScannerKind::S3
    }

    fn region(&self) -> &str {
        &self.ctx.region
    }

    fn settings(&self) -> SettingsEcho {
        SettingsEcho::S3(self.settings.clone())
    }

    async fn analyze(&self) -> ScanResult {
        let mut diagnostics = Vec::new();
        let buckets = match self.list_buckets(&mut diagnostics).await {
            Ok(buckets) => buckets,
            Err(e) => {
                error!("Error fetching S3 buckets: {}", e);
                return ScanResult::listing_failed("s3:list_buckets", &e);
            }
        };

        let mut result = ScanResult {
            resources_scanned: buckets.len(),
            diagnostics,
            ..ScanResult::default()
        };
        if buckets.is_empty() {
            info!("No S3 buckets found.");
            return result;
        }

        info!("Analyzing {} S3 buckets for activity", buckets.len());
        let window = TimeWindow::last_days(self.settings.days);
        let evaluations: Vec<Evaluation> = stream::iter(buckets)
            .map(|bucket| self.evaluate(bucket, window))
            .buffer_unordered(self.ctx.concurrency)
            .collect()
            .await;
        for evaluation in evaluations {
            result.absorb(evaluation);
        }
        result.sort_entries();

        let unused = result
            .findings
            .iter()
            .filter(|f| f.category == FindingCategory::UnusedBucket)
            .count();
        info!(
            "S3 scan complete: {} unused buckets, {} buckets without metrics",
            unused,
            result.findings.len() - unused
        );
        result
    }
}
