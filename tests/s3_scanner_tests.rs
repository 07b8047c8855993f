//! S3 scanner tests against in-memory providers

mod support;

use cost_sentinel::config::S3Settings;
use cost_sentinel::provider::Statistic;
use cost_sentinel::scanners::{S3Scanner, Scanner};
use cost_sentinel::types::{Evidence, FindingCategory, ResourceDescriptor};
use std::sync::Arc;
use support::{context, FakeInventory, FakeMetrics};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

fn scanner(inventory: FakeInventory, metrics: Arc<FakeMetrics>) -> S3Scanner {
    S3Scanner::new(context(inventory, metrics), S3Settings::default()).unwrap()
}

fn buckets(entries: &[(&str, Option<&str>)]) -> FakeInventory {
    FakeInventory {
        buckets: entries
            .iter()
            .map(|(name, region)| (name.to_string(), region.map(str::to_string)))
            .collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_three_way_bucket_outcome() {
    let inventory = buckets(&[
        ("active-logs", Some("us-east-1")),
        ("cold-archive", Some("us-east-1")),
        ("no-metrics", Some("us-east-1")),
    ]);
    let metrics = Arc::new(
        FakeMetrics::new()
            .with_series("AllRequests", "active-logs", &[400.0, 100.0])
            .with_series("AllRequests", "cold-archive", &[3.0, 2.0])
            .with_series("BucketSizeBytes", "cold-archive", &[50.0 * GIB, 100.0 * GIB])
            .with_series("NumberOfObjects", "cold-archive", &[1200.0])
            .with_series("BucketSizeBytes", "no-metrics", &[10.0 * GIB]),
    );

    let summary = scanner(inventory, metrics).scan().await;

    assert_eq!(summary.resources_scanned, 3);
    assert_eq!(summary.findings.len(), 2);

    let unused = &summary.findings[0];
    assert_eq!(unused.resource_id(), "cold-archive");
    assert_eq!(unused.category, FindingCategory::UnusedBucket);
    assert_eq!(unused.estimated_monthly_cost, 2.3);
    assert_eq!(
        unused.evidence,
        Evidence::Requests {
            total_requests: Some(5),
            request_threshold: 10
        }
    );
    match &unused.resource {
        ResourceDescriptor::Bucket(bucket) => {
            assert_eq!(bucket.object_count, 1200);
            assert_eq!(bucket.region, "us-east-1");
            assert_eq!(bucket.size_formatted, "100.00 GB");
        }
        other => panic!("unexpected resource {:?}", other),
    }

    let no_metrics = &summary.findings[1];
    assert_eq!(no_metrics.resource_id(), "no-metrics");
    assert_eq!(no_metrics.category, FindingCategory::MetricsNotEnabled);
    assert_eq!(no_metrics.estimated_monthly_cost, 0.23);

    // Buckets without request metrics are not counted as savings
    assert_eq!(summary.total_potential_monthly_savings, 2.3);
}

#[tokio::test]
async fn test_request_threshold_is_inclusive() {
    let inventory = buckets(&[("edge", Some("us-east-1"))]);
    let metrics = Arc::new(FakeMetrics::new().with_series("AllRequests", "edge", &[10.0]));

    let result = scanner(inventory, metrics).analyze().await;
    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.findings[0].category, FindingCategory::UnusedBucket);
}

#[tokio::test]
async fn test_region_lookup_failure_skips_bucket() {
    let inventory = buckets(&[("lost", None), ("found", Some("eu-west-1"))]);
    let metrics = Arc::new(FakeMetrics::new().with_series("AllRequests", "found", &[1000.0]));

    let result = scanner(inventory, metrics.clone()).analyze().await;

    assert!(result.findings.is_empty());
    assert_eq!(result.resources_scanned, 2);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].scope, "s3:get_bucket_region");
    assert_eq!(result.diagnostics[0].resource_id.as_deref(), Some("lost"));
    assert!(metrics
        .recorded()
        .iter()
        .all(|q| q.dimension("BucketName") == Some("found")));
}

#[tokio::test]
async fn test_metrics_are_queried_in_bucket_region() {
    let inventory = buckets(&[("eu-bucket", Some("eu-west-1"))]);
    let metrics = Arc::new(FakeMetrics::new().with_series("AllRequests", "eu-bucket", &[1000.0]));

    scanner(inventory, metrics.clone()).analyze().await;

    let queries = metrics.recorded();
    let requests = queries
        .iter()
        .find(|q| q.metric_name == "AllRequests")
        .unwrap();
    assert_eq!(requests.namespace, "AWS/S3");
    assert_eq!(requests.region.as_deref(), Some("eu-west-1"));
    assert_eq!(requests.dimension("FilterId"), Some("EntireBucket"));
    assert_eq!(requests.statistic, Statistic::Sum);
    assert_eq!(requests.period_secs, 86_400);
    assert_eq!((requests.window.end - requests.window.start).num_days(), 30);

    let size = queries
        .iter()
        .find(|q| q.metric_name == "BucketSizeBytes")
        .unwrap();
    assert_eq!(size.dimension("StorageType"), Some("StandardStorage"));
    assert_eq!(size.statistic, Statistic::Average);
}

#[tokio::test]
async fn test_listing_failure_becomes_diagnostic() {
    let inventory = FakeInventory::default().fail("list_buckets");
    let result = scanner(inventory, Arc::new(FakeMetrics::new())).analyze().await;
    assert!(result.findings.is_empty());
    assert_eq!(result.diagnostics[0].scope, "s3:list_buckets");
}

#[tokio::test]
async fn test_storage_class_setting_prices_findings() {
    let settings = S3Settings {
        storage_class: "STANDARD_IA".to_string(),
        ..S3Settings::default()
    };
    let inventory = buckets(&[("ia-bucket", Some("us-east-1"))]);
    let metrics = Arc::new(
        FakeMetrics::new()
            .with_series("AllRequests", "ia-bucket", &[0.0])
            .with_series("BucketSizeBytes", "ia-bucket", &[1000.0 * GIB]),
    );
    let scanner = S3Scanner::new(context(inventory, metrics), settings).unwrap();

    let result = scanner.analyze().await;
    assert_eq!(result.findings[0].estimated_monthly_cost, 12.5);
}
