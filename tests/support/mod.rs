//! In-memory providers shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use cost_sentinel::error::{Result, SentinelError};
use cost_sentinel::pricing::PricingResolver;
use cost_sentinel::provider::{InventoryProvider, MetricQuery, MetricsProvider, Sample};
use cost_sentinel::scanners::ScanContext;
use cost_sentinel::types::{
    Bucket, ComputeInstance, DatabaseInstance, DatabaseSnapshot, Volume, VolumeFilter, VolumeState,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub const REGION: &str = "us-east-1";

fn access_denied(operation: &str) -> SentinelError {
    SentinelError::Aws(format!("{} failed: AccessDenied", operation))
}

/// Inventory returning fixed resources; any listing can be made to fail
#[derive(Default)]
pub struct FakeInventory {
    pub instances: Vec<ComputeInstance>,
    pub volumes: Vec<Volume>,
    pub databases: Vec<DatabaseInstance>,
    pub snapshots: Vec<DatabaseSnapshot>,
    /// Bucket name to region; buckets missing here fail the region lookup
    pub buckets: Vec<(String, Option<String>)>,
    pub failing: HashSet<&'static str>,
    /// Listing operations in call order
    pub calls: Mutex<Vec<&'static str>>,
}

impl FakeInventory {
    pub fn fail(mut self, operation: &'static str) -> Self {
        self.failing.insert(operation);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(operation);
        if self.failing.contains(operation) {
            Err(access_denied(operation))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl InventoryProvider for FakeInventory {
    async fn list_running_compute(&self, _region: &str) -> Result<Vec<ComputeInstance>> {
        self.check("list_running_compute")?;
        Ok(self.instances.clone())
    }

    async fn list_volumes(&self, _region: &str, filter: Option<VolumeFilter>) -> Result<Vec<Volume>> {
        self.check("list_volumes")?;
        Ok(self
            .volumes
            .iter()
            .filter(|v| match filter {
                Some(VolumeFilter::Unattached) => v.state == VolumeState::Available,
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn list_database_instances(&self, _region: &str) -> Result<Vec<DatabaseInstance>> {
        self.check("list_database_instances")?;
        Ok(self.databases.clone())
    }

    async fn list_manual_snapshots(&self, _region: &str) -> Result<Vec<DatabaseSnapshot>> {
        self.check("list_manual_snapshots")?;
        Ok(self.snapshots.clone())
    }

    async fn list_buckets(&self) -> Result<Vec<Bucket>> {
        self.check("list_buckets")?;
        Ok(self.buckets.iter().map(|(name, _)| bucket(name)).collect())
    }

    async fn get_bucket_region(&self, bucket_name: &str) -> Result<String> {
        self.buckets
            .iter()
            .find(|(name, _)| name == bucket_name)
            .and_then(|(_, region)| region.clone())
            .ok_or_else(|| access_denied("get_bucket_location"))
    }
}

/// Metrics keyed by metric name and resource id (first dimension value).
///
/// Unknown keys return an empty series. Every query is recorded.
#[derive(Default)]
pub struct FakeMetrics {
    series: HashMap<(String, String), Vec<f64>>,
    failing: HashSet<(String, String)>,
    pub queries: Mutex<Vec<MetricQuery>>,
}

impl FakeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, metric: &str, resource_id: &str, values: &[f64]) -> Self {
        self.series
            .insert((metric.to_string(), resource_id.to_string()), values.to_vec());
        self
    }

    pub fn failing(mut self, metric: &str, resource_id: &str) -> Self {
        self.failing
            .insert((metric.to_string(), resource_id.to_string()));
        self
    }

    pub fn recorded(&self) -> Vec<MetricQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetricsProvider for FakeMetrics {
    async fn get_samples(&self, query: &MetricQuery) -> Result<Vec<Sample>> {
        self.queries.lock().unwrap().push(query.clone());
        let resource_id = query
            .dimensions
            .first()
            .map(|d| d.value.clone())
            .unwrap_or_default();
        let key = (query.metric_name.clone(), resource_id);
        if self.failing.contains(&key) {
            return Err(SentinelError::Aws(format!(
                "GetMetricStatistics failed for {}",
                query.metric_name
            )));
        }
        let now = Utc::now();
        let values = self.series.get(&key).cloned().unwrap_or_default();
        let len = values.len() as i64;
        Ok(values
            .into_iter()
            .enumerate()
            .map(|(i, value)| Sample::new(now - Duration::hours(len - i as i64), value))
            .collect())
    }
}

pub fn context(inventory: FakeInventory, metrics: Arc<FakeMetrics>) -> ScanContext {
    ScanContext::new(
        REGION,
        Arc::new(inventory),
        metrics,
        Arc::new(PricingResolver::offline()),
    )
    .with_online_pricing(false)
}

pub fn instance(id: &str, instance_type: &str) -> ComputeInstance {
    ComputeInstance {
        instance_id: id.to_string(),
        name: format!("{}-name", id),
        instance_type: instance_type.to_string(),
        state: "running".to_string(),
        launch_time: Some(Utc::now() - Duration::days(30)),
        private_ip: "10.0.0.10".to_string(),
        public_ip: "N/A".to_string(),
        platform: "Linux".to_string(),
    }
}

pub fn volume(id: &str, volume_type: &str, size_gb: i32, state: VolumeState) -> Volume {
    Volume {
        volume_id: id.to_string(),
        name: "N/A".to_string(),
        volume_type: volume_type.to_string(),
        size_gb,
        iops: None,
        throughput_mbps: None,
        state,
        availability_zone: "us-east-1a".to_string(),
        create_time: Some(Utc::now() - Duration::days(60)),
    }
}

pub fn database(id: &str, instance_class: &str, status: &str) -> DatabaseInstance {
    DatabaseInstance {
        db_instance_id: id.to_string(),
        instance_class: instance_class.to_string(),
        engine: "postgres".to_string(),
        engine_version: "15.4".to_string(),
        status: status.to_string(),
        allocated_storage_gb: 20,
        storage_type: "gp2".to_string(),
        multi_az: false,
    }
}

pub fn snapshot(id: &str, age_days: Option<i64>, size_gb: i32) -> DatabaseSnapshot {
    DatabaseSnapshot {
        snapshot_id: id.to_string(),
        db_instance_id: "db-1".to_string(),
        create_time: age_days.map(|d| Utc::now() - Duration::days(d)),
        allocated_storage_gb: size_gb,
        engine: "postgres".to_string(),
        status: "available".to_string(),
    }
}

pub fn bucket(name: &str) -> Bucket {
    Bucket {
        name: name.to_string(),
        creation_date: None,
        region: String::new(),
        size_bytes: 0,
        size_formatted: String::new(),
        object_count: 0,
    }
}
