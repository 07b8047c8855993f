//! Type definitions for scanned resources and findings
//!
//! Resource descriptors are built fresh from the inventory provider on every
//! scan and dropped when the scan completes. Findings wrap a descriptor with
//! the evidence that flagged it and the estimated monthly cost.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder used for absent display values, matching console output.
pub const NOT_AVAILABLE: &str = "N/A";

/// Region reported for buckets whose location lookup failed.
pub const UNKNOWN_REGION: &str = "unknown";

/// Lifecycle state of a block volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VolumeState {
    Available,
    InUse,
    Creating,
    Deleting,
    Error,
    Other(String),
}

impl VolumeState {
    /// Normalize a provider state string (`available`, `in-use`, ...)
    pub fn parse(state: &str) -> Self {
        match state.to_lowercase().as_str() {
            "available" => VolumeState::Available,
            "in-use" | "in_use" => VolumeState::InUse,
            "creating" => VolumeState::Creating,
            "deleting" | "deleted" => VolumeState::Deleting,
            "error" => VolumeState::Error,
            _ => VolumeState::Other(state.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            VolumeState::Available => "available",
            VolumeState::InUse => "in-use",
            VolumeState::Creating => "creating",
            VolumeState::Deleting => "deleting",
            VolumeState::Error => "error",
            VolumeState::Other(s) => s,
        }
    }
}

/// Listing filter for block volumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeFilter {
    /// Only volumes not attached to any instance
    Unattached,
}

/// EC2 instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeInstance {
    pub instance_id: String,
    pub name: String,
    pub instance_type: String,
    pub state: String,
    pub launch_time: Option<DateTime<Utc>>,
    pub private_ip: String,
    pub public_ip: String,
    /// Operating system name as used by the price list (`Linux`, `Windows`)
    pub platform: String,
}

/// EBS volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub volume_id: String,
    pub name: String,
    pub volume_type: String,
    pub size_gb: i32,
    pub iops: Option<i32>,
    pub throughput_mbps: Option<i32>,
    pub state: VolumeState,
    pub availability_zone: String,
    pub create_time: Option<DateTime<Utc>>,
}

/// RDS instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseInstance {
    pub db_instance_id: String,
    pub instance_class: String,
    pub engine: String,
    pub engine_version: String,
    pub status: String,
    pub allocated_storage_gb: i32,
    pub storage_type: String,
    pub multi_az: bool,
}

/// Manual RDS snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub snapshot_id: String,
    pub db_instance_id: String,
    pub create_time: Option<DateTime<Utc>>,
    pub allocated_storage_gb: i32,
    pub engine: String,
    pub status: String,
}

/// S3 bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    pub creation_date: Option<DateTime<Utc>>,
    pub region: String,
    pub size_bytes: u64,
    pub size_formatted: String,
    pub object_count: u64,
}

/// A scanned resource of any kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceDescriptor {
    Compute(ComputeInstance),
    Volume(Volume),
    Database(DatabaseInstance),
    Snapshot(DatabaseSnapshot),
    Bucket(Bucket),
}

impl ResourceDescriptor {
    /// Provider-assigned identity (bucket name for buckets)
    pub fn id(&self) -> &str {
        match self {
            ResourceDescriptor::Compute(i) => &i.instance_id,
            ResourceDescriptor::Volume(v) => &v.volume_id,
            ResourceDescriptor::Database(d) => &d.db_instance_id,
            ResourceDescriptor::Snapshot(s) => &s.snapshot_id,
            ResourceDescriptor::Bucket(b) => &b.name,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            ResourceDescriptor::Compute(i) => &i.name,
            ResourceDescriptor::Volume(v) => &v.name,
            ResourceDescriptor::Database(d) => &d.db_instance_id,
            ResourceDescriptor::Snapshot(s) => &s.snapshot_id,
            ResourceDescriptor::Bucket(b) => &b.name,
        }
    }

    /// Short billing description for report tables
    pub fn billing_summary(&self) -> String {
        match self {
            ResourceDescriptor::Compute(i) => i.instance_type.clone(),
            ResourceDescriptor::Volume(v) => format!("{} {} GB", v.volume_type, v.size_gb),
            ResourceDescriptor::Database(d) => {
                let az = if d.multi_az { " multi-az" } else { "" };
                format!(
                    "{} {} GB {}{}",
                    d.instance_class, d.allocated_storage_gb, d.storage_type, az
                )
            }
            ResourceDescriptor::Snapshot(s) => format!("{} GB", s.allocated_storage_gb),
            ResourceDescriptor::Bucket(b) => format!("{} ({} objects)", b.size_formatted, b.object_count),
        }
    }
}

/// Finding categories produced by the scanners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    IdleInstance,
    UnattachedVolume,
    LowIoVolume,
    IdleDatabase,
    OldSnapshot,
    UnusedBucket,
    MetricsNotEnabled,
}

impl FindingCategory {
    /// Whether findings in this category count toward potential savings.
    ///
    /// Buckets without request metrics are reported for follow-up only: there
    /// is no evidence they are unused.
    pub fn counts_toward_savings(self) -> bool {
        !matches!(self, FindingCategory::MetricsNotEnabled)
    }

    pub fn label(self) -> &'static str {
        match self {
            FindingCategory::IdleInstance => "idle instances",
            FindingCategory::UnattachedVolume => "unattached volumes",
            FindingCategory::LowIoVolume => "low I/O volumes",
            FindingCategory::IdleDatabase => "idle databases",
            FindingCategory::OldSnapshot => "old snapshots",
            FindingCategory::UnusedBucket => "unused buckets",
            FindingCategory::MetricsNotEnabled => "buckets without request metrics",
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            FindingCategory::IdleInstance => "Consider stopping or terminating this instance",
            FindingCategory::UnattachedVolume => {
                "Consider snapshotting and deleting this unattached volume"
            }
            FindingCategory::LowIoVolume => {
                "Consider detaching, downsizing or deleting this low-activity volume"
            }
            FindingCategory::IdleDatabase => {
                "Consider stopping or terminating this idle RDS instance"
            }
            FindingCategory::OldSnapshot => "Consider deleting this old snapshot",
            FindingCategory::UnusedBucket => "Consider archiving or deleting this unused bucket",
            FindingCategory::MetricsNotEnabled => {
                "Enable request metrics to monitor bucket activity"
            }
        }
    }
}

/// Metrics and thresholds that caused a classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Evidence {
    Cpu {
        avg_cpu_percent: f64,
        cpu_threshold: f64,
    },
    Database {
        avg_cpu_percent: f64,
        avg_connections: f64,
        cpu_threshold: f64,
        connections_threshold: f64,
    },
    Attachment {
        state: String,
    },
    Io {
        total_io_ops: f64,
        io_threshold: f64,
    },
    SnapshotAge {
        age_days: i64,
        max_age_days: i64,
    },
    Requests {
        total_requests: Option<u64>,
        request_threshold: u64,
    },
}

/// Where an estimated price came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Live price list lookup (possibly served from the resolver cache)
    Catalog,
    /// Static default table, exact key
    DefaultTable,
    /// Static default table, designated fallback key
    DefaultFallback,
}

/// A flagged resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub category: FindingCategory,
    pub resource: ResourceDescriptor,
    pub evidence: Evidence,
    pub analysis_period_days: u32,
    pub estimated_monthly_cost: f64,
    pub price_source: PriceSource,
    pub recommendation: String,
}

impl Finding {
    pub fn new(
        category: FindingCategory,
        resource: ResourceDescriptor,
        evidence: Evidence,
        analysis_period_days: u32,
        estimated_monthly_cost: f64,
        price_source: PriceSource,
    ) -> Self {
        Self {
            category,
            resource,
            evidence,
            analysis_period_days,
            estimated_monthly_cost,
            price_source,
            recommendation: category.recommendation().to_string(),
        }
    }

    pub fn resource_id(&self) -> &str {
        self.resource.id()
    }
}

/// A non-fatal problem recorded during a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Operation that produced the diagnostic, e.g. `ec2:list_running_compute`
    pub scope: String,
    pub resource_id: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            resource_id: None,
            message: message.into(),
        }
    }

    pub fn for_resource(
        scope: impl Into<String>,
        resource_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            scope: scope.into(),
            resource_id: Some(resource_id.into()),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_state_parse() {
        assert_eq!(VolumeState::parse("available"), VolumeState::Available);
        assert_eq!(VolumeState::parse("in-use"), VolumeState::InUse);
        assert_eq!(VolumeState::parse("IN-USE"), VolumeState::InUse);
        assert_eq!(
            VolumeState::parse("optimizing"),
            VolumeState::Other("optimizing".to_string())
        );
        assert_eq!(VolumeState::parse("available").as_str(), "available");
    }

    #[test]
    fn test_metrics_not_enabled_excluded_from_savings() {
        assert!(!FindingCategory::MetricsNotEnabled.counts_toward_savings());
        assert!(FindingCategory::UnusedBucket.counts_toward_savings());
        assert!(FindingCategory::LowIoVolume.counts_toward_savings());
    }

    #[test]
    fn test_descriptor_serializes_with_kind_tag() {
        let snapshot = ResourceDescriptor::Snapshot(DatabaseSnapshot {
            snapshot_id: "snap-1".to_string(),
            db_instance_id: "db-1".to_string(),
            create_time: None,
            allocated_storage_gb: 20,
            engine: "postgres".to_string(),
            status: "available".to_string(),
        });
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["kind"], "snapshot");
        assert_eq!(json["snapshot_id"], "snap-1");
        assert_eq!(snapshot.id(), "snap-1");
    }
}
