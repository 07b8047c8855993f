//! Resource listings from EC2, RDS and S3

use super::{sdk_error, to_chrono};
use crate::error::Result;
use crate::provider::InventoryProvider;
use crate::retry::{ExponentialBackoffPolicy, RetryPolicy};
use crate::types::{
    Bucket, ComputeInstance, DatabaseInstance, DatabaseSnapshot, Volume, VolumeFilter,
    VolumeState, NOT_AVAILABLE,
};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::types::{Filter, Tag};
use tracing::debug;

/// Inventory backed by the EC2, RDS and S3 APIs.
///
/// Clients are built per call for the requested region from one shared
/// `SdkConfig`, so credentials are resolved once.
#[derive(Clone)]
pub struct AwsInventory {
    sdk_config: SdkConfig,
    retry: ExponentialBackoffPolicy,
}

impl AwsInventory {
    pub fn new(sdk_config: SdkConfig, retry: ExponentialBackoffPolicy) -> Self {
        Self { sdk_config, retry }
    }

    fn ec2(&self, region: &str) -> aws_sdk_ec2::Client {
        let conf = aws_sdk_ec2::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_ec2::Client::from_conf(conf)
    }

    fn rds(&self, region: &str) -> aws_sdk_rds::Client {
        let conf = aws_sdk_rds::config::Builder::from(&self.sdk_config)
            .region(aws_sdk_rds::config::Region::new(region.to_string()))
            .build();
        aws_sdk_rds::Client::from_conf(conf)
    }

    fn s3(&self) -> aws_sdk_s3::Client {
        aws_sdk_s3::Client::new(&self.sdk_config)
    }
}

fn name_tag(tags: &[Tag]) -> String {
    tags.iter()
        .find(|t| t.key() == Some("Name"))
        .and_then(|t| t.value())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

fn or_not_available(value: Option<&str>) -> String {
    value.unwrap_or(NOT_AVAILABLE).to_string()
}

/// Region of a bucket from its location constraint.
///
/// Buckets in us-east-1 have an empty constraint; the legacy `EU` constraint
/// means eu-west-1.
pub fn normalize_bucket_location(constraint: Option<&str>) -> String {
    match constraint {
        None | Some("") => "us-east-1".to_string(),
        Some("EU") => "eu-west-1".to_string(),
        Some(region) => region.to_string(),
    }
}

#[async_trait]
impl InventoryProvider for AwsInventory {
    async fn list_running_compute(&self, region: &str) -> Result<Vec<ComputeInstance>> {
        let client = self.ec2(region);
        let mut instances = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let token = next_token.clone();
            let response = self
                .retry
                .execute_with_retry(|| {
                    let client = &client;
                    let token = token.clone();
                    async move {
                        client
                            .describe_instances()
                            .filters(
                                Filter::builder()
                                    .name("instance-state-name")
                                    .values("running")
                                    .build(),
                            )
                            .set_next_token(token)
                            .send()
                            .await
                            .map_err(|e| sdk_error("ec2:DescribeInstances", e))
                    }
                })
                .await?;

            for instance in response.reservations().iter().flat_map(|r| r.instances()) {
                let Some(instance_id) = instance.instance_id() else {
                    continue;
                };
                instances.push(ComputeInstance {
                    instance_id: instance_id.to_string(),
                    name: name_tag(instance.tags()),
                    instance_type: instance
                        .instance_type()
                        .map(|t| t.as_str().to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                    state: instance
                        .state()
                        .and_then(|s| s.name())
                        .map(|n| n.as_str().to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                    launch_time: instance.launch_time().and_then(to_chrono),
                    private_ip: or_not_available(instance.private_ip_address()),
                    public_ip: or_not_available(instance.public_ip_address()),
                    platform: if instance.platform().is_some() {
                        "Windows".to_string()
                    } else {
                        "Linux".to_string()
                    },
                });
            }

            next_token = response.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        debug!("Listed {} running instances in {}", instances.len(), region);
        Ok(instances)
    }

    async fn list_volumes(&self, region: &str, filter: Option<VolumeFilter>) -> Result<Vec<Volume>> {
        let client = self.ec2(region);
        let status_filter = filter.map(|f| match f {
            VolumeFilter::Unattached => Filter::builder().name("status").values("available").build(),
        });
        let mut volumes = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let token = next_token.clone();
            let response = self
                .retry
                .execute_with_retry(|| {
                    let client = &client;
                    let token = token.clone();
                    let filters = status_filter.clone().map(|f| vec![f]);
                    async move {
                        client
                            .describe_volumes()
                            .set_filters(filters)
                            .set_next_token(token)
                            .send()
                            .await
                            .map_err(|e| sdk_error("ec2:DescribeVolumes", e))
                    }
                })
                .await?;

            for volume in response.volumes() {
                let Some(volume_id) = volume.volume_id() else {
                    continue;
                };
                volumes.push(Volume {
                    volume_id: volume_id.to_string(),
                    name: name_tag(volume.tags()),
                    volume_type: volume
                        .volume_type()
                        .map(|t| t.as_str().to_string())
                        .unwrap_or_else(|| "standard".to_string()),
                    size_gb: volume.size().unwrap_or(0),
                    iops: volume.iops(),
                    throughput_mbps: volume.throughput(),
                    state: volume
                        .state()
                        .map(|s| VolumeState::parse(s.as_str()))
                        .unwrap_or_else(|| VolumeState::Other("unknown".to_string())),
                    availability_zone: or_not_available(volume.availability_zone()),
                    create_time: volume.create_time().and_then(to_chrono),
                });
            }

            next_token = response.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        debug!("Listed {} volumes in {}", volumes.len(), region);
        Ok(volumes)
    }

    async fn list_database_instances(&self, region: &str) -> Result<Vec<DatabaseInstance>> {
        let client = self.rds(region);
        let mut instances = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let page_marker = marker.clone();
            let response = self
                .retry
                .execute_with_retry(|| {
                    let client = &client;
                    let page_marker = page_marker.clone();
                    async move {
                        client
                            .describe_db_instances()
                            .set_marker(page_marker)
                            .send()
                            .await
                            .map_err(|e| sdk_error("rds:DescribeDBInstances", e))
                    }
                })
                .await?;

            for db in response.db_instances() {
                let Some(id) = db.db_instance_identifier() else {
                    continue;
                };
                instances.push(DatabaseInstance {
                    db_instance_id: id.to_string(),
                    instance_class: or_not_available(db.db_instance_class()),
                    engine: or_not_available(db.engine()),
                    engine_version: or_not_available(db.engine_version()),
                    status: db.db_instance_status().unwrap_or("unknown").to_string(),
                    allocated_storage_gb: db.allocated_storage().unwrap_or(0),
                    storage_type: db.storage_type().unwrap_or("gp2").to_string(),
                    multi_az: db.multi_az().unwrap_or(false),
                });
            }

            marker = response.marker().map(str::to_string);
            if marker.is_none() {
                break;
            }
        }

        debug!("Listed {} database instances in {}", instances.len(), region);
        Ok(instances)
    }

    async fn list_manual_snapshots(&self, region: &str) -> Result<Vec<DatabaseSnapshot>> {
        let client = self.rds(region);
        let mut snapshots = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let page_marker = marker.clone();
            let response = self
                .retry
                .execute_with_retry(|| {
                    let client = &client;
                    let page_marker = page_marker.clone();
                    async move {
                        client
                            .describe_db_snapshots()
                            .snapshot_type("manual")
                            .set_marker(page_marker)
                            .send()
                            .await
                            .map_err(|e| sdk_error("rds:DescribeDBSnapshots", e))
                    }
                })
                .await?;

            for snapshot in response.db_snapshots() {
                let Some(id) = snapshot.db_snapshot_identifier() else {
                    continue;
                };
                snapshots.push(DatabaseSnapshot {
                    snapshot_id: id.to_string(),
                    db_instance_id: or_not_available(snapshot.db_instance_identifier()),
                    create_time: snapshot.snapshot_create_time().and_then(to_chrono),
                    allocated_storage_gb: snapshot.allocated_storage().unwrap_or(0),
                    engine: or_not_available(snapshot.engine()),
                    status: snapshot.status().unwrap_or("unknown").to_string(),
                });
            }

            marker = response.marker().map(str::to_string);
            if marker.is_none() {
                break;
            }
        }

        debug!("Listed {} manual snapshots in {}", snapshots.len(), region);
        Ok(snapshots)
    }

    async fn list_buckets(&self) -> Result<Vec<Bucket>> {
        let client = self.s3();
        let response = self
            .retry
            .execute_with_retry(|| async {
                client
                    .list_buckets()
                    .send()
                    .await
                    .map_err(|e| sdk_error("s3:ListBuckets", e))
            })
            .await?;

        let buckets = response
            .buckets()
            .iter()
            .filter_map(|b| {
                let name = b.name()?;
                Some(Bucket {
                    name: name.to_string(),
                    creation_date: b.creation_date().and_then(to_chrono),
                    region: String::new(),
                    size_bytes: 0,
                    size_formatted: String::new(),
                    object_count: 0,
                })
            })
            .collect();
        Ok(buckets)
    }

    async fn get_bucket_region(&self, bucket_name: &str) -> Result<String> {
        let client = self.s3();
        let response = self
            .retry
            .execute_with_retry(|| async {
                client
                    .get_bucket_location()
                    .bucket(bucket_name)
                    .send()
                    .await
                    .map_err(|e| sdk_error("s3:GetBucketLocation", e))
            })
            .await?;

        Ok(normalize_bucket_location(
            response.location_constraint().map(|c| c.as_str()),
        ))
    }
}
