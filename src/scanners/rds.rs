//! Idle RDS instance and stale snapshot detection
//!
//! Only instances in the `available` state are analyzed. An instance is idle
//! when both average CPU and average connections are at or below their
//! thresholds; if either series is empty the instance is insufficient data.
//! Manual snapshots older than the configured age are flagged; snapshots
//! without a creation time are skipped.

use super::{round_metric, Evaluation, ScanContext, ScanResult, Scanner, ScannerKind};
use crate::classify::{is_database_idle, is_snapshot_old};
use crate::config::RdsSettings;
use crate::error::Result;
use crate::metrics::{reduce_samples, Reduction};
use crate::provider::{Dimension, MetricQuery, Statistic, TimeWindow};
use crate::report::SettingsEcho;
use crate::types::{
    DatabaseInstance, DatabaseSnapshot, Diagnostic, Evidence, Finding, FindingCategory,
    PriceSource, ResourceDescriptor,
};
use crate::utils::age_in_days;
use crate::validation::validate_region;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

const NAMESPACE: &str = "AWS/RDS";
const PERIOD_SECS: i32 = 3600;
const AVAILABLE: &str = "available";

pub struct RdsScanner {
    ctx: ScanContext,
    settings: RdsSettings,
}

impl RdsScanner {
    pub fn new(ctx: ScanContext, settings: RdsSettings) -> Result<Self> {
        validate_region(&ctx.region)?;
        settings.validate()?;
        Ok(Self { ctx, settings })
    }

    pub async fn list_instances(&self) -> Result<Vec<DatabaseInstance>> {
        self.ctx
            .inventory
            .list_database_instances(&self.ctx.region)
            .await
    }

    pub async fn list_manual_snapshots(&self) -> Result<Vec<DatabaseSnapshot>> {
        self.ctx.inventory.list_manual_snapshots(&self.ctx.region).await
    }

    /// Average of one instance metric over `window`
    pub async fn fetch_average(
        &self,
        metric_name: &str,
        db_instance_id: &str,
        window: TimeWindow,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<f64> {
        let query = MetricQuery::new(
            NAMESPACE,
            metric_name,
            vec![Dimension::new("DBInstanceIdentifier", db_instance_id)],
            window,
            PERIOD_SECS,
            Statistic::Average,
        );
        let samples = self
            .ctx
            .samples_or_empty("rds:get_samples", db_instance_id, &query, diagnostics)
            .await;
        reduce_samples(&samples, Reduction::Average)
    }

    async fn evaluate_instance(&self, instance: DatabaseInstance, window: TimeWindow) -> Evaluation {
        let mut evaluation = Evaluation::default();
        let id = instance.db_instance_id.clone();
        let days = self.settings.days;

        let avg_cpu = self
            .fetch_average("CPUUtilization", &id, window, &mut evaluation.diagnostics)
            .await;
        let avg_connections = self
            .fetch_average("DatabaseConnections", &id, window, &mut evaluation.diagnostics)
            .await;

        let (Some(cpu), Some(connections)) = (avg_cpu, avg_connections) else {
            warn!(
                "NO DATA: {} - Insufficient metrics for the last {} days",
                id, days
            );
            evaluation.insufficient_data = true;
            return evaluation;
        };

        if !is_database_idle(
            avg_cpu,
            avg_connections,
            self.settings.cpu_threshold,
            self.settings.connections_threshold,
        ) {
            info!(
                "OK: {} - Avg CPU: {:.2}%, Avg Connections: {:.2}",
                id, cpu, connections
            );
            return evaluation;
        }

        warn!(
            "IDLE: {} - Class: {}, Avg CPU: {:.2}%, Avg Connections: {:.2}",
            id, instance.instance_class, cpu, connections
        );
        let estimate = self
            .ctx
            .pricing
            .rds_monthly_cost(
                &instance.instance_class,
                &instance.engine,
                instance.multi_az,
                instance.allocated_storage_gb,
                &instance.storage_type,
                &self.ctx.region,
                self.ctx.prefer_online_pricing,
            )
            .await;
        evaluation.note_price(&id, &estimate);
        evaluation.findings.push(Finding::new(
            FindingCategory::IdleDatabase,
            ResourceDescriptor::Database(instance),
            Evidence::Database {
                avg_cpu_percent: round_metric(cpu),
                avg_connections: round_metric(connections),
                cpu_threshold: self.settings.cpu_threshold,
                connections_threshold: self.settings.connections_threshold,
            },
            days,
            estimate.monthly_cost,
            estimate.source,
        ));
        evaluation
    }

    /// Snapshot findings for those older than the configured age
    pub fn find_old_snapshots(
        &self,
        snapshots: Vec<DatabaseSnapshot>,
        now: DateTime<Utc>,
    ) -> Vec<Finding> {
        let max_age = self.settings.snapshot_max_age_days;
        let mut old = Vec::new();
        for snapshot in snapshots {
            let Some(created) = snapshot.create_time else {
                debug!("Skipping snapshot {} without a creation time", snapshot.snapshot_id);
                continue;
            };
            let age = age_in_days(created, now);
            if !is_snapshot_old(age, max_age) {
                continue;
            }

            let estimate = self.ctx.pricing.snapshot_monthly_cost(snapshot.allocated_storage_gb);
            warn!(
                "OLD SNAPSHOT: {} - Age: {} days, Size: {} GB",
                snapshot.snapshot_id, age, snapshot.allocated_storage_gb
            );
            old.push(Finding::new(
                FindingCategory::OldSnapshot,
                ResourceDescriptor::Snapshot(snapshot),
                Evidence::SnapshotAge {
                    age_days: age,
                    max_age_days: max_age,
                },
                self.settings.days,
                estimate.monthly_cost,
                PriceSource::DefaultTable,
            ));
        }
        info!(
            "Found {} snapshots older than {} days",
            old.len(),
            max_age
        );
        old
    }
}

#[async_trait]
impl Scanner for RdsScanner {
    fn kind(&self) -> ScannerKind {
        ScannerKind::Rds
    }

    fn region(&self) -> &str {
        &self.ctx.region
    }

    fn settings(&self) -> SettingsEcho {
        SettingsEcho::Rds(self.settings.clone())
    }

    async fn analyze(&self) -> ScanResult {
        let mut result = ScanResult::default();

        let instances = match self.list_instances().await {
            Ok(instances) => {
                info!("Found {} RDS instances in {}", instances.len(), self.ctx.region);
                instances
            }
            Err(e) => {
                error!("Error fetching RDS instances: {}", e);
                result
                    .diagnostics
                    .push(Diagnostic::new("rds:list_database_instances", e.to_string()));
                Vec::new()
            }
        };
        let available: Vec<DatabaseInstance> = instances
            .into_iter()
            .filter(|i| i.status == AVAILABLE)
            .collect();

        if available.is_empty() {
            info!("No available RDS instances found.");
        } else {
            info!(
                "Analyzing {} RDS instances (CPU threshold: {}%, connections threshold: {})",
                available.len(),
                self.settings.cpu_threshold,
                self.settings.connections_threshold
            );
        }
        result.resources_scanned += available.len();

        let window = TimeWindow::last_days(self.settings.days);
        let evaluations: Vec<Evaluation> = stream::iter(available)
            .map(|instance| self.evaluate_instance(instance, window))
            .buffer_unordered(self.ctx.concurrency)
            .collect()
            .await;
        for evaluation in evaluations {
            result.absorb(evaluation);
        }

        match self.list_manual_snapshots().await {
            Ok(snapshots) => {
                info!(
                    "Found {} manual RDS snapshots in {}",
                    snapshots.len(),
                    self.ctx.region
                );
                result.resources_scanned += snapshots.len();
                let old = self.find_old_snapshots(snapshots, Utc::now());
                result.findings.extend(old);
            }
            Err(e) => {
                error!("Error fetching RDS snapshots: {}", e);
                result
                    .diagnostics
                    .push(Diagnostic::new("rds:list_manual_snapshots", e.to_string()));
            }
        }
        result.sort_entries();

        let idle = result
            .findings
            .iter()
            .filter(|f| f.category == FindingCategory::IdleDatabase)
            .count();
        info!(
            "RDS scan complete: {} idle instances and {} old snapshots found",
            idle,
            result.findings.len() - idle
        );
        result
    }
}
