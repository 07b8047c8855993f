//! Idle EC2 instance detection
//!
//! A running instance is idle when its average hourly CPU utilization over
//! the lookback window is at or below the threshold. Instances without CPU
//! datapoints are reported as insufficient data, never as idle.

use super::{round_metric, Evaluation, ScanContext, ScanResult, Scanner, ScannerKind};
use crate::classify::is_compute_idle;
use crate::config::Ec2Settings;
use crate::error::Result;
use crate::metrics::{reduce_samples, Reduction};
use crate::provider::{Dimension, MetricQuery, Statistic, TimeWindow};
use crate::report::SettingsEcho;
use crate::types::{
    ComputeInstance, Diagnostic, Evidence, Finding, FindingCategory, ResourceDescriptor,
};
use crate::validation::validate_region;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

const NAMESPACE: &str = "AWS/EC2";
const PERIOD_SECS: i32 = 3600;

pub struct Ec2Scanner {
    ctx: ScanContext,
    settings: Ec2Settings,
}

impl Ec2Scanner {
    /// Fails on invalid settings before any provider call
    pub fn new(ctx: ScanContext, settings: Ec2Settings) -> Result<Self> {
        validate_region(&ctx.region)?;
        settings.validate()?;
        Ok(Self { ctx, settings })
    }

    /// Running instances in the scanner's region
    pub async fn list_instances(&self) -> Result<Vec<ComputeInstance>> {
        self.ctx.inventory.list_running_compute(&self.ctx.region).await
    }

    /// Average CPU utilization over `window`, `None` without datapoints
    pub async fn fetch_cpu(
        &self,
        instance_id: &str,
        window: TimeWindow,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<f64> {
        let query = MetricQuery::new(
            NAMESPACE,
            "CPUUtilization",
            vec![Dimension::new("InstanceId", instance_id)],
            window,
            PERIOD_SECS,
            Statistic::Average,
        );
        let samples = self
            .ctx
            .samples_or_empty("ec2:get_samples", instance_id, &query, diagnostics)
            .await;
        reduce_samples(&samples, Reduction::Average)
    }

    async fn evaluate(&self, instance: ComputeInstance, window: TimeWindow) -> Evaluation {
        let mut evaluation = Evaluation::default();
        let id = instance.instance_id.clone();
        let days = self.settings.days;

        let Some(avg_cpu) = self.fetch_cpu(&id, window, &mut evaluation.diagnostics).await else {
            warn!(
                "NO DATA: {} ({}) - No CPU metrics available for the last {} days",
                id, instance.name, days
            );
            evaluation.insufficient_data = true;
            return evaluation;
        };

        if !is_compute_idle(Some(avg_cpu), self.settings.cpu_threshold) {
            info!(
                "OK: {} ({}) - Avg CPU: {:.2}% over {} days",
                id, instance.name, avg_cpu, days
            );
            return evaluation;
        }

        warn!(
            "IDLE: {} ({}) - Type: {}, Avg CPU: {:.2}% over {} days",
            id, instance.name, instance.instance_type, avg_cpu, days
        );
        let estimate = self
            .ctx
            .pricing
            .ec2_monthly_cost(
                &instance.instance_type,
                &instance.platform,
                &self.ctx.region,
                self.ctx.prefer_online_pricing,
            )
            .await;
        evaluation.note_price(&id, &estimate);
        evaluation.findings.push(Finding::new(
            FindingCategory::IdleInstance,
            ResourceDescriptor::Compute(instance),
            Evidence::Cpu {
                avg_cpu_percent: round_metric(avg_cpu),
                cpu_threshold: self.settings.cpu_threshold,
            },
            days,
            estimate.monthly_cost,
            estimate.source,
        ));
        evaluation
    }
}

#[async_trait]
impl Scanner for Ec2Scanner {
    fn kind(&self) -> ScannerKind {
        ScannerKind::Ec2
    }

    fn region(&self) -> &str {
        &self.ctx.region
    }

    fn settings(&self) -> SettingsEcho {
        SettingsEcho::Ec2(self.settings.clone())
    }

    async fn analyze(&self) -> ScanResult {
        let instances = match self.list_instances().await {
            Ok(instances) => instances,
            Err(e) => {
                error!("Error fetching EC2 instances: {}", e);
                return ScanResult::listing_failed("ec2:list_running_compute", &e);
            }
        };
        info!(
            "Found {} running EC2 instances in {}",
            instances.len(),
            self.ctx.region
        );

        let mut result = ScanResult {
            resources_scanned: instances.len(),
            ..ScanResult::default()
        };
        if instances.is_empty() {
            return result;
        }

        info!(
            "Analyzing {} instances for idle detection (threshold: {}% CPU)",
            instances.len(),
            self.settings.cpu_threshold
        );
        let window = TimeWindow::last_days(self.settings.days);
        let evaluations: Vec<Evaluation> = stream::iter(instances)
            .map(|instance| self.evaluate(instance, window))
            .buffer_unordered(self.ctx.concurrency)
            .collect()
            .await;
        for evaluation in evaluations {
            result.absorb(evaluation);
        }
        result.sort_entries();

        info!(
            "EC2 scan complete: {} idle instances found out of {} total running instances",
            result.findings.len(),
            result.resources_scanned
        );
        result
    }
}
