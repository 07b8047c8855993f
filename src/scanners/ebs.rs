//! Unattached and low-I/O EBS volume detection
//!
//! All volumes are listed once. A volume in the `available` state is
//! unattached. Independently, a volume whose combined read and write
//! operations over the window are at or below the threshold is low I/O; a
//! missing series counts as zero, so a volume with no metrics is flagged.
//! A volume matching both rules yields two findings that share one price.

use super::{round_metric, Evaluation, ScanContext, ScanResult, Scanner, ScannerKind};
use crate::classify::{is_low_io, is_volume_unattached, total_io};
use crate::config::EbsSettings;
use crate::error::Result;
use crate::metrics::{reduce_samples, Reduction};
use crate::provider::{Dimension, MetricQuery, Statistic, TimeWindow};
use crate::report::SettingsEcho;
use crate::types::{
    Diagnostic, Evidence, Finding, FindingCategory, ResourceDescriptor, Volume,
};
use crate::validation::validate_region;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

const NAMESPACE: &str = "AWS/EBS";
const PERIOD_SECS: i32 = 86_400;

pub struct EbsScanner {
    ctx: ScanContext,
    settings: EbsSettings,
}

impl EbsScanner {
    pub fn new(ctx: ScanContext, settings: EbsSettings) -> Result<Self> {
        validate_region(&ctx.region)?;
        settings.validate()?;
        Ok(Self { ctx, settings })
    }

    /// All volumes in the region, attached or not
    pub async fn list_volumes(&self) -> Result<Vec<Volume>> {
        self.ctx.inventory.list_volumes(&self.ctx.region, None).await
    }

    /// Summed read and write operations over `window`
    pub async fn fetch_io(
        &self,
        volume_id: &str,
        window: TimeWindow,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> (Option<f64>, Option<f64>) {
        let mut totals = [None, None];
        for (slot, metric) in totals.iter_mut().zip(["VolumeReadOps", "VolumeWriteOps"]) {
            let query = MetricQuery::new(
                NAMESPACE,
                metric,
                vec![Dimension::new("VolumeId", volume_id)],
                window,
                PERIOD_SECS,
                Statistic::Sum,
            );
            let samples = self
                .ctx
                .samples_or_empty("ebs:get_samples", volume_id, &query, diagnostics)
                .await;
            *slot = reduce_samples(&samples, Reduction::Sum);
        }
        (totals[0], totals[1])
    }

    async fn evaluate(&self, volume: Volume, window: TimeWindow) -> Evaluation {
        let mut evaluation = Evaluation::default();
        let id = volume.volume_id.clone();
        let days = self.settings.days;

        let unattached = is_volume_unattached(&volume.state);
        let (read_ops, write_ops) = self.fetch_io(&id, window, &mut evaluation.diagnostics).await;
        let io = total_io(read_ops, write_ops);
        let low_io = is_low_io(read_ops, write_ops, self.settings.io_threshold);

        if unattached {
            warn!(
                "UNATTACHED: {} ({}) - Type: {}, Size: {} GB",
                id, volume.name, volume.volume_type, volume.size_gb
            );
        }
        if low_io {
            if read_ops.is_none() && write_ops.is_none() {
                warn!(
                    "LOW I/O: {} ({}) - No I/O metrics for the last {} days",
                    id, volume.name, days
                );
            } else {
                warn!(
                    "LOW I/O: {} ({}) - {} operations over {} days",
                    id, volume.name, io, days
                );
            }
        }
        if !unattached && !low_io {
            info!(
                "OK: {} ({}) - {} operations over {} days",
                id, volume.name, io, days
            );
            return evaluation;
        }

        let estimate = self
            .ctx
            .pricing
            .ebs_monthly_cost(
                &volume.volume_type,
                volume.size_gb,
                volume.iops,
                volume.throughput_mbps,
                &self.ctx.region,
                self.ctx.prefer_online_pricing,
            )
            .await;
        evaluation.note_price(&id, &estimate);

        if unattached {
            evaluation.findings.push(Finding::new(
                FindingCategory::UnattachedVolume,
                ResourceDescriptor::Volume(volume.clone()),
                Evidence::Attachment {
                    state: volume.state.as_str().to_string(),
                },
                days,
                estimate.monthly_cost,
                estimate.source,
            ));
        }
        if low_io {
            evaluation.findings.push(Finding::new(
                FindingCategory::LowIoVolume,
                ResourceDescriptor::Volume(volume),
                Evidence::Io {
                    total_io_ops: round_metric(io),
                    io_threshold: self.settings.io_threshold,
                },
                days,
                estimate.monthly_cost,
                estimate.source,
            ));
        }
        evaluation
    }
}

#[async_trait]
impl Scanner for EbsScanner {
    fn kind(&self) -> ScannerKind {
        ScannerKind::Ebs
    }

    fn region(&self) -> &str {
        &self.ctx.region
    }

    fn settings(&self) -> SettingsEcho {
        SettingsEcho::Ebs(self.settings.clone())
    }

    async fn analyze(&self) -> ScanResult {
        let volumes = match self.list_volumes().await {
            Ok(volumes) => volumes,
            Err(e) => {
                error!("Error fetching EBS volumes: {}", e);
                return ScanResult::listing_failed("ebs:list_volumes", &e);
            }
        };
        info!("Found {} EBS volumes in {}", volumes.len(), self.ctx.region);

        let mut result = ScanResult {
            resources_scanned: volumes.len(),
            ..ScanResult::default()
        };
        let window = TimeWindow::last_days(self.settings.days);
        let evaluations: Vec<Evaluation> = stream::iter(volumes)
            .map(|volume| self.evaluate(volume, window))
            .buffer_unordered(self.ctx.concurrency)
            .collect()
            .await;
        for evaluation in evaluations {
            result.absorb(evaluation);
        }
        result.sort_entries();

        let unattached = result
            .findings
            .iter()
            .filter(|f| f.category == FindingCategory::UnattachedVolume)
            .count();
        info!(
            "EBS scan complete: {} unattached and {} low I/O volumes out of {}",
            unattached,
            result.findings.len() - unattached,
            result.resources_scanned
        );
        result
    }
}
