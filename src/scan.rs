//! Scan orchestration
//!
//! Builds the enabled scanners over one set of providers and one shared
//! pricing resolver, runs them in order and assembles the report.

use crate::config::Config;
use crate::error::Result;
use crate::pricing::PricingResolver;
use crate::provider::{InventoryProvider, MetricsProvider, PricingCatalog};
use crate::report::ScanReport;
use crate::scanners::{
    EbsScanner, Ec2Scanner, RdsScanner, S3Scanner, ScanContext, Scanner, ScannerKind,
};
use crate::types::Diagnostic;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};

/// Collaborators for one scan run
pub struct Providers {
    pub inventory: Arc<dyn InventoryProvider>,
    pub metrics: Arc<dyn MetricsProvider>,
    /// `None` prices everything from the built-in tables
    pub catalog: Option<Arc<dyn PricingCatalog>>,
    pub account_id: Option<String>,
    /// Run-level diagnostics gathered while setting up the providers
    pub diagnostics: Vec<Diagnostic>,
}

impl Providers {
    pub fn new(inventory: Arc<dyn InventoryProvider>, metrics: Arc<dyn MetricsProvider>) -> Self {
        Self {
            inventory,
            metrics,
            catalog: None,
            account_id: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn PricingCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }
}

fn build_scanner(kind: ScannerKind, config: &Config, ctx: ScanContext) -> Result<Box<dyn Scanner>> {
    let scanner: Box<dyn Scanner> = match kind {
        ScannerKind::Ec2 => Box::new(Ec2Scanner::new(ctx, config.ec2.clone())?),
        ScannerKind::Ebs => Box::new(EbsScanner::new(ctx, config.ebs.clone())?),
        ScannerKind::Rds => Box::new(RdsScanner::new(ctx, config.rds.clone())?),
        ScannerKind::S3 => Box::new(S3Scanner::new(ctx, config.s3.clone())?),
    };
    Ok(scanner)
}

/// Run every enabled scanner and combine the summaries.
///
/// Invalid configuration fails before any provider is called. Provider
/// failures during the scan end up as diagnostics in the report.
pub async fn run_scan(config: &Config, providers: Providers) -> Result<ScanReport> {
    config.validate()?;

    let pricing = Arc::new(match providers.catalog {
        Some(catalog) => PricingResolver::new(catalog),
        None => PricingResolver::offline(),
    });
    let ctx = ScanContext::new(
        config.region.clone(),
        providers.inventory,
        providers.metrics,
        pricing.clone(),
    )
    .with_online_pricing(config.prefer_online_pricing && pricing.has_catalog())
    .with_concurrency(config.concurrency);

    let scanners = config
        .enabled_scanners()
        .into_iter()
        .map(|kind| build_scanner(kind, config, ctx.clone()))
        .collect::<Result<Vec<_>>>()?;

    let mut summaries = Vec::with_capacity(scanners.len());
    for scanner in &scanners {
        let kind = scanner.kind();
        info!("Scanning {} in {}", kind.label(), config.region);
        let summary = scanner
            .scan()
            .instrument(info_span!("scan", scanner = %kind))
            .await;
        summaries.push(summary);
    }
    info!("Resolved {} distinct prices", pricing.cached_prices().await);

    Ok(ScanReport::new(
        providers.account_id,
        &config.region,
        summaries,
        providers.diagnostics,
    ))
}
