//! Scan summaries and the combined report
//!
//! Scanners produce a `ScanSummary` each; `ScanReport` combines them with the
//! account identity and the run-wide diagnostics. Reports render as text
//! tables for the console or as pretty JSON.

use crate::aggregate::{category_totals, total_savings, CategoryTotal};
use crate::config::{EbsSettings, Ec2Settings, RdsSettings, S3Settings};
use crate::error::Result;
use crate::scanners::{ScanResult, ScannerKind};
use crate::types::{Diagnostic, Evidence, Finding};
use crate::utils::{format_currency, round_currency};
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Color, Table};
use console::style;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Echo of the settings a scanner ran with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scanner", rename_all = "lowercase")]
pub enum SettingsEcho {
    Ec2(Ec2Settings),
    Ebs(EbsSettings),
    Rds(RdsSettings),
    S3(S3Settings),
}

/// Result of one scanner run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub scanner: ScannerKind,
    pub region: String,
    pub scan_timestamp: DateTime<Utc>,
    pub settings: SettingsEcho,
    pub resources_scanned: usize,
    /// Resources skipped for missing metrics
    pub insufficient_data: usize,
    pub categories: Vec<CategoryTotal>,
    pub findings: Vec<Finding>,
    /// Deduplicated over flagged resources
    pub total_potential_monthly_savings: f64,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScanSummary {
    pub fn from_result(
        scanner: ScannerKind,
        region: &str,
        settings: SettingsEcho,
        result: ScanResult,
    ) -> Self {
        Self {
            scanner,
            region: region.to_string(),
            scan_timestamp: Utc::now(),
            settings,
            resources_scanned: result.resources_scanned,
            insufficient_data: result.insufficient_data,
            categories: category_totals(&result.findings),
            total_potential_monthly_savings: total_savings(&result.findings),
            findings: result.findings,
            diagnostics: result.diagnostics,
        }
    }
}

/// Combined report for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub account_id: Option<String>,
    pub region: String,
    pub scan_timestamp: DateTime<Utc>,
    pub summaries: Vec<ScanSummary>,
    pub total_potential_monthly_savings: f64,
    /// Run-level diagnostics (identity lookup and similar)
    pub diagnostics: Vec<Diagnostic>,
}

impl ScanReport {
    pub fn new(
        account_id: Option<String>,
        region: &str,
        summaries: Vec<ScanSummary>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let total = summaries
            .iter()
            .map(|s| s.total_potential_monthly_savings)
            .sum::<f64>();
        Self {
            account_id,
            region: region.to_string(),
            scan_timestamp: Utc::now(),
            summaries,
            total_potential_monthly_savings: round_currency(total),
            diagnostics,
        }
    }

    pub fn finding_count(&self) -> usize {
        self.summaries.iter().map(|s| s.findings.len()).sum()
    }

    /// Run-level and scanner diagnostics together
    pub fn all_diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .chain(self.summaries.iter().flat_map(|s| s.diagnostics.iter()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(80);

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "{}", style("CLOUD COST SENTINEL REPORT").bold());
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(
            out,
            "Account: {}",
            self.account_id.as_deref().unwrap_or(crate::types::NOT_AVAILABLE)
        );
        let _ = writeln!(out, "Region:  {}", self.region);
        let _ = writeln!(out, "Time:    {}", self.scan_timestamp.to_rfc3339());

        for summary in &self.summaries {
            let _ = writeln!(out);
            render_summary(&mut out, summary);
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "{}", rule);
        let mut totals = Table::new();
        totals.set_header(vec!["Scanner", "Scanned", "No data", "Findings", "Savings/month"]);
        for summary in &self.summaries {
            totals.add_row(vec![
                Cell::new(summary.scanner.label()),
                Cell::new(summary.resources_scanned),
                Cell::new(summary.insufficient_data),
                Cell::new(summary.findings.len()),
                Cell::new(format_currency(summary.total_potential_monthly_savings)),
            ]);
        }
        let _ = writeln!(out, "{}", totals);
        let _ = writeln!(
            out,
            "Total potential monthly savings: {}",
            style(format_currency(self.total_potential_monthly_savings))
                .green()
                .bold()
        );

        let diagnostics: Vec<&Diagnostic> = self.all_diagnostics().collect();
        if !diagnostics.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "{} {} diagnostic(s):",
                style("!").yellow().bold(),
                diagnostics.len()
            );
            for diagnostic in diagnostics {
                let target = diagnostic.resource_id.as_deref().unwrap_or("-");
                let _ = writeln!(
                    out,
                    "  [{}] {}: {}",
                    diagnostic.scope, target, diagnostic.message
                );
            }
        }

        out
    }
}

fn render_summary(out: &mut String, summary: &ScanSummary) {
    let _ = writeln!(
        out,
        "{} ({} resources scanned in {})",
        style(summary.scanner.label()).bold().cyan(),
        summary.resources_scanned,
        summary.region
    );
    let _ = writeln!(out, "{}", "-".repeat(80));

    if summary.findings.is_empty() {
        let _ = writeln!(out, "  No idle resources found");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Category", "Resource", "Name", "Billing", "Evidence", "Cost/month",
    ]);
    for finding in &summary.findings {
        let category = Cell::new(finding.category.label()).fg(if finding.category.counts_toward_savings() {
            Color::Yellow
        } else {
            Color::DarkGrey
        });
        table.add_row(vec![
            category,
            Cell::new(finding.resource_id()),
            Cell::new(finding.resource.display_name()),
            Cell::new(finding.resource.billing_summary()),
            Cell::new(evidence_summary(&finding.evidence, finding.analysis_period_days)),
            Cell::new(format_currency(finding.estimated_monthly_cost)),
        ]);
    }
    let _ = writeln!(out, "{}", table);

    for total in &summary.categories {
        let _ = writeln!(
            out,
            "  {}: {} ({}/month)",
            total.category.label(),
            total.count,
            format_currency(total.monthly_cost)
        );
    }
    let _ = writeln!(
        out,
        "  Potential savings: {}",
        style(format_currency(summary.total_potential_monthly_savings)).green()
    );
}

/// One-line description of the evidence behind a finding
pub fn evidence_summary(evidence: &Evidence, days: u32) -> String {
    match evidence {
        Evidence::Cpu {
            avg_cpu_percent,
            cpu_threshold,
        } => format!(
            "CPU {:.2}% <= {}% over {}d",
            avg_cpu_percent, cpu_threshold, days
        ),
        Evidence::Database {
            avg_cpu_percent,
            avg_connections,
            ..
        } => format!(
            "CPU {:.2}%, {:.2} connections over {}d",
            avg_cpu_percent, avg_connections, days
        ),
        Evidence::Attachment { state } => format!("state {}", state),
        Evidence::Io {
            total_io_ops,
            io_threshold,
        } => format!("{} I/O ops <= {} over {}d", total_io_ops, io_threshold, days),
        Evidence::SnapshotAge {
            age_days,
            max_age_days,
        } => format!("{} days old (> {})", age_days, max_age_days),
        Evidence::Requests {
            total_requests: Some(requests),
            request_threshold,
        } => format!("{} requests <= {} over {}d", requests, request_threshold, days),
        Evidence::Requests {
            total_requests: None,
            ..
        } => "request metrics not enabled".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ComputeInstance, FindingCategory, PriceSource, ResourceDescriptor};

    fn idle_instance(id: &str, cost: f64) -> Finding {
        Finding::new(
            FindingCategory::IdleInstance,
            ResourceDescriptor::Compute(ComputeInstance {
                instance_id: id.to_string(),
                name: "batch-worker".to_string(),
                instance_type: "t3.medium".to_string(),
                state: "running".to_string(),
                launch_time: None,
                private_ip: "10.0.0.4".to_string(),
                public_ip: "N/A".to_string(),
                platform: "Linux".to_string(),
            }),
            Evidence::Cpu {
                avg_cpu_percent: 1.25,
                cpu_threshold: 5.0,
            },
            14,
            cost,
            PriceSource::DefaultTable,
        )
    }

    fn summary(findings: Vec<Finding>) -> ScanSummary {
        ScanSummary::from_result(
            ScannerKind::Ec2,
            "us-east-1",
            SettingsEcho::Ec2(Ec2Settings::default()),
            ScanResult {
                findings,
                diagnostics: vec![Diagnostic::new("ec2:get_samples", "throttled")],
                resources_scanned: 3,
                insufficient_data: 1,
            },
        )
    }

    #[test]
    fn test_summary_totals() {
        let summary = summary(vec![idle_instance("i-1", 30.37), idle_instance("i-2", 7.59)]);
        assert_eq!(summary.total_potential_monthly_savings, 37.96);
        assert_eq!(summary.categories.len(), 1);
        assert_eq!(summary.categories[0].count, 2);
        assert_eq!(summary.insufficient_data, 1);
    }

    #[test]
    fn test_report_combines_summaries() {
        let report = ScanReport::new(
            Some("123456789012".to_string()),
            "us-east-1",
            vec![summary(vec![idle_instance("i-1", 30.37)]), summary(vec![])],
            vec![Diagnostic::new("sts:get_caller_identity", "expired token")],
        );
        assert_eq!(report.total_potential_monthly_savings, 30.37);
        assert_eq!(report.finding_count(), 1);
        assert_eq!(report.all_diagnostics().count(), 3);
    }

    #[test]
    fn test_json_shape() {
        let report = ScanReport::new(None, "eu-west-1", vec![summary(vec![idle_instance("i-1", 1.0)])], vec![]);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["region"], "eu-west-1");
        assert!(value["account_id"].is_null());
        let summary = &value["summaries"][0];
        assert_eq!(summary["scanner"], "ec2");
        assert_eq!(summary["settings"]["scanner"], "ec2");
        assert_eq!(summary["settings"]["cpu_threshold"], 5.0);
        let finding = &summary["findings"][0];
        assert_eq!(finding["category"], "idle_instance");
        assert_eq!(finding["resource"]["kind"], "compute");
        assert_eq!(finding["evidence"]["rule"], "cpu");
        assert_eq!(finding["recommendation"], "Consider stopping or terminating this instance");
    }

    #[test]
    fn test_text_rendering_mentions_findings() {
        let report = ScanReport::new(
            Some("123456789012".to_string()),
            "us-east-1",
            vec![summary(vec![idle_instance("i-0abc", 30.37)])],
            vec![],
        );
        let text = console::strip_ansi_codes(&report.render_text()).to_string();
        assert!(text.contains("123456789012"));
        assert!(text.contains("i-0abc"));
        assert!(text.contains("$30.37"));
        assert!(text.contains("throttled"));
    }

    #[test]
    fn test_evidence_summary() {
        let requests = Evidence::Requests {
            total_requests: None,
            request_threshold: 10,
        };
        assert_eq!(evidence_summary(&requests, 30), "request metrics not enabled");

        let age = Evidence::SnapshotAge {
            age_days: 120,
            max_age_days: 90,
        };
        assert_eq!(evidence_summary(&age, 14), "120 days old (> 90)");
    }
}
