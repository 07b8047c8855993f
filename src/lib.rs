//! cost-sentinel library
//!
//! Scans an AWS account for idle or forgotten resources (EC2 instances, EBS
//! volumes, RDS instances and snapshots, S3 buckets), estimates what they cost
//! per month and reports potential savings.

pub mod aggregate;
pub mod aws;
pub mod classify;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod metrics;
pub mod pricing;
pub mod provider;
pub mod report;
pub mod retry;
pub mod scan;
pub mod scanners;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, SentinelError};
pub use report::{ScanReport, ScanSummary};
pub use scan::{run_scan, Providers};
pub use scanners::{ScanResult, Scanner, ScannerKind};
pub use types::{Diagnostic, Finding, FindingCategory};
