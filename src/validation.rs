//! Input validation utilities
//!
//! Scanner settings and CLI inputs are validated before any provider call is
//! made, so a bad threshold fails the run instead of producing a misleading
//! report.

use crate::error::{Result, SentinelError};
use regex::Regex;
use std::sync::OnceLock;

/// Maximum lookback window. CloudWatch keeps hourly datapoints for 455 days.
pub const MAX_LOOKBACK_DAYS: u32 = 455;

fn region_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^[a-z]{2}(-gov|-iso[a-z]?)?-[a-z]+-\d{1,2}$").unwrap()
    })
}

/// Validate an AWS region code such as `us-east-1` or `us-gov-west-1`
pub fn validate_region(region: &str) -> Result<()> {
    if region.is_empty() {
        return Err(SentinelError::Validation {
            field: "region".to_string(),
            reason: "Region cannot be empty".to_string(),
        });
    }

    if !region_pattern().is_match(region) {
        return Err(SentinelError::Validation {
            field: "region".to_string(),
            reason: format!(
                "Region must look like an AWS region code (e.g. us-east-1), got: {}",
                region
            ),
        });
    }

    Ok(())
}

/// Validate a lookback window in days
pub fn validate_days(field: &str, days: u32) -> Result<()> {
    if days == 0 {
        return Err(SentinelError::Validation {
            field: field.to_string(),
            reason: "Lookback window must be at least 1 day".to_string(),
        });
    }

    if days > MAX_LOOKBACK_DAYS {
        return Err(SentinelError::Validation {
            field: field.to_string(),
            reason: format!(
                "Lookback window must be <= {} days, got: {}",
                MAX_LOOKBACK_DAYS, days
            ),
        });
    }

    Ok(())
}

/// Validate a utilization threshold: finite and non-negative
pub fn validate_threshold(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(SentinelError::Validation {
            field: field.to_string(),
            reason: format!("Threshold must be a finite number, got: {}", value),
        });
    }

    if value < 0.0 {
        return Err(SentinelError::Validation {
            field: field.to_string(),
            reason: format!("Threshold cannot be negative, got: {}", value),
        });
    }

    Ok(())
}

/// Validate a percentage threshold (0..=100)
pub fn validate_percentage(field: &str, value: f64) -> Result<()> {
    validate_threshold(field, value)?;
    if value > 100.0 {
        return Err(SentinelError::Validation {
            field: field.to_string(),
            reason: format!("Percentage must be <= 100, got: {}", value),
        });
    }
    Ok(())
}

/// Validate a count that must be at least 1 (concurrency, retry attempts)
pub fn validate_positive(field: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(SentinelError::Validation {
            field: field.to_string(),
            reason: "Value must be at least 1".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_region_valid() {
        assert!(validate_region("us-east-1").is_ok());
        assert!(validate_region("eu-west-3").is_ok());
        assert!(validate_region("ap-southeast-2").is_ok());
        assert!(validate_region("us-gov-west-1").is_ok());
        assert!(validate_region("ca-central-1").is_ok());
    }

    #[test]
    fn test_validate_region_invalid() {
        assert!(validate_region("").is_err());
        assert!(validate_region("US-EAST-1").is_err());
        assert!(validate_region("us-east").is_err());
        assert!(validate_region("useast1").is_err());
        assert!(validate_region("us-east-1; rm").is_err());
    }

    #[test]
    fn test_validate_days() {
        assert!(validate_days("ec2.days", 1).is_ok());
        assert!(validate_days("ec2.days", 14).is_ok());
        assert!(validate_days("ec2.days", 0).is_err());
        assert!(validate_days("ec2.days", MAX_LOOKBACK_DAYS + 1).is_err());
    }

    #[test]
    fn test_validate_threshold() {
        assert!(validate_threshold("io", 0.0).is_ok());
        assert!(validate_threshold("io", 100.0).is_ok());
        assert!(validate_threshold("io", -1.0).is_err());
        assert!(validate_threshold("io", f64::NAN).is_err());
        assert!(validate_threshold("io", f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_percentage() {
        assert!(validate_percentage("cpu", 5.0).is_ok());
        assert!(validate_percentage("cpu", 100.0).is_ok());
        assert!(validate_percentage("cpu", 100.5).is_err());
    }

    #[test]
    fn test_validation_error_names_field() {
        match validate_days("rds.days", 0) {
            Err(SentinelError::Validation { field, .. }) => assert_eq!(field, "rds.days"),
            other => panic!("expected Validation error, got {:?}", other),
        }
        assert!(validate_positive("concurrency", 0).is_err());
        assert!(validate_positive("concurrency", 8).is_ok());
    }
}
