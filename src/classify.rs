//! Idle classification rules
//!
//! Pure predicates over reduced metrics and thresholds. Utilization thresholds
//! (CPU, connections, I/O, requests) are inclusive: a value equal to the
//! threshold is idle. Snapshot age is exclusive: a snapshot exactly
//! `max_age_days` old is not flagged.

use crate::types::VolumeState;
use serde::{Deserialize, Serialize};

/// Compute instance: idle iff CPU data exists and `avg_cpu <= cpu_threshold`.
pub fn is_compute_idle(avg_cpu: Option<f64>, cpu_threshold: f64) -> bool {
    matches!(avg_cpu, Some(cpu) if cpu <= cpu_threshold)
}

/// Database instance: idle iff both signals exist and both are at or below
/// their thresholds.
pub fn is_database_idle(
    avg_cpu: Option<f64>,
    avg_connections: Option<f64>,
    cpu_threshold: f64,
    connections_threshold: f64,
) -> bool {
    match (avg_cpu, avg_connections) {
        (Some(cpu), Some(connections)) => {
            cpu <= cpu_threshold && connections <= connections_threshold
        }
        _ => false,
    }
}

/// Block volume not attached to any instance
pub fn is_volume_unattached(state: &VolumeState) -> bool {
    *state == VolumeState::Available
}

/// Combined read + write operations over the window.
///
/// Missing series count as zero activity, so a volume with no metrics at all
/// is flagged for review.
pub fn total_io(read_ops: Option<f64>, write_ops: Option<f64>) -> f64 {
    read_ops.unwrap_or(0.0) + write_ops.unwrap_or(0.0)
}

/// Block volume with at most `io_threshold` operations over the window
pub fn is_low_io(read_ops: Option<f64>, write_ops: Option<f64>, io_threshold: f64) -> bool {
    total_io(read_ops, write_ops) <= io_threshold
}

/// Three-way bucket activity outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketActivity {
    Active,
    Unused,
    MetricsNotEnabled,
}

/// Classify a bucket by its request count.
///
/// `None` means the backend returned no request datapoints, which is taken to
/// mean request metrics are not enabled for the bucket.
pub fn classify_bucket(total_requests: Option<u64>, request_threshold: u64) -> BucketActivity {
    match total_requests {
        None => BucketActivity::MetricsNotEnabled,
        Some(requests) if requests <= request_threshold => BucketActivity::Unused,
        Some(_) => BucketActivity::Active,
    }
}

/// Snapshot older than `max_age_days` (strictly)
pub fn is_snapshot_old(age_days: i64, max_age_days: i64) -> bool {
    age_days > max_age_days
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_boundary_is_inclusive() {
        assert!(is_compute_idle(Some(5.0), 5.0));
        assert!(!is_compute_idle(Some(5.01), 5.0));
        assert!(is_compute_idle(Some(0.0), 5.0));
    }

    #[test]
    fn test_compute_no_data_is_not_idle() {
        assert!(!is_compute_idle(None, 5.0));
        assert!(!is_compute_idle(None, 100.0));
    }

    #[test]
    fn test_database_requires_both_signals() {
        assert!(is_database_idle(Some(5.0), Some(1.0), 5.0, 1.0));
        assert!(!is_database_idle(Some(2.0), Some(1.5), 5.0, 1.0));
        assert!(!is_database_idle(Some(5.5), Some(0.0), 5.0, 1.0));
        assert!(!is_database_idle(None, Some(0.0), 5.0, 1.0));
        assert!(!is_database_idle(Some(0.0), None, 5.0, 1.0));
    }

    #[test]
    fn test_unattached_is_a_state_check() {
        assert!(is_volume_unattached(&VolumeState::Available));
        assert!(!is_volume_unattached(&VolumeState::InUse));
        assert!(!is_volume_unattached(&VolumeState::Creating));
    }

    #[test]
    fn test_low_io_missing_data_counts_as_zero() {
        assert_eq!(total_io(None, None), 0.0);
        assert!(is_low_io(None, None, 100.0));
        assert!(is_low_io(Some(60.0), None, 100.0));
    }

    #[test]
    fn test_low_io_boundary_is_inclusive() {
        assert!(is_low_io(Some(60.0), Some(40.0), 100.0));
        assert!(!is_low_io(Some(60.0), Some(40.5), 100.0));
        assert!(!is_low_io(Some(10.0), Some(500.0), 100.0));
    }

    #[test]
    fn test_bucket_three_way_outcome() {
        assert_eq!(classify_bucket(Some(0), 10), BucketActivity::Unused);
        assert_eq!(classify_bucket(Some(10), 10), BucketActivity::Unused);
        assert_eq!(classify_bucket(Some(11), 10), BucketActivity::Active);
        assert_eq!(classify_bucket(None, 10), BucketActivity::MetricsNotEnabled);
    }

    #[test]
    fn test_snapshot_age_is_exclusive() {
        assert!(!is_snapshot_old(90, 90));
        assert!(is_snapshot_old(91, 90));
        assert!(!is_snapshot_old(0, 90));
    }
}
