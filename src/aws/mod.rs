//! AWS SDK collaborators
//!
//! Implementations of the provider traits on top of the AWS SDK for Rust:
//!
//! - `inventory`: EC2, EBS, RDS and S3 listings (`AwsInventory`)
//! - `cloudwatch`: metric statistics (`CloudWatchMetrics`)
//! - `pricing`: Price List API lookups (`AwsPriceCatalog`)
//! - `identity`: caller account id via STS
//!
//! Every SDK call goes through `ExponentialBackoffPolicy`. SDK errors are
//! classified by error code: throttling codes become retryable
//! `CloudProvider` errors, everything else (access denied included) becomes
//! a non-retryable `Aws` error.

mod cloudwatch;
mod identity;
mod inventory;
mod pricing;

pub use cloudwatch::CloudWatchMetrics;
pub use identity::caller_account_id;
pub use inventory::{normalize_bucket_location, AwsInventory};
pub use pricing::AwsPriceCatalog;

use crate::error::SentinelError;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata};
use chrono::{DateTime, Utc};

/// Error codes AWS services use for rate limiting
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
    "RequestThrottled",
    "RequestThrottledException",
    "SlowDown",
    "ProvisionedThroughputExceededException",
];

pub fn is_throttling_code(code: &str) -> bool {
    THROTTLING_CODES.contains(&code)
}

/// Load shared SDK configuration for `region`
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

/// Convert an SDK error into a `SentinelError`, retryable only when throttled
pub(crate) fn sdk_error<E>(operation: &str, err: E) -> SentinelError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let code = err.code().unwrap_or_default().to_string();
    let message = format!("{} failed: {}", operation, DisplayErrorContext(&err));
    if is_throttling_code(&code) {
        SentinelError::CloudProvider {
            provider: "aws".to_string(),
            message,
            source: Some(Box::new(err)),
        }
    } else {
        SentinelError::Aws(message)
    }
}

/// Convert a smithy timestamp
pub(crate) fn to_chrono(dt: &aws_sdk_ec2::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

/// Convert to a smithy timestamp (second precision)
pub(crate) fn to_smithy(dt: DateTime<Utc>) -> aws_sdk_ec2::primitives::DateTime {
    aws_sdk_ec2::primitives::DateTime::from_secs(dt.timestamp())
}
