//! CloudWatch metric statistics

use super::{sdk_error, to_chrono, to_smithy};
use crate::error::Result;
use crate::provider::{MetricQuery, MetricsProvider, Sample, Statistic};
use crate::retry::{ExponentialBackoffPolicy, RetryPolicy};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudwatch::config::Region;
use aws_sdk_cloudwatch::types::{Datapoint, Dimension, Statistic as CwStatistic};
use tracing::debug;

/// Metrics backed by `GetMetricStatistics`.
///
/// Queries that name a region (S3 buckets) are sent to that region; all
/// others go to `default_region`.
#[derive(Clone)]
pub struct CloudWatchMetrics {
    sdk_config: SdkConfig,
    default_region: String,
    retry: ExponentialBackoffPolicy,
}

impl CloudWatchMetrics {
    pub fn new(sdk_config: SdkConfig, default_region: &str, retry: ExponentialBackoffPolicy) -> Self {
        Self {
            sdk_config,
            default_region: default_region.to_string(),
            retry,
        }
    }

    fn client(&self, region: &str) -> aws_sdk_cloudwatch::Client {
        let conf = aws_sdk_cloudwatch::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_cloudwatch::Client::from_conf(conf)
    }
}

fn datapoint_value(datapoint: &Datapoint, statistic: Statistic) -> Option<f64> {
    match statistic {
        Statistic::Average => datapoint.average(),
        Statistic::Sum => datapoint.sum(),
    }
}

#[async_trait]
impl MetricsProvider for CloudWatchMetrics {
    async fn get_samples(&self, query: &MetricQuery) -> Result<Vec<Sample>> {
        let region = query.region.as_deref().unwrap_or(&self.default_region);
        let client = self.client(region);
        let dimensions: Vec<Dimension> = query
            .dimensions
            .iter()
            .map(|d| Dimension::builder().name(&d.name).value(&d.value).build())
            .collect();
        let statistic = match query.statistic {
            Statistic::Average => CwStatistic::Average,
            Statistic::Sum => CwStatistic::Sum,
        };

        let response = self
            .retry
            .execute_with_retry(|| {
                let client = &client;
                let dimensions = dimensions.clone();
                let statistic = statistic.clone();
                async move {
                    client
                        .get_metric_statistics()
                        .namespace(&query.namespace)
                        .metric_name(&query.metric_name)
                        .set_dimensions(Some(dimensions))
                        .start_time(to_smithy(query.window.start))
                        .end_time(to_smithy(query.window.end))
                        .period(query.period_secs)
                        .statistics(statistic)
                        .send()
                        .await
                        .map_err(|e| sdk_error("cloudwatch:GetMetricStatistics", e))
                }
            })
            .await?;

        let mut samples: Vec<Sample> = response
            .datapoints()
            .iter()
            .filter_map(|dp| {
                let timestamp = dp.timestamp().and_then(to_chrono)?;
                let value = datapoint_value(dp, query.statistic)?;
                Some(Sample::new(timestamp, value))
            })
            .collect();
        samples.sort_by_key(|s| s.timestamp);

        debug!(
            "{}/{} in {}: {} datapoints",
            query.namespace,
            query.metric_name,
            region,
            samples.len()
        );
        Ok(samples)
    }
}
