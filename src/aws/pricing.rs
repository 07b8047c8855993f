//! AWS Price List API lookups

use super::sdk_error;
use crate::error::{Result, SentinelError};
use crate::pricing::catalog::first_price;
use crate::provider::{PriceFilter, PricingCatalog};
use crate::retry::{ExponentialBackoffPolicy, RetryPolicy};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_pricing::config::Region;
use aws_sdk_pricing::types::{Filter, FilterType};
use tracing::debug;

/// The Price List API is only served from a few regions
const PRICING_API_REGION: &str = "us-east-1";
const MAX_RESULTS: i32 = 10;

pub struct AwsPriceCatalog {
    client: aws_sdk_pricing::Client,
    retry: ExponentialBackoffPolicy,
}

impl AwsPriceCatalog {
    pub fn new(sdk_config: &SdkConfig, retry: ExponentialBackoffPolicy) -> Self {
        let conf = aws_sdk_pricing::config::Builder::from(sdk_config)
            .region(Region::new(PRICING_API_REGION))
            .build();
        Self {
            client: aws_sdk_pricing::Client::from_conf(conf),
            retry,
        }
    }
}

fn term_match(field: &str, value: &str) -> Result<Filter> {
    Filter::builder()
        .r#type(FilterType::TermMatch)
        .field(field)
        .value(value)
        .build()
        .map_err(|e| SentinelError::Aws(format!("invalid price filter {}: {}", field, e)))
}

#[async_trait]
impl PricingCatalog for AwsPriceCatalog {
    async fn lookup_price(
        &self,
        service_code: &str,
        filters: &[PriceFilter],
        region: &str,
    ) -> Result<Option<f64>> {
        let mut sdk_filters = filters
            .iter()
            .map(|f| term_match(&f.field, &f.value))
            .collect::<Result<Vec<_>>>()?;
        sdk_filters.push(term_match("regionCode", region)?);

        let response = self
            .retry
            .execute_with_retry(|| {
                let filters = sdk_filters.clone();
                async move {
                    self.client
                        .get_products()
                        .service_code(service_code)
                        .set_filters(Some(filters))
                        .max_results(MAX_RESULTS)
                        .send()
                        .await
                        .map_err(|e| sdk_error("pricing:GetProducts", e))
                }
            })
            .await?;

        let price = first_price(response.price_list().iter().map(String::as_str));
        debug!(
            "Price list {} in {} ({} filters): {:?}",
            service_code,
            region,
            filters.len(),
            price
        );
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_match_filter() {
        let filter = term_match("instanceType", "t3.micro").unwrap();
        assert_eq!(filter.field(), "instanceType");
        assert_eq!(filter.value(), "t3.micro");
        assert_eq!(filter.r#type(), &FilterType::TermMatch);
    }
}
