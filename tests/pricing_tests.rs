//! Pricing resolver tests with a mocked price catalog

use async_trait::async_trait;
use cost_sentinel::error::{Result, SentinelError};
use cost_sentinel::pricing::PricingResolver;
use cost_sentinel::provider::{PriceFilter, PricingCatalog};
use cost_sentinel::types::PriceSource;
use mockall::{mock, Sequence};
use std::sync::Arc;

mock! {
    pub Catalog {}

    #[async_trait]
    impl PricingCatalog for Catalog {
        async fn lookup_price(
            &self,
            service_code: &str,
            filters: &[PriceFilter],
            region: &str,
        ) -> Result<Option<f64>>;
    }
}

fn has_filter(filters: &[PriceFilter], field: &str, value: &str) -> bool {
    filters.contains(&PriceFilter::term(field, value))
}

#[tokio::test]
async fn test_catalog_price_is_cached_per_key() {
    let mut catalog = MockCatalog::new();
    catalog
        .expect_lookup_price()
        .withf(|service, filters, region| {
            service == "AmazonEC2"
                && region == "us-east-1"
                && has_filter(filters, "instanceType", "m5.large")
                && has_filter(filters, "operatingSystem", "Linux")
        })
        .times(1)
        .returning(|_, _, _| Ok(Some(0.1)));
    let resolver = PricingResolver::new(Arc::new(catalog));

    let first = resolver.ec2_monthly_cost("m5.large", "Linux", "us-east-1", true).await;
    let second = resolver.ec2_monthly_cost("m5.large", "Linux", "us-east-1", true).await;

    assert_eq!(first.monthly_cost, 73.0);
    assert_eq!(first.source, PriceSource::Catalog);
    assert_eq!(second, first);
    assert_eq!(resolver.cached_prices().await, 1);
}

#[tokio::test]
async fn test_zero_catalog_price_falls_back_and_is_not_cached() {
    let mut catalog = MockCatalog::new();
    catalog
        .expect_lookup_price()
        .times(2)
        .returning(|_, _, _| Ok(Some(0.0)));
    let resolver = PricingResolver::new(Arc::new(catalog));

    for _ in 0..2 {
        let estimate = resolver.ec2_monthly_cost("t3.micro", "Linux", "us-east-1", true).await;
        assert_eq!(estimate.monthly_cost, 7.59);
        assert_eq!(estimate.source, PriceSource::DefaultTable);
    }
    assert_eq!(resolver.cached_prices().await, 0);
}

#[tokio::test]
async fn test_catalog_error_falls_back_to_table() {
    let mut catalog = MockCatalog::new();
    catalog
        .expect_lookup_price()
        .returning(|_, _, _| Err(SentinelError::Aws("AccessDeniedException".to_string())));
    let resolver = PricingResolver::new(Arc::new(catalog));

    let estimate = resolver
        .ebs_monthly_cost("gp3", 100, Some(3000), Some(500), "us-east-1", true)
        .await;
    // 100 * 0.08 + (500 - 125) * 0.06
    assert_eq!(estimate.monthly_cost, 30.5);
    assert_eq!(estimate.source, PriceSource::DefaultTable);
}

#[tokio::test]
async fn test_offline_preference_skips_catalog() {
    let mut catalog = MockCatalog::new();
    catalog.expect_lookup_price().times(0);
    let resolver = PricingResolver::new(Arc::new(catalog));

    let estimate = resolver
        .s3_monthly_cost(100 * 1024 * 1024 * 1024, "STANDARD", "us-east-1", false)
        .await;
    assert_eq!(estimate.monthly_cost, 2.3);
    assert_eq!(estimate.source, PriceSource::DefaultTable);
}

#[tokio::test]
async fn test_multi_az_catalog_price_used_as_is() {
    let mut catalog = MockCatalog::new();
    catalog
        .expect_lookup_price()
        .withf(|service, filters, _| {
            service == "AmazonRDS"
                && has_filter(filters, "deploymentOption", "Multi-AZ")
                && has_filter(filters, "databaseEngine", "PostgreSQL")
        })
        .times(1)
        .returning(|_, _, _| Ok(Some(0.034)));
    let resolver = PricingResolver::new(Arc::new(catalog));

    let estimate = resolver
        .rds_monthly_cost("db.t3.micro", "postgres", true, 20, "gp2", "us-east-1", true)
        .await;
    // 0.034 * 730 + 20 * 0.115 * 2
    assert_eq!(estimate.monthly_cost, 29.42);
    assert_eq!(estimate.source, PriceSource::Catalog);
}

#[tokio::test]
async fn test_distinct_keys_are_looked_up_in_order() {
    let mut seq = Sequence::new();
    let mut catalog = MockCatalog::new();
    catalog
        .expect_lookup_price()
        .withf(|_, filters, _| has_filter(filters, "volumeApiName", "gp3"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Ok(Some(0.08)));
    catalog
        .expect_lookup_price()
        .withf(|_, filters, _| has_filter(filters, "volumeApiName", "gp2"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Ok(Some(0.1)));
    let resolver = PricingResolver::new(Arc::new(catalog));

    let gp3 = resolver.ebs_monthly_cost("GP3", 10, None, None, "us-east-1", true).await;
    let gp2 = resolver.ebs_monthly_cost("gp2", 10, None, None, "us-east-1", true).await;

    assert_eq!(gp3.monthly_cost, 0.8);
    assert_eq!(gp2.monthly_cost, 1.0);
    assert_eq!(resolver.cached_prices().await, 2);
}

#[tokio::test]
async fn test_unknown_attribute_uses_default_key_with_note() {
    let resolver = PricingResolver::offline();
    let estimate = resolver
        .ebs_monthly_cost("mystery", 50, None, None, "us-east-1", true)
        .await;
    assert_eq!(estimate.monthly_cost, 5.0);
    assert_eq!(estimate.source, PriceSource::DefaultFallback);
    assert!(estimate.note.unwrap().contains("gp2"));
}
