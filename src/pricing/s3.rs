//! S3 storage pricing

use super::{fallback_note, PriceEstimate, PriceKey, PriceKind, PricingResolver, TableRate};
use crate::provider::PriceFilter;
use crate::types::PriceSource;
use crate::utils::bytes_to_gib;

/// Fallback storage class for unknown classes
pub const S3_DEFAULT_CLASS: &str = "STANDARD";
const S3_DEFAULT_RATE: f64 = 0.023;

/// Canonical storage class name: upper-case with `_` separators
pub fn normalize_storage_class(storage_class: &str) -> String {
    storage_class.trim().to_uppercase().replace('-', "_")
}

/// Default storage price per GB-month (us-east-1, first tier)
pub fn s3_price_per_gb(storage_class: &str) -> Option<f64> {
    let rate = match storage_class {
        "STANDARD" | "INTELLIGENT_TIERING" => 0.023,
        "STANDARD_IA" => 0.0125,
        "ONEZONE_IA" => 0.01,
        "GLACIER_IR" => 0.004,
        "GLACIER" => 0.0036,
        "DEEP_ARCHIVE" => 0.00099,
        "REDUCED_REDUNDANCY" => 0.024,
        _ => return None,
    };
    Some(rate)
}

/// Price list `volumeType` for a storage class
fn catalog_volume_type(storage_class: &str) -> Option<&'static str> {
    let volume_type = match storage_class {
        "STANDARD" => "Standard",
        "INTELLIGENT_TIERING" => "Intelligent-Tiering Frequent Access",
        "STANDARD_IA" => "Standard - Infrequent Access",
        "ONEZONE_IA" => "One Zone - Infrequent Access",
        "GLACIER_IR" => "Glacier Instant Retrieval",
        "GLACIER" => "Amazon Glacier",
        "DEEP_ARCHIVE" => "Glacier Deep Archive",
        "REDUCED_REDUNDANCY" => "Reduced Redundancy",
        _ => return None,
    };
    Some(volume_type)
}

impl PricingResolver {
    /// Monthly storage cost of `size_bytes` in `storage_class`
    pub async fn s3_monthly_cost(
        &self,
        size_bytes: u64,
        storage_class: &str,
        region: &str,
        prefer_online: bool,
    ) -> PriceEstimate {
        let class = normalize_storage_class(storage_class);
        let size_gb = bytes_to_gib(size_bytes);

        if let Some(volume_type) = catalog_volume_type(&class) {
            let key = PriceKey::new(PriceKind::ObjectStorage, &[&class], region);
            let filters = vec![
                PriceFilter::term("productFamily", "Storage"),
                PriceFilter::term("volumeType", volume_type),
            ];
            if let Some(per_gb) = self
                .online_rate(prefer_online, key, "AmazonS3", &filters)
                .await
            {
                return PriceEstimate::new(size_gb * per_gb, PriceSource::Catalog);
            }
        }

        let table = TableRate::lookup(s3_price_per_gb, &class, S3_DEFAULT_CLASS, S3_DEFAULT_RATE);
        let estimate = PriceEstimate::new(size_gb * table.rate, table.source());
        if table.fell_back {
            estimate.with_note(fallback_note(PriceKind::ObjectStorage, storage_class, S3_DEFAULT_CLASS))
        } else {
            estimate
        }
    }
}
