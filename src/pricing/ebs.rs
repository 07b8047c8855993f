//! EBS volume pricing
//!
//! Storage is priced per GB-month. Provisioned IOPS are billed in full on
//! io1/io2; gp3 includes 3000 IOPS and 125 MB/s and bills only the excess.

use super::{fallback_note, PriceEstimate, PriceKey, PriceKind, PricingResolver, TableRate};
use crate::provider::PriceFilter;
use crate::types::PriceSource;

/// Fallback volume type for unknown types
pub const EBS_DEFAULT_TYPE: &str = "gp2";
const EBS_DEFAULT_RATE: f64 = 0.10;

const PIOPS_PRICE: f64 = 0.065;
const GP3_IOPS_PRICE: f64 = 0.005;
const GP3_INCLUDED_IOPS: i32 = 3000;
const GP3_THROUGHPUT_PRICE: f64 = 0.06;
const GP3_INCLUDED_THROUGHPUT: i32 = 125;

/// Default storage price per GB-month (us-east-1)
pub fn ebs_price_per_gb(volume_type: &str) -> Option<f64> {
    let rate = match volume_type {
        "standard" => 0.05,
        "gp2" => 0.10,
        "gp3" => 0.08,
        "io1" | "io2" => 0.125,
        "sc1" => 0.015,
        "st1" => 0.045,
        _ => return None,
    };
    Some(rate)
}

/// Monthly cost of provisioned IOPS and throughput beyond storage
pub fn provisioned_performance_cost(
    volume_type: &str,
    iops: Option<i32>,
    throughput_mbps: Option<i32>,
) -> f64 {
    let iops = iops.unwrap_or(0).max(0);
    let throughput = throughput_mbps.unwrap_or(0).max(0);
    match volume_type {
        "io1" | "io2" => f64::from(iops) * PIOPS_PRICE,
        "gp3" => {
            let extra_iops = (iops - GP3_INCLUDED_IOPS).max(0);
            let extra_throughput = (throughput - GP3_INCLUDED_THROUGHPUT).max(0);
            f64::from(extra_iops) * GP3_IOPS_PRICE + f64::from(extra_throughput) * GP3_THROUGHPUT_PRICE
        }
        _ => 0.0,
    }
}

impl PricingResolver {
    /// Monthly cost of a volume: storage plus provisioned performance
    pub async fn ebs_monthly_cost(
        &self,
        volume_type: &str,
        size_gb: i32,
        iops: Option<i32>,
        throughput_mbps: Option<i32>,
        region: &str,
        prefer_online: bool,
    ) -> PriceEstimate {
        let volume_type = volume_type.to_lowercase();
        let size = f64::from(size_gb.max(0));
        let performance = provisioned_performance_cost(&volume_type, iops, throughput_mbps);

        let key = PriceKey::new(PriceKind::BlockStorage, &[&volume_type], region);
        let filters = vec![
            PriceFilter::term("productFamily", "Storage"),
            PriceFilter::term("volumeApiName", volume_type.as_str()),
        ];
        if let Some(per_gb) = self
            .online_rate(prefer_online, key, "AmazonEC2", &filters)
            .await
        {
            return PriceEstimate::new(size * per_gb + performance, PriceSource::Catalog);
        }

        let table = TableRate::lookup(ebs_price_per_gb, &volume_type, EBS_DEFAULT_TYPE, EBS_DEFAULT_RATE);
        let estimate = PriceEstimate::new(size * table.rate + performance, table.source());
        if table.fell_back {
            estimate.with_note(fallback_note(PriceKind::BlockStorage, &volume_type, EBS_DEFAULT_TYPE))
        } else {
            estimate
        }
    }
}
