//! EC2 on-demand compute pricing

use super::{fallback_note, PriceEstimate, PriceKey, PriceKind, PricingResolver, TableRate};
use crate::provider::PriceFilter;
use crate::types::PriceSource;
use crate::utils::HOURS_PER_MONTH;

/// Fallback instance type for unknown types
pub const EC2_DEFAULT_TYPE: &str = "t3.medium";
const EC2_DEFAULT_RATE: f64 = 0.0416;

/// Default on-demand hourly rate (Linux, us-east-1)
pub fn ec2_hourly_rate(instance_type: &str) -> Option<f64> {
    let rate = match instance_type {
        // Burstable
        "t2.nano" => 0.0058,
        "t2.micro" => 0.0116,
        "t2.small" => 0.023,
        "t2.medium" => 0.0464,
        "t2.large" => 0.0928,
        "t2.xlarge" => 0.1856,
        "t2.2xlarge" => 0.3712,
        "t3.nano" => 0.0052,
        "t3.micro" => 0.0104,
        "t3.small" => 0.0208,
        "t3.medium" => 0.0416,
        "t3.large" => 0.0832,
        "t3.xlarge" => 0.1664,
        "t3.2xlarge" => 0.3328,
        "t3a.nano" => 0.0047,
        "t3a.micro" => 0.0094,
        "t3a.small" => 0.0188,
        "t3a.medium" => 0.0376,
        "t3a.large" => 0.0752,
        "t3a.xlarge" => 0.1504,
        "t3a.2xlarge" => 0.3008,
        // General purpose
        "m5.large" | "m6i.large" => 0.096,
        "m5.xlarge" | "m6i.xlarge" => 0.192,
        "m5.2xlarge" | "m6i.2xlarge" => 0.384,
        "m5.4xlarge" | "m6i.4xlarge" => 0.768,
        "m5.8xlarge" | "m6i.8xlarge" => 1.536,
        "m5.12xlarge" | "m6i.12xlarge" => 2.304,
        "m5.16xlarge" | "m6i.16xlarge" => 3.072,
        "m5.24xlarge" | "m6i.24xlarge" => 4.608,
        "m7i.large" => 0.1008,
        "m7i.xlarge" => 0.2016,
        "m7i.2xlarge" => 0.4032,
        "m7i.4xlarge" => 0.8064,
        // Compute optimized
        "c5.large" | "c6i.large" => 0.085,
        "c5.xlarge" | "c6i.xlarge" => 0.17,
        "c5.2xlarge" | "c6i.2xlarge" => 0.34,
        "c5.4xlarge" | "c6i.4xlarge" => 0.68,
        "c5.9xlarge" => 1.53,
        "c5.12xlarge" | "c6i.12xlarge" => 2.04,
        "c5.18xlarge" => 3.06,
        "c5.24xlarge" | "c6i.24xlarge" => 4.08,
        "c6i.8xlarge" => 1.36,
        "c6i.16xlarge" => 2.72,
        // Memory optimized
        "r5.large" | "r6i.large" => 0.126,
        "r5.xlarge" | "r6i.xlarge" => 0.252,
        "r5.2xlarge" | "r6i.2xlarge" => 0.504,
        "r5.4xlarge" | "r6i.4xlarge" => 1.008,
        "r5.8xlarge" | "r6i.8xlarge" => 2.016,
        "r5.12xlarge" | "r6i.12xlarge" => 3.024,
        "r5.16xlarge" | "r6i.16xlarge" => 4.032,
        "r5.24xlarge" | "r6i.24xlarge" => 6.048,
        // Storage optimized
        "i3.large" => 0.156,
        "i3.xlarge" => 0.312,
        "i3.2xlarge" => 0.624,
        "i3.4xlarge" => 1.248,
        "i3.8xlarge" => 2.496,
        "i3.16xlarge" => 4.992,
        // Graviton
        "t4g.nano" => 0.0042,
        "t4g.micro" => 0.0084,
        "t4g.small" => 0.0168,
        "t4g.medium" => 0.0336,
        "t4g.large" => 0.0672,
        "t4g.xlarge" => 0.1344,
        "t4g.2xlarge" => 0.2688,
        "m6g.large" => 0.077,
        "m6g.xlarge" => 0.154,
        "m6g.2xlarge" => 0.308,
        "m6g.4xlarge" => 0.616,
        "m7g.large" => 0.0816,
        "m7g.xlarge" => 0.1632,
        "m7g.2xlarge" => 0.3264,
        "c6g.large" => 0.068,
        "c6g.xlarge" => 0.136,
        "c6g.2xlarge" => 0.272,
        "c7g.large" => 0.0725,
        "c7g.xlarge" => 0.145,
        "c7g.2xlarge" => 0.29,
        "r6g.large" => 0.1008,
        "r6g.xlarge" => 0.2016,
        "r6g.2xlarge" => 0.4032,
        "r7g.large" => 0.1071,
        "r7g.xlarge" => 0.2142,
        "r7g.2xlarge" => 0.4284,
        _ => return None,
    };
    Some(rate)
}

fn catalog_filters(instance_type: &str, operating_system: &str) -> Vec<PriceFilter> {
    vec![
        PriceFilter::term("instanceType", instance_type),
        PriceFilter::term("operatingSystem", operating_system),
        PriceFilter::term("tenancy", "Shared"),
        PriceFilter::term("capacitystatus", "Used"),
        PriceFilter::term("preInstalledSw", "NA"),
    ]
}

impl PricingResolver {
    /// Monthly cost of an instance running 730 hours
    pub async fn ec2_monthly_cost(
        &self,
        instance_type: &str,
        operating_system: &str,
        region: &str,
        prefer_online: bool,
    ) -> PriceEstimate {
        let key = PriceKey::new(PriceKind::Compute, &[instance_type, operating_system], region);
        let filters = catalog_filters(instance_type, operating_system);
        if let Some(hourly) = self
            .online_rate(prefer_online, key, "AmazonEC2", &filters)
            .await
        {
            return PriceEstimate::new(hourly * HOURS_PER_MONTH, PriceSource::Catalog);
        }

        let table = TableRate::lookup(ec2_hourly_rate, instance_type, EC2_DEFAULT_TYPE, EC2_DEFAULT_RATE);
        let estimate = PriceEstimate::new(table.rate * HOURS_PER_MONTH, table.source());
        if table.fell_back {
            estimate.with_note(fallback_note(PriceKind::Compute, instance_type, EC2_DEFAULT_TYPE))
        } else {
            estimate
        }
    }
}
