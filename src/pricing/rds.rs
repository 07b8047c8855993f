//! RDS instance, storage and snapshot pricing
//!
//! Default hourly rates are Single-AZ PostgreSQL prices; a Multi-AZ deployment
//! doubles them. The catalog is queried with the matching deployment option
//! instead, so catalog rates are used as-is. Allocated storage doubles for
//! Multi-AZ either way.

use super::{fallback_note, PriceEstimate, PriceKey, PriceKind, PricingResolver, TableRate};
use crate::provider::PriceFilter;
use crate::types::PriceSource;
use crate::utils::HOURS_PER_MONTH;

/// Fallback instance class for unknown classes
pub const RDS_DEFAULT_CLASS: &str = "db.t4g.medium";
const RDS_DEFAULT_RATE: f64 = 0.065;
const RDS_DEFAULT_STORAGE_RATE: f64 = 0.115;

/// Manual snapshot storage per GB-month
pub const SNAPSHOT_PRICE_PER_GB: f64 = 0.095;

/// Default Single-AZ hourly rate (PostgreSQL, us-east-1)
pub fn rds_hourly_rate(instance_class: &str) -> Option<f64> {
    let rate = match instance_class {
        "db.t4g.micro" => 0.016,
        "db.t4g.small" => 0.032,
        "db.t4g.medium" => 0.065,
        "db.t4g.large" => 0.129,
        "db.t4g.xlarge" => 0.258,
        "db.t4g.2xlarge" => 0.516,
        "db.t3.micro" => 0.017,
        "db.t3.small" => 0.034,
        "db.t3.medium" => 0.068,
        "db.t3.large" => 0.136,
        "db.t3.xlarge" => 0.272,
        "db.t3.2xlarge" => 0.544,
        "db.m6g.large" => 0.154,
        "db.m6g.xlarge" => 0.308,
        "db.m6g.2xlarge" => 0.616,
        "db.m6g.4xlarge" => 1.232,
        "db.m6g.8xlarge" => 2.464,
        "db.m6g.12xlarge" => 3.696,
        "db.m6g.16xlarge" => 4.928,
        "db.m5.large" | "db.m6i.large" => 0.171,
        "db.m5.xlarge" | "db.m6i.xlarge" => 0.342,
        "db.m5.2xlarge" | "db.m6i.2xlarge" => 0.684,
        "db.m5.4xlarge" | "db.m6i.4xlarge" => 1.368,
        "db.m5.8xlarge" | "db.m6i.8xlarge" => 2.736,
        "db.m5.12xlarge" | "db.m6i.12xlarge" => 4.104,
        "db.m5.16xlarge" | "db.m6i.16xlarge" => 5.472,
        "db.m5.24xlarge" | "db.m6i.24xlarge" => 8.208,
        "db.m7g.large" => 0.168,
        "db.m7g.xlarge" => 0.336,
        "db.m7g.2xlarge" => 0.672,
        "db.m7g.4xlarge" => 1.344,
        "db.m7g.8xlarge" => 2.688,
        "db.m7g.12xlarge" => 4.032,
        "db.m7g.16xlarge" => 5.376,
        "db.r6g.large" => 0.216,
        "db.r6g.xlarge" => 0.432,
        "db.r6g.2xlarge" => 0.864,
        "db.r6g.4xlarge" => 1.728,
        "db.r6g.8xlarge" => 3.456,
        "db.r6g.12xlarge" => 5.184,
        "db.r6g.16xlarge" => 6.912,
        "db.r5.large" | "db.r6i.large" => 0.24,
        "db.r5.xlarge" | "db.r6i.xlarge" => 0.48,
        "db.r5.2xlarge" | "db.r6i.2xlarge" => 0.96,
        "db.r5.4xlarge" | "db.r6i.4xlarge" => 1.92,
        "db.r5.8xlarge" | "db.r6i.8xlarge" => 3.84,
        "db.r5.12xlarge" | "db.r6i.12xlarge" => 5.76,
        "db.r5.16xlarge" | "db.r6i.16xlarge" => 7.68,
        "db.r5.24xlarge" | "db.r6i.24xlarge" => 11.52,
        "db.r7g.large" => 0.2352,
        "db.r7g.xlarge" => 0.4704,
        "db.r7g.2xlarge" => 0.9408,
        "db.r7g.4xlarge" => 1.8816,
        "db.r7g.8xlarge" => 3.7632,
        "db.r7g.12xlarge" => 5.6448,
        "db.r7g.16xlarge" => 7.5264,
        _ => return None,
    };
    Some(rate)
}

/// Allocated storage price per GB-month; unknown types are priced as gp2
pub fn rds_storage_price_per_gb(storage_type: &str) -> f64 {
    match storage_type.to_lowercase().as_str() {
        "gp2" => 0.115,
        "gp3" => 0.08,
        "io1" | "io2" => 0.125,
        "standard" => 0.10,
        _ => RDS_DEFAULT_STORAGE_RATE,
    }
}

/// Price list `databaseEngine` value for an RDS engine name
pub fn catalog_engine(engine: &str) -> &'static str {
    match engine.to_lowercase().as_str() {
        "mysql" => "MySQL",
        "mariadb" => "MariaDB",
        "aurora-postgresql" => "Aurora PostgreSQL",
        "aurora-mysql" | "aurora" => "Aurora MySQL",
        e if e.starts_with("oracle") => "Oracle",
        e if e.starts_with("sqlserver") => "SQL Server",
        _ => "PostgreSQL",
    }
}

fn deployment_option(multi_az: bool) -> &'static str {
    if multi_az {
        "Multi-AZ"
    } else {
        "Single-AZ"
    }
}

impl PricingResolver {
    /// Monthly cost of a database instance: compute hours plus allocated
    /// storage
    #[allow(clippy::too_many_arguments)]
    pub async fn rds_monthly_cost(
        &self,
        instance_class: &str,
        engine: &str,
        multi_az: bool,
        allocated_storage_gb: i32,
        storage_type: &str,
        region: &str,
        prefer_online: bool,
    ) -> PriceEstimate {
        let az_factor = if multi_az { 2.0 } else { 1.0 };
        let storage = f64::from(allocated_storage_gb.max(0))
            * rds_storage_price_per_gb(storage_type)
            * az_factor;

        let engine = catalog_engine(engine);
        let deployment = deployment_option(multi_az);
        let key = PriceKey::new(PriceKind::Database, &[instance_class, engine, deployment], region);
        let filters = vec![
            PriceFilter::term("instanceType", instance_class),
            PriceFilter::term("databaseEngine", engine),
            PriceFilter::term("deploymentOption", deployment),
        ];
        if let Some(hourly) = self
            .online_rate(prefer_online, key, "AmazonRDS", &filters)
            .await
        {
            return PriceEstimate::new(hourly * HOURS_PER_MONTH + storage, PriceSource::Catalog);
        }

        let table = TableRate::lookup(rds_hourly_rate, instance_class, RDS_DEFAULT_CLASS, RDS_DEFAULT_RATE);
        let compute = table.rate * az_factor * HOURS_PER_MONTH;
        let estimate = PriceEstimate::new(compute + storage, table.source());
        if table.fell_back {
            estimate.with_note(fallback_note(PriceKind::Database, instance_class, RDS_DEFAULT_CLASS))
        } else {
            estimate
        }
    }

    /// Monthly storage cost of a manual snapshot
    pub fn snapshot_monthly_cost(&self, allocated_storage_gb: i32) -> PriceEstimate {
        PriceEstimate::new(
            f64::from(allocated_storage_gb.max(0)) * SNAPSHOT_PRICE_PER_GB,
            PriceSource::DefaultTable,
        )
    }
}
