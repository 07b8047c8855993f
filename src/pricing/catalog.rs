//! Price list product documents
//!
//! The AWS Price List API returns each product as a JSON string. The on-demand
//! USD price sits at `terms.OnDemand.<offer>.priceDimensions.<dim>.pricePerUnit.USD`,
//! encoded as a decimal string.

use serde_json::Value;
use tracing::debug;

/// Positive on-demand USD price of the first pricing tier.
///
/// Tiered products (S3 storage) carry one dimension per usage range; the one
/// starting at zero is preferred. Without such a dimension the first positive
/// price is taken.
pub fn extract_on_demand_usd(product: &Value) -> Option<f64> {
    let terms = product.get("terms")?.get("OnDemand")?.as_object()?;
    let mut fallback = None;
    for dimension in terms
        .values()
        .filter_map(|term| term.get("priceDimensions")?.as_object())
        .flat_map(|dimensions| dimensions.values())
    {
        let Some(price) = dimension_usd(dimension).filter(|price| *price > 0.0) else {
            continue;
        };
        match dimension.get("beginRange").and_then(Value::as_str) {
            None | Some("0") => return Some(price),
            Some(_) => {
                fallback.get_or_insert(price);
            }
        }
    }
    fallback
}

fn dimension_usd(dimension: &Value) -> Option<f64> {
    match dimension.get("pricePerUnit")?.get("USD")? {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Price from the first product that carries a positive on-demand price.
///
/// Documents that fail to parse are skipped.
pub fn first_price<'a>(documents: impl IntoIterator<Item = &'a str>) -> Option<f64> {
    documents.into_iter().find_map(|raw| match serde_json::from_str::<Value>(raw) {
        Ok(product) => extract_on_demand_usd(&product),
        Err(e) => {
            debug!("Skipping unparseable price list document: {}", e);
            None
        }
    })
}
