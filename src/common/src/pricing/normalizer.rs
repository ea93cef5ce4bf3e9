use rust_decimal::Decimal;

use crate::pricing::aliases::{effective_type_name, PROVISIONED_IOPS_LITERALS};
use crate::types::catalog::{Catalog, Product};
use crate::types::query::PriceQuery;

/// Unit price of `resource_type` in `region`, or `None` when the catalog has
/// no matching product or no dimension in the expected unit.
pub fn lookup(catalog: &Catalog, resource_type: &str, region: &str) -> Option<Decimal> {
    lookup_query(catalog, &PriceQuery::new(region, resource_type))
}

pub fn lookup_query(catalog: &Catalog, query: &PriceQuery) -> Option<Decimal> {
    let unit = query.expected_unit();

    let price = catalog
        .products()
        .filter(|product| matches_query(product, query))
        .find_map(|product| {
            catalog
                .on_demand_terms(&product.sku)
                .flat_map(|term| term.price_dimensions.values())
                .filter(|dimension| dimension.has_unit(unit.as_str()))
                .find_map(|dimension| dimension.usd())
        });

    match price {
        Some(price) => tracing::debug!(
            resource_type = %query.resource_type,
            region = %query.region,
            %unit,
            %price,
            "Resolved unit price"
        ),
        None => tracing::debug!(
            resource_type = %query.resource_type,
            region = %query.region,
            %unit,
            "No unit price in catalog"
        ),
    }

    price
}

/// Whether a product is priced under the requested resource type and region.
pub fn matches_query(product: &Product, query: &PriceQuery) -> bool {
    if product
        .region_code()
        .is_some_and(|code| code != query.region)
    {
        return false;
    }

    let Some(name) = effective_type_name(product) else {
        return false;
    };

    if query.is_provisioned_iops() {
        let accepted = |label: &str| PROVISIONED_IOPS_LITERALS.contains(&label);
        return accepted(name) || product.volume_type().is_some_and(accepted);
    }

    name == query.resource_type
}
