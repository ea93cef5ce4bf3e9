//! Whole-catalog views: a per-type price table and flat location listings.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::pricing::aliases::{effective_type_name, UMBRELLA_ALIASES};
use crate::types::catalog::Catalog;
use crate::types::query::PriceUnit;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VolumePriceTable {
    /// GB-month price per effective type name.
    pub prices: BTreeMap<String, Decimal>,
    /// API names found under an umbrella category.
    pub umbrella_variants: BTreeSet<String>,
}

pub fn volume_price_table(catalog: &Catalog, region: &str, product_family: &str) -> VolumePriceTable {
    let mut table = VolumePriceTable::default();

    for product in catalog.products() {
        if !product.is_family(product_family) {
            continue;
        }
        if product.region_code().is_some_and(|code| code != region) {
            continue;
        }
        let Some(name) = effective_type_name(product) else {
            continue;
        };

        let is_umbrella = product
            .volume_type()
            .is_some_and(|category| UMBRELLA_ALIASES.iter().any(|(u, _)| *u == category));
        if is_umbrella {
            table.umbrella_variants.insert(name.to_string());
        }

        if table.prices.contains_key(name) {
            continue;
        }

        let price = catalog
            .on_demand_terms(&product.sku)
            .flat_map(|term| term.price_dimensions.values())
            .filter(|dimension| dimension.has_unit(PriceUnit::GbMonth.as_str()))
            .find_map(|dimension| dimension.usd());

        if let Some(price) = price {
            table.prices.insert(name.to_string(), price);
        }
    }

    table
}

/// Flat view of one priced product, printed by `listings` and persisted
/// through a [`ListingSink`](crate::pricing::store::ListingSink).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceListing {
    pub sku: String,
    pub location: Option<String>,
    pub volume_api_name: Option<String>,
    pub storage_media: Option<String>,
    pub unit: Option<String>,
    pub price_usd: Option<Decimal>,
}

/// One listing per product whose location contains `location_contains`
/// (all products when `None`), priced from its first on-demand dimension.
pub fn listings(catalog: &Catalog, location_contains: Option<&str>) -> Vec<PriceListing> {
    catalog
        .products()
        .filter(|product| match location_contains {
            Some(needle) => product.location().is_some_and(|l| l.contains(needle)),
            None => true,
        })
        .map(|product| {
            let dimension = catalog
                .on_demand_terms(&product.sku)
                .flat_map(|term| term.price_dimensions.values())
                .next();

            PriceListing {
                sku: product.sku.clone(),
                location: product.location().map(str::to_string),
                volume_api_name: product.volume_api_name().map(str::to_string),
                storage_media: product.storage_media().map(str::to_string),
                unit: dimension.and_then(|d| d.unit.clone()),
                price_usd: dimension.and_then(|d| d.usd()),
            }
        })
        .collect()
}
