use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::constants::USD;

/// Pricing catalog for one service, either a full regional offer document or
/// a set of query results merged together.
///
/// Products and terms are kept ordered by SKU so that "first match" is stable
/// between calls and between parses of the same document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct Catalog {
    products: BTreeMap<String, Product>,
    on_demand: BTreeMap<String, BTreeMap<String, OfferTerm>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub sku: String,

    #[serde(rename = "productFamily", default)]
    pub product_family: Option<String>,

    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Product {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Human readable category, e.g. "General Purpose" or "Cold HDD".
    pub fn volume_type(&self) -> Option<&str> {
        self.attribute("volumeType")
    }

    pub fn volume_api_name(&self) -> Option<&str> {
        self.attribute("volumeApiName")
    }

    pub fn region_code(&self) -> Option<&str> {
        self.attribute("regionCode")
    }

    pub fn location(&self) -> Option<&str> {
        self.attribute("location")
    }

    pub fn storage_media(&self) -> Option<&str> {
        self.attribute("storageMedia")
    }

    pub fn is_family(&self, family: &str) -> bool {
        self.product_family.as_deref() == Some(family)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OfferTerm {
    #[serde(default)]
    pub sku: Option<String>,

    #[serde(rename = "priceDimensions", default)]
    pub price_dimensions: BTreeMap<String, PriceDimension>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PriceDimension {
    #[serde(default)]
    pub unit: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "pricePerUnit", default)]
    pub price_per_unit: BTreeMap<String, String>,
}

impl PriceDimension {
    pub fn has_unit(&self, unit: &str) -> bool {
        self.unit.as_deref() == Some(unit)
    }

    /// USD rate of this dimension. Unparsable amounts count as absent.
    pub fn usd(&self) -> Option<Decimal> {
        self.price_per_unit
            .get(USD)
            .and_then(|amount| Decimal::from_str(amount.trim()).ok())
            .map(|amount| amount.normalize())
    }
}

/// One product document as returned by the pricing query service.
///
/// Unlike the offer file, its `terms.OnDemand` is keyed by term code directly.
#[derive(Debug, serde_query::DeserializeQuery)]
pub struct PriceListEntry {
    #[query(".product")]
    pub product: Product,

    #[query(".terms.OnDemand")]
    pub on_demand: BTreeMap<String, OfferTerm>,
}

impl PriceListEntry {
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<serde_query::Query<PriceListEntry>>(raw).map(Into::into)
    }
}

impl Catalog {
    pub fn from_json_slice(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn from_price_list<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = PriceListEntry>,
    {
        let mut catalog = Self::default();
        for entry in entries {
            catalog.insert_entry(entry);
        }
        catalog
    }

    pub fn insert_entry(&mut self, entry: PriceListEntry) {
        let PriceListEntry {
            product,
            on_demand,
        } = entry;

        if product.sku.is_empty() {
            tracing::debug!("Skipping price list entry without a SKU");
            return;
        }

        self.on_demand
            .entry(product.sku.clone())
            .or_default()
            .extend(on_demand);
        self.products.insert(product.sku.clone(), product);
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    pub fn product(&self, sku: &str) -> Option<&Product> {
        self.products.get(sku)
    }

    /// On-demand terms for a SKU; empty when the SKU has none.
    pub fn on_demand_terms(&self, sku: &str) -> impl Iterator<Item = &OfferTerm> {
        self.on_demand.get(sku).into_iter().flat_map(|t| t.values())
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[derive(Deserialize)]
struct RawCatalog {
    #[serde(default)]
    products: BTreeMap<String, Value>,

    #[serde(default)]
    terms: RawTerms,
}

#[derive(Default, Deserialize)]
struct RawTerms {
    #[serde(rename = "OnDemand", default)]
    on_demand: BTreeMap<String, Value>,
}

// A catalog document is always a JSON object; arrays and scalars would
// otherwise slip through as an empty catalog.
impl TryFrom<Value> for Catalog {
    type Error = serde_json::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        if !value.is_object() {
            return Err(serde::de::Error::custom("expected a pricing catalog object"));
        }
        serde_json::from_value::<RawCatalog>(value).map(Catalog::from)
    }
}

// Entries are parsed one by one so that a single malformed product or term
// only drops that entry.
impl From<RawCatalog> for Catalog {
    fn from(raw: RawCatalog) -> Self {
        let mut catalog = Catalog::default();

        for (key, value) in raw.products {
            match serde_json::from_value::<Product>(value) {
                Ok(mut product) => {
                    if product.sku.is_empty() {
                        product.sku = key.clone();
                    }
                    catalog.products.insert(key, product);
                }
                Err(err) => {
                    tracing::debug!(sku = %key, %err, "Skipping malformed catalog product")
                }
            }
        }

        for (sku, value) in raw.terms.on_demand {
            let Value::Object(terms) = value else {
                tracing::debug!(%sku, "Skipping on-demand terms that are not an object");
                continue;
            };

            let parsed: BTreeMap<String, OfferTerm> = terms
                .into_iter()
                .filter_map(|(code, term)| match serde_json::from_value(term) {
                    Ok(term) => Some((code, term)),
                    Err(err) => {
                        tracing::debug!(%sku, term = %code, %err, "Skipping malformed term");
                        None
                    }
                })
                .collect();

            catalog.on_demand.insert(sku, parsed);
        }

        catalog
    }
}
