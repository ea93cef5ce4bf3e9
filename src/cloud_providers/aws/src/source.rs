use std::borrow::Cow;

use rust_decimal::Decimal;
use volprice_common::pricing::lookup_query;
use volprice_common::{Catalog, PriceQuery, RetrievalError};

use crate::offers::OfferClient;
use crate::query::{EbsFilterBuilder, PricingQueryClient};

/// Where catalogs come from. Every lookup fetches afresh; nothing is cached.
pub enum PricingSource {
    /// A catalog already in memory, e.g. loaded from a file.
    Static(Catalog),
    /// Regional bulk offer files over HTTPS.
    Offers(OfferClient),
    /// The pricing query service, filtered server-side.
    Query(PricingQueryClient),
}

impl PricingSource {
    pub fn name(&self) -> &'static str {
        match self {
            PricingSource::Static(_) => "static",
            PricingSource::Offers(_) => "offers",
            PricingSource::Query(_) => "query",
        }
    }

    pub async fn fetch_catalog(
        &self,
        query: &PriceQuery,
        service_code: &str,
    ) -> Result<Cow<'_, Catalog>, RetrievalError> {
        match self {
            PricingSource::Static(catalog) => Ok(Cow::Borrowed(catalog)),
            PricingSource::Offers(client) => client
                .fetch(&query.region, service_code)
                .await
                .map(Cow::Owned),
            PricingSource::Query(client) => client
                .fetch_catalog(service_code, &EbsFilterBuilder::for_query(query))
                .await
                .map(Cow::Owned),
        }
    }

    /// Fetches the catalog for the query's region and resolves one price.
    ///
    /// `Ok(None)` means the catalog was retrieved but holds no usable price.
    pub async fn lookup_price(
        &self,
        query: &PriceQuery,
        service_code: &str,
    ) -> Result<Option<Decimal>, RetrievalError> {
        let catalog = self.fetch_catalog(query, service_code).await?;
        let price = lookup_query(&catalog, query);

        tracing::debug!(
            source = self.name(),
            region = %query.region,
            resource_type = %query.resource_type,
            price = ?price,
            "Resolved volume price"
        );

        Ok(price)
    }
}
