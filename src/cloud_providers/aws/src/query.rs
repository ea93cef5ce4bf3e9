//! Pricing query service client (`GetProducts`), one JSON document per product.

use std::time::Duration;

use aws_config::SdkConfig;
use aws_sdk_pricing as pricing;
use aws_sdk_pricing::config::http::HttpResponse;
use aws_sdk_pricing::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_pricing::types::{Filter as PricingFilter, FilterType as PricingFilterType};
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;
use volprice_common::constants::{PROVISIONED_IOPS, STORAGE_PRODUCT_FAMILY};
use volprice_common::types::catalog::PriceListEntry;
use volprice_common::{Catalog, PriceQuery, RetrievalError};

/// TERM_MATCH filters narrowing a query to EBS volume products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EbsFilterBuilder {
    pub region: Option<String>,
    pub product_family: Option<String>,
    pub volume_api_name: Option<String>,
    pub volume_type: Option<String>,
    pub location: Option<String>,
    pub location_type: Option<String>,
}

impl EbsFilterBuilder {
    /// Filters for one price query.
    ///
    /// IOPS prices live outside the Storage family, so a Provisioned IOPS
    /// request filters on the API name alone.
    pub fn for_query(query: &PriceQuery) -> Self {
        let mut builder = Self {
            region: Some(query.region.clone()),
            ..Self::default()
        };

        if query.is_provisioned_iops() {
            builder.volume_api_name = Some("io1".to_string());
        } else if is_api_name(&query.resource_type) {
            builder.product_family = Some(STORAGE_PRODUCT_FAMILY.to_string());
            builder.volume_api_name = Some(query.resource_type.clone());
        } else {
            builder.product_family = Some(STORAGE_PRODUCT_FAMILY.to_string());
            builder.volume_type = Some(query.resource_type.clone());
        }

        builder
    }

    /// All Storage products of one API name across every location.
    pub fn for_volume_api_name(volume_api_name: &str) -> Self {
        Self {
            product_family: Some(STORAGE_PRODUCT_FAMILY.to_string()),
            volume_api_name: Some(volume_api_name.to_string()),
            ..Self::default()
        }
    }

    pub fn term_matches(&self) -> Vec<(&'static str, &str)> {
        [
            ("regionCode", self.region.as_deref()),
            ("productFamily", self.product_family.as_deref()),
            ("volumeApiName", self.volume_api_name.as_deref()),
            ("volumeType", self.volume_type.as_deref()),
            ("location", self.location.as_deref()),
            ("locationType", self.location_type.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .collect()
    }

    pub fn to_filter(&self) -> Result<Vec<PricingFilter>, RetrievalError> {
        self.term_matches()
            .into_iter()
            .map(|(field, value)| {
                PricingFilter::builder()
                    .field(field)
                    .value(value)
                    .r#type(PricingFilterType::TermMatch)
                    .build()
                    .map_err(|err| RetrievalError::Service {
                        service: "pricing".to_string(),
                        message: format!("invalid {field} filter: {err}"),
                        transient: false,
                    })
            })
            .collect()
    }
}

// API names are lowercase tokens (gp3, io2, standard); categories are labels.
fn is_api_name(resource_type: &str) -> bool {
    resource_type != PROVISIONED_IOPS
        && !resource_type.is_empty()
        && resource_type
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

const TRANSIENT_ERROR_CODES: &[&str] = &[
    "ThrottlingException",
    "InternalErrorException",
    "ServiceUnavailableException",
    "RequestTimeout",
];

fn is_transient_service_error(status: u16, code: Option<&str>) -> bool {
    status == 429
        || status >= 500
        || code.is_some_and(|code| TRANSIENT_ERROR_CODES.contains(&code))
}

/// Timeouts, dispatch failures, throttling and server-side errors are worth
/// another attempt; access denied, bad parameters and expired tokens are not.
fn is_transient_sdk_error<E: ProvideErrorMetadata>(err: &SdkError<E, HttpResponse>) -> bool {
    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            true
        }
        SdkError::ServiceError(ctx) => {
            is_transient_service_error(ctx.raw().status().as_u16(), ctx.err().code())
        }
        _ => false,
    }
}

pub struct PricingQueryClient {
    client: pricing::Client,
    retry_attempts: usize,
}

impl PricingQueryClient {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: pricing::Client::new(config),
            retry_attempts: 0,
        }
    }

    pub fn with_retry_attempts(mut self, retry_attempts: usize) -> Self {
        self.retry_attempts = retry_attempts;
        self
    }

    /// Every parsable product document matching the filters, across all pages.
    pub async fn get_products(
        &self,
        service_code: &str,
        filters: Vec<PricingFilter>,
    ) -> Result<Vec<PriceListEntry>, RetrievalError> {
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(250)
            .max_delay(Duration::from_secs(10))
            .take(self.retry_attempts);

        RetryIf::spawn(
            strategy,
            || {
                let filters = filters.clone();
                async move { self.fetch_all(service_code, filters).await }
            },
            |err: &RetrievalError| {
                let transient = err.is_transient();
                if transient {
                    tracing::warn!(service_code, error = %err, "Transient pricing query failure");
                }
                transient
            },
        )
        .await
    }

    async fn fetch_all(
        &self,
        service_code: &str,
        filters: Vec<PricingFilter>,
    ) -> Result<Vec<PriceListEntry>, RetrievalError> {
        let mut paginator = self
            .client
            .get_products()
            .service_code(service_code)
            .set_filters(Some(filters))
            .into_paginator()
            .send();

        let mut entries = Vec::new();
        let mut skipped = 0usize;

        while let Some(page) = paginator.next().await {
            let page = page.map_err(|err| {
                tracing::warn!(service_code, error = %DisplayErrorContext(&err), "GetProducts failed");
                RetrievalError::Service {
                    service: service_code.to_string(),
                    message: DisplayErrorContext(&err).to_string(),
                    transient: is_transient_sdk_error(&err),
                }
            })?;

            for raw in page.price_list() {
                match PriceListEntry::from_json_str(raw) {
                    Ok(entry) => entries.push(entry),
                    Err(err) => {
                        skipped += 1;
                        tracing::debug!(%err, "Skipping unparsable price list entry");
                    }
                }
            }
        }

        tracing::info!(service_code, entries = entries.len(), skipped, "Fetched price list");
        Ok(entries)
    }

    pub async fn fetch_catalog(
        &self,
        service_code: &str,
        filters: &EbsFilterBuilder,
    ) -> Result<Catalog, RetrievalError> {
        let entries = self.get_products(service_code, filters.to_filter()?).await?;
        Ok(Catalog::from_price_list(entries))
    }
}
