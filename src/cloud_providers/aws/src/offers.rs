//! Bulk offer file client: `GET {base}/offers/v1.0/aws/{service}/current/{region}/index.json`.

use std::time::Duration;

use reqwest::Client;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;
use volprice_common::{Catalog, RetrievalError};

pub struct OfferClient {
    client: Client,
    base_url: String,
    retry_attempts: usize,
}

impl OfferClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RetrievalError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RetrievalError::transport(base_url.as_str(), err))?;

        Ok(Self {
            client,
            base_url,
            retry_attempts: 0,
        })
    }

    /// Extra attempts after a transient failure; 0 keeps a single attempt.
    pub fn with_retry_attempts(mut self, retry_attempts: usize) -> Self {
        self.retry_attempts = retry_attempts;
        self
    }

    pub fn offer_url(&self, service: &str, region: &str) -> String {
        format!(
            "{}/offers/v1.0/aws/{}/current/{}/index.json",
            self.base_url, service, region
        )
    }

    /// Downloads and parses the regional offer file. Never cached.
    pub async fn fetch(&self, region: &str, service: &str) -> Result<Catalog, RetrievalError> {
        let url = self.offer_url(service, region);
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(250)
            .max_delay(Duration::from_secs(10))
            .take(self.retry_attempts);

        let catalog = RetryIf::spawn(
            strategy,
            || self.fetch_once(&url),
            |err: &RetrievalError| {
                let transient = err.is_transient();
                if transient {
                    tracing::warn!(%url, error = %err, "Transient failure fetching offer file");
                }
                transient
            },
        )
        .await?;

        tracing::info!(%url, products = catalog.len(), "Fetched offer file");
        Ok(catalog)
    }

    async fn fetch_once(&self, url: &str) -> Result<Catalog, RetrievalError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| RetrievalError::transport(url, err))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, %status, "Offer endpoint returned non-success status");
            return Err(RetrievalError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| RetrievalError::transport(url, err))?;

        Catalog::from_json_slice(&body).map_err(|source| RetrievalError::InvalidBody {
            url: url.to_string(),
            source,
        })
    }
}
