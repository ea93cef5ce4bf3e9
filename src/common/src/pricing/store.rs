//! Persistence of flat price listings, one item per SKU.

use std::collections::BTreeMap;

use async_trait::async_trait;
use mockall::automock;
use tokio::sync::RwLock;

use crate::error::SinkError;
use crate::pricing::summary::PriceListing;

#[automock]
#[async_trait]
pub trait ListingSink: Send + Sync {
    /// Upserts `listing`; a later put for the same SKU replaces it.
    async fn put_listing(&self, listing: &PriceListing) -> Result<(), SinkError>;
}

/// Writes every listing in order and stops at the first failure.
pub async fn store_listings<S: ListingSink + ?Sized>(
    sink: &S,
    listings: &[PriceListing],
) -> Result<usize, SinkError> {
    for listing in listings {
        sink.put_listing(listing).await?;
        tracing::debug!(
            sku = %listing.sku,
            location = listing.location.as_deref().unwrap_or("N/A"),
            "Stored price listing"
        );
    }

    tracing::info!(count = listings.len(), "Stored price listings");
    Ok(listings.len())
}

/// Process-local listing store, used for dry runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryListingSink {
    listings: RwLock<BTreeMap<String, PriceListing>>,
}

impl InMemoryListingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, sku: &str) -> Option<PriceListing> {
        self.listings.read().await.get(sku).cloned()
    }

    pub async fn len(&self) -> usize {
        self.listings.read().await.len()
    }
}

#[async_trait]
impl ListingSink for InMemoryListingSink {
    async fn put_listing(&self, listing: &PriceListing) -> Result<(), SinkError> {
        self.listings
            .write()
            .await
            .insert(listing.sku.clone(), listing.clone());
        Ok(())
    }
}
