//! DynamoDB-backed savings and listing sinks.
//!
//! Savings: one item per (account, region): `AccountId` (hash), `Region`
//! (range), `TotalSizeGib`, `TotalSavings` and `Version`. Writes are
//! conditional on the version read, so concurrent trackers cannot overwrite
//! each other.
//!
//! Listings: one item per SKU (`Sku` hash key) with `VolumeApiName`,
//! `StorageMedia`, `Location`, `Unit` and `PricePerUnit`, all strings.
//! Absent attributes are stored as "N/A".

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use volprice_common::pricing::{ListingSink, PriceListing};
use volprice_common::savings::SavingsSink;
use volprice_common::{SavingsRecord, SinkError};

pub const ACCOUNT_ID: &str = "AccountId";
pub const REGION: &str = "Region";
pub const TOTAL_SIZE_GIB: &str = "TotalSizeGib";
pub const TOTAL_SAVINGS: &str = "TotalSavings";
pub const VERSION: &str = "Version";

pub const SKU: &str = "Sku";
pub const VOLUME_API_NAME: &str = "VolumeApiName";
pub const STORAGE_MEDIA: &str = "StorageMedia";
pub const LOCATION: &str = "Location";
pub const UNIT: &str = "Unit";
pub const PRICE_PER_UNIT: &str = "PricePerUnit";

const NOT_AVAILABLE: &str = "N/A";

type Item = HashMap<String, AttributeValue>;

pub struct DynamoSavingsSink {
    client: Client,
    table_name: String,
}

impl DynamoSavingsSink {
    pub fn new(config: &SdkConfig, table_name: impl Into<String>) -> Self {
        Self {
            client: Client::new(config),
            table_name: table_name.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

#[async_trait]
impl SavingsSink for DynamoSavingsSink {
    async fn get(&self, account_id: &str, region: &str) -> Result<Option<SavingsRecord>, SinkError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(ACCOUNT_ID, AttributeValue::S(account_id.to_string()))
            .key(REGION, AttributeValue::S(region.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|err| {
                tracing::error!(table = %self.table_name, error = %DisplayErrorContext(&err), "GetItem failed");
                SinkError::rejected(DisplayErrorContext(&err))
            })?;

        output.item.as_ref().map(record_from_item).transpose()
    }

    async fn put(&self, record: &SavingsRecord, expected_version: Option<u64>) -> Result<(), SinkError> {
        let request = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item_from_record(record)));

        let request = match expected_version {
            None => request.condition_expression(format!("attribute_not_exists({ACCOUNT_ID})")),
            // Items written before versioning carry no Version attribute.
            Some(0) => request
                .condition_expression(format!(
                    "attribute_exists({ACCOUNT_ID}) AND attribute_not_exists(#v)"
                ))
                .expression_attribute_names("#v", VERSION),
            Some(version) => request
                .condition_expression("#v = :v")
                .expression_attribute_names("#v", VERSION)
                .expression_attribute_values(":v", AttributeValue::N(version.to_string())),
        };

        match request.send().await {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
            {
                tracing::debug!(
                    table = %self.table_name,
                    account_id = %record.account_id,
                    region = %record.region,
                    ?expected_version,
                    "Conditional put lost the race"
                );
                Err(SinkError::Conflict {
                    account_id: record.account_id.clone(),
                    region: record.region.clone(),
                })
            }
            Err(err) => {
                tracing::error!(table = %self.table_name, error = %DisplayErrorContext(&err), "PutItem failed");
                Err(SinkError::rejected(DisplayErrorContext(&err)))
            }
        }
    }
}

pub struct DynamoListingSink {
    client: Client,
    table_name: String,
}

impl DynamoListingSink {
    pub fn new(config: &SdkConfig, table_name: impl Into<String>) -> Self {
        Self {
            client: Client::new(config),
            table_name: table_name.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

#[async_trait]
impl ListingSink for DynamoListingSink {
    async fn put_listing(&self, listing: &PriceListing) -> Result<(), SinkError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item_from_listing(listing)))
            .send()
            .await
            .map_err(|err| {
                tracing::error!(table = %self.table_name, sku = %listing.sku, error = %DisplayErrorContext(&err), "PutItem failed");
                SinkError::rejected(DisplayErrorContext(&err))
            })?;
        Ok(())
    }
}

pub fn item_from_listing(listing: &PriceListing) -> Item {
    let text = |value: Option<&str>| AttributeValue::S(value.unwrap_or(NOT_AVAILABLE).to_string());

    HashMap::from([
        (SKU.to_string(), AttributeValue::S(listing.sku.clone())),
        (VOLUME_API_NAME.to_string(), text(listing.volume_api_name.as_deref())),
        (STORAGE_MEDIA.to_string(), text(listing.storage_media.as_deref())),
        (LOCATION.to_string(), text(listing.location.as_deref())),
        (UNIT.to_string(), text(listing.unit.as_deref())),
        (
            PRICE_PER_UNIT.to_string(),
            text(listing.price_usd.map(|p| p.to_string()).as_deref()),
        ),
    ])
}

pub fn item_from_record(record: &SavingsRecord) -> Item {
    HashMap::from([
        (ACCOUNT_ID.to_string(), AttributeValue::S(record.account_id.clone())),
        (REGION.to_string(), AttributeValue::S(record.region.clone())),
        (
            TOTAL_SIZE_GIB.to_string(),
            AttributeValue::N(record.total_size_gib.to_string()),
        ),
        (
            TOTAL_SAVINGS.to_string(),
            AttributeValue::N(record.total_cost.normalize().to_string()),
        ),
        (VERSION.to_string(), AttributeValue::N(record.version.to_string())),
    ])
}

/// Missing counters read as zero; the keys must be present.
pub fn record_from_item(item: &Item) -> Result<SavingsRecord, SinkError> {
    Ok(SavingsRecord {
        account_id: string_attr(item, ACCOUNT_ID)?,
        region: string_attr(item, REGION)?,
        total_size_gib: number_attr(item, TOTAL_SIZE_GIB)?.unwrap_or_default(),
        total_cost: number_attr(item, TOTAL_SAVINGS)?.unwrap_or_default(),
        version: number_attr(item, VERSION)?.unwrap_or_default(),
    })
}

fn string_attr(item: &Item, name: &str) -> Result<String, SinkError> {
    match item.get(name) {
        Some(AttributeValue::S(value)) => Ok(value.clone()),
        Some(_) => Err(SinkError::invalid_record(format!("{name} is not a string"))),
        None => Err(SinkError::invalid_record(format!("{name} is missing"))),
    }
}

fn number_attr<T: FromStr>(item: &Item, name: &str) -> Result<Option<T>, SinkError> {
    match item.get(name) {
        Some(AttributeValue::N(raw)) => raw
            .parse()
            .map(Some)
            .map_err(|_| SinkError::invalid_record(format!("{name} is not a valid number: {raw}"))),
        Some(_) => Err(SinkError::invalid_record(format!("{name} is not a number"))),
        None => Ok(None),
    }
}
