pub mod config;
pub mod dynamodb;
pub mod offers;
pub mod query;
pub mod source;

pub use config::{resolve_sdk_config, AwsCredentials};
pub use dynamodb::{DynamoListingSink, DynamoSavingsSink};
pub use offers::OfferClient;
pub use query::{EbsFilterBuilder, PricingQueryClient};
pub use source::PricingSource;
