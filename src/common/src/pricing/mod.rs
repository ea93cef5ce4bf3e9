pub mod aliases;
mod normalizer;
pub mod store;
pub mod summary;

pub use aliases::{effective_type_name, AliasRule, PROVISIONED_IOPS_LITERALS, UMBRELLA_ALIASES};
pub use normalizer::{lookup, lookup_query, matches_query};
pub use store::{store_listings, InMemoryListingSink, ListingSink, MockListingSink};
pub use summary::{listings, volume_price_table, PriceListing, VolumePriceTable};
