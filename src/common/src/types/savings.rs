use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Cumulative savings for one account in one region.
///
/// `version` counts successful writes; 0 means the record was never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsRecord {
    pub account_id: String,
    pub region: String,
    pub total_size_gib: u64,
    pub total_cost: Decimal,
    pub version: u64,
}

impl SavingsRecord {
    pub fn empty(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
            total_size_gib: 0,
            total_cost: Decimal::ZERO,
            version: 0,
        }
    }

    /// Next version of this record with `size_gib` and `cost` added on top,
    /// or `None` if either total would overflow.
    pub fn accumulate(&self, size_gib: u64, cost: Decimal) -> Option<Self> {
        Some(Self {
            account_id: self.account_id.clone(),
            region: self.region.clone(),
            total_size_gib: self.total_size_gib.checked_add(size_gib)?,
            total_cost: self.total_cost.checked_add(cost)?,
            version: self.version.checked_add(1)?,
        })
    }

    pub fn is_stored(&self) -> bool {
        self.version > 0
    }
}
