use rust_decimal::Decimal;

use crate::constants::DEFAULT_SAVINGS_MAX_ATTEMPTS;
use crate::error::SinkError;
use crate::savings::sink::SavingsSink;
use crate::types::savings::SavingsRecord;

/// Estimated monthly saving of removing a volume of `size_gib`, `None` when
/// the product does not fit in a `Decimal`.
pub fn monthly_savings(size_gib: u64, price_per_gb_month: Decimal) -> Option<Decimal> {
    Decimal::from(size_gib).checked_mul(price_per_gb_month)
}

/// Adds savings onto the stored record with a versioned read-modify-write.
///
/// A concurrent writer makes the conditional put fail; the tracker then
/// re-reads and tries again, so no increment is silently dropped.
pub struct SavingsTracker<S> {
    sink: S,
    max_attempts: u32,
}

impl<S: SavingsSink> SavingsTracker<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            max_attempts: DEFAULT_SAVINGS_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub async fn current(
        &self,
        account_id: &str,
        region: &str,
    ) -> Result<Option<SavingsRecord>, SinkError> {
        self.sink.get(account_id, region).await
    }

    /// Records the removal of `size_gib` priced at `price_per_gb_month` and
    /// returns the stored record.
    pub async fn record(
        &self,
        account_id: &str,
        region: &str,
        size_gib: u64,
        price_per_gb_month: Decimal,
    ) -> Result<SavingsRecord, SinkError> {
        let cost = monthly_savings(size_gib, price_per_gb_month).ok_or_else(|| {
            SinkError::invalid_record(format!(
                "savings for {size_gib} GiB at {price_per_gb_month} USD per GB-Mo overflow"
            ))
        })?;

        for attempt in 1..=self.max_attempts {
            let current = self.sink.get(account_id, region).await?;
            let expected_version = current.as_ref().map(|r| r.version);
            let next = current
                .unwrap_or_else(|| SavingsRecord::empty(account_id, region))
                .accumulate(size_gib, cost)
                .ok_or_else(|| {
                    SinkError::invalid_record(format!(
                        "savings totals for {account_id} in {region} overflow"
                    ))
                })?;

            match self.sink.put(&next, expected_version).await {
                Ok(()) => {
                    tracing::info!(
                        account_id,
                        region,
                        total_size_gib = next.total_size_gib,
                        total_cost = %next.total_cost,
                        "Updated savings record"
                    );
                    return Ok(next);
                }
                Err(err) if err.is_conflict() => {
                    tracing::warn!(account_id, region, attempt, "Savings record changed underneath, retrying");
                    tokio::task::yield_now().await;
                }
                Err(err) => return Err(err),
            }
        }

        Err(SinkError::Conflict {
            account_id: account_id.to_string(),
            region: region.to_string(),
        })
    }
}
