mod sink;
mod tracker;

pub use sink::{InMemorySink, MockSavingsSink, SavingsSink};
pub use tracker::{monthly_savings, SavingsTracker};
