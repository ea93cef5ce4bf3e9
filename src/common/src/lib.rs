pub mod constants;
pub mod error;
pub mod pricing;
pub mod savings;
pub mod types;

pub use error::{RetrievalError, SinkError};
pub use pricing::lookup;
pub use types::catalog::Catalog;
pub use types::query::{PriceQuery, PriceUnit};
pub use types::savings::SavingsRecord;
