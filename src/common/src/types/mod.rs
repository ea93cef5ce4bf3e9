pub mod catalog;
pub mod query;
pub mod savings;
