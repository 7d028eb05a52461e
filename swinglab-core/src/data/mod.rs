//! Bar-series access.
//!
//! Storage and ingestion of bars live outside the engine; this module only
//! defines how the engine reads them.

pub mod series;

pub use series::BarSeries;
