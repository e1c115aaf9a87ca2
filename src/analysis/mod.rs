//! Aggregation stage.
//!
//! Grouped counts, sums and means over cleaned tables, with an optional
//! left join against a reference table.

pub mod aggregator;
pub mod summary;

pub use aggregator::*;
pub use summary::Summary;
