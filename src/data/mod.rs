//! Data layer: core types, loading, filtering and aggregation.
//!
//! Architecture:
//! ```text
//!  .xlsx / .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐     ┌─────────┐
//!   │  loader   │ ◄── │  cache   │  one load per source
//!   └──────────┘     └─────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  Dataset  │  Vec<Record>, subject slots, filter options
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  criteria + column selection → FilteredView
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ aggregate  │  cleaned counts, rankings, cross-tabs
//!   └───────────┘
//! ```

pub mod aggregate;
pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;

#[cfg(test)]
pub(crate) mod testing;
