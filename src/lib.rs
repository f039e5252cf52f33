//! Filter-and-aggregate core of the student electives dashboard.
//!
//! A rendering layer loads the dataset once through [`load_cached`], then on
//! every interaction calls [`filter`] with fresh [`FilterCriteria`] and
//! [`ColumnSelection`] values and charts whatever [`aggregate`] returns.
//! [`Session`] bundles that loop for callers that keep state between
//! interactions.

pub mod config;
pub mod data;
pub mod error;
pub mod session;

pub use config::{AggregateConfig, CleaningMode, DashboardConfig, LoadOptions};
pub use data::aggregate::{
    AggregateResult, CountTable, CrossTab, Summary, SummaryKind, SummaryTable, aggregate,
    aggregate_with,
};
pub use data::cache::{DatasetCache, load_cached};
pub use data::filter::{ColumnSelection, FilterCriteria, FilteredView, ViewTable, filter};
pub use data::loader::load_file;
pub use data::model::{Attribute, Dataset, Record};
pub use error::{Error, Result};
pub use session::Session;
