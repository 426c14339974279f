// Core processing: column classification, unit normalization, catalog
// filtering, aggregation and duplicate resolution

pub mod aggregate;
pub mod classify;
pub mod dedupe;
pub mod filter;
pub mod normalize;

pub use aggregate::SourceAggregator;
pub use classify::{ColumnClassifier, ColumnRejection, KeywordClassifier};
pub use dedupe::{precision_proxy, resolve, Resolution};
pub use filter::{accept_catalog, filter_extragalactic_rows, remove_potential_photoz};
pub use normalize::{normalize, velocity_to_redshift};
