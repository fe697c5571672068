//! Transformation module.
//!
//! Turns cached source tables into panel-ready tables:
//! - Columns: case-insensitive and verbatim column lookup
//! - Coerce: numeric coercion and required-column row filtering
//! - Rank: first-occurrence top-K
//! - Classify: Developed/Developing labels and the matched sample
//! - Panels: one shaping function per dashboard panel
//! - Pipeline: dataset loading plus panel shaping

pub mod classify;
pub mod coerce;
pub mod columns;
pub mod panels;
pub mod pipeline;
pub mod rank;

pub use classify::{box_summary, BoxSummary, Classifier, CountryMean, MatchedSample, STATUS_COLUMN};
pub use coerce::{coerce_and_filter, FilterOutcome};
pub use columns::{require_column, require_columns, resolve_column, ColumnResolution};
pub use panels::*;
pub use pipeline::Dashboard;
pub use rank::{rank_order, top_k, top_k_in_partition, RANK_COLUMN};
