//! Tensio - analysis engine for home blood-pressure monitor CSV exports
//!
//! Tensio turns raw, irregularly timestamped monitor exports into a
//! clinically meaningful report through a deterministic pipeline: CSV
//! parsing -> 5-minute bucket aggregation -> statistics derivation ->
//! guidance generation -> report encoding.
//!
//! ## Modules
//!
//! - **parser**: Validate raw CSV/TSV text into readings plus per-line errors
//! - **aggregator**: Merge readings into fixed 5-minute buckets
//! - **stats**: Derive the statistics bundle from the bucketed series
//! - **advice**: Map statistical findings to prioritized guidance
//! - **report**: Encode everything into a versioned payload for renderers

pub mod advice;
pub mod aggregator;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod stats;
pub mod types;

pub use error::AnalysisError;
pub use pipeline::{analyze_csv, Analyzer};
pub use report::{ReportEncoder, REPORT_VERSION};

/// Tensio version embedded in all report payloads
pub const TENSIO_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report payloads
pub const PRODUCER_NAME: &str = "tensio";
