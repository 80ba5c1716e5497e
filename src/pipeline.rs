//! Pipeline orchestration
//!
//! This module provides the public API for Tensio. A run is a synchronous,
//! single-threaded chain: parse -> aggregate -> statistics -> advice. The
//! stateful [`Analyzer`] retains the raw reading list so a threshold change
//! can re-run the full pipeline without re-reading the source; there is no
//! incremental recomputation.

use crate::advice::generate_advice;
use crate::aggregator::Aggregator;
use crate::error::AnalysisError;
use crate::parser::CsvParser;
use crate::types::{Analysis, LineError, Reading, StatisticsBundle, Thresholds};
use tracing::debug;

/// Run the full pipeline over raw CSV text.
///
/// Returns [`AnalysisError::MissingColumns`] when the header lacks a
/// required column and [`AnalysisError::NoUsableData`] when no line yields a
/// valid reading; per-line errors are carried in the returned analysis and
/// never abort the run.
pub fn analyze_csv(raw: &str, thresholds: &Thresholds) -> Result<Analysis, AnalysisError> {
    let outcome = CsvParser::parse(raw)?;
    debug!(
        readings = outcome.readings.len(),
        errors = outcome.errors.len(),
        "parsed csv"
    );
    analyze_readings(&outcome.readings, outcome.errors, thresholds)
}

/// Aggregate and derive statistics over an already-parsed reading list.
fn analyze_readings(
    readings: &[Reading],
    errors: Vec<LineError>,
    thresholds: &Thresholds,
) -> Result<Analysis, AnalysisError> {
    if readings.is_empty() {
        return Err(AnalysisError::NoUsableData);
    }

    let series = Aggregator::aggregate(readings);
    debug!(buckets = series.len(), "aggregated series");

    let statistics = StatisticsBundle::compute(&series, thresholds);
    let advice = generate_advice(&statistics);

    Ok(Analysis {
        thresholds: *thresholds,
        reading_count: readings.len(),
        series,
        statistics,
        advice,
        errors,
    })
}

/// Stateful analyzer that retains the last successfully parsed dataset.
///
/// `load_csv` replaces the retained readings only when the new parse
/// succeeds; a failed load leaves the previous dataset and analysis in
/// place. `apply_thresholds` re-runs the full pipeline over the retained
/// readings with new limits.
pub struct Analyzer {
    thresholds: Thresholds,
    readings: Vec<Reading>,
    line_errors: Vec<LineError>,
    last_analysis: Option<Analysis>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    /// Create an analyzer with the default 140/90 thresholds
    pub fn new() -> Self {
        Self::with_thresholds(Thresholds::default())
    }

    /// Create an analyzer with specific thresholds
    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            readings: Vec::new(),
            line_errors: Vec::new(),
            last_analysis: None,
        }
    }

    /// Parse and analyze a new CSV export, retaining it for later re-runs.
    pub fn load_csv(&mut self, raw: &str) -> Result<&Analysis, AnalysisError> {
        let outcome = CsvParser::parse(raw)?;
        let analysis =
            analyze_readings(&outcome.readings, outcome.errors.clone(), &self.thresholds)?;

        self.readings = outcome.readings;
        self.line_errors = outcome.errors;
        Ok(self.last_analysis.insert(analysis))
    }

    /// Re-run the full pipeline over the retained readings with new limits.
    pub fn apply_thresholds(&mut self, thresholds: Thresholds) -> Result<&Analysis, AnalysisError> {
        debug!(
            systolic_limit = thresholds.systolic_limit,
            diastolic_limit = thresholds.diastolic_limit,
            "applying thresholds"
        );
        let analysis =
            analyze_readings(&self.readings, self.line_errors.clone(), &thresholds)?;

        self.thresholds = thresholds;
        Ok(self.last_analysis.insert(analysis))
    }

    /// Thresholds the next run will use
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// The retained raw readings, if any
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    /// The most recent analysis, if any
    pub fn analysis(&self) -> Option<&Analysis> {
        self.last_analysis.as_ref()
    }
}
