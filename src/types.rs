//! Core types for the Tensio pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: validated readings, bucketed series, the statistics bundle, and
//! the report payload handed to rendering collaborators.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A single validated blood-pressure reading.
///
/// Produced by the CSV parser; values outside the supported clinical ranges
/// (systolic 60-250, diastolic 40-150, pulse 40-200) are rejected at parse
/// time and never reach this type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Wall-clock measurement time (device exports carry no timezone)
    pub taken_at: NaiveDateTime,
    /// Systolic pressure (mmHg)
    pub systolic: u16,
    /// Diastolic pressure (mmHg)
    pub diastolic: u16,
    /// Pulse rate (bpm)
    pub pulse: u16,
}

/// One 5-minute bucket of merged readings.
///
/// A monitor sampled repeatedly within a short window counts as one clinical
/// observation, so readings sharing a bucket are reduced to their mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketedReading {
    /// Bucket start (minute floored to the lower multiple of 5, seconds zeroed)
    pub bucket_start: NaiveDateTime,
    /// Mean systolic pressure, rounded to the nearest integer (mmHg)
    pub systolic: u16,
    /// Mean diastolic pressure, rounded to the nearest integer (mmHg)
    pub diastolic: u16,
    /// Mean pulse rate, rounded to the nearest integer (bpm)
    pub pulse: u16,
    /// Population standard deviation of the bucket's systolic samples (1 decimal)
    pub systolic_sd: f64,
    /// Population standard deviation of the bucket's diastolic samples (1 decimal)
    pub diastolic_sd: f64,
    /// Population standard deviation of the bucket's pulse samples (1 decimal)
    pub pulse_sd: f64,
}

/// User-adjustable clinical limits.
///
/// Passed explicitly into every statistics function; changing them means
/// re-running the pipeline over the retained raw readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Systolic limit above which a bucket counts as abnormal (mmHg)
    pub systolic_limit: u16,
    /// Diastolic limit above which a bucket counts as abnormal (mmHg)
    pub diastolic_limit: u16,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            systolic_limit: 140,
            diastolic_limit: 90,
        }
    }
}

/// A data line the parser could not turn into a valid reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineError {
    /// 1-based line number in the source file (the header is line 1)
    pub line: usize,
    /// The raw line as it appeared in the file
    pub content: String,
    /// Why the line was rejected
    pub message: String,
}

/// Parser output: valid readings plus the lines that failed.
///
/// Per-line failures never abort the parse; the caller surfaces the error
/// count while the valid readings proceed through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseOutcome {
    /// Valid readings in file order
    pub readings: Vec<Reading>,
    /// Lines that failed date, number, or range validation
    pub errors: Vec<LineError>,
}

/// Average/max/min for one channel of the bucketed series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    /// Arithmetic mean over all buckets (1 decimal)
    pub average: f64,
    /// Largest bucket value
    pub max: u16,
    /// Smallest bucket value
    pub min: u16,
}

/// Population standard deviation of each channel's per-bucket means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariabilitySummary {
    /// Systolic standard deviation (mmHg, 1 decimal)
    pub systolic_sd: f64,
    /// Diastolic standard deviation (mmHg, 1 decimal)
    pub diastolic_sd: f64,
    /// Pulse standard deviation (bpm, 1 decimal)
    pub pulse_sd: f64,
}

/// Buckets exceeding the configured limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdExceedance {
    /// Total bucket count the percentages are relative to
    pub total: usize,
    /// Buckets with systolic strictly above the systolic limit
    pub systolic_count: usize,
    /// Buckets with diastolic strictly above the diastolic limit
    pub diastolic_count: usize,
    /// Systolic exceedance share (percent, 1 decimal; 0.0 on an empty series)
    pub systolic_pct: f64,
    /// Diastolic exceedance share (percent, 1 decimal; 0.0 on an empty series)
    pub diastolic_pct: f64,
}

/// Day/night comparison over the bucketed series.
///
/// "Day" is wall-clock hour 6 (inclusive) to 18 (exclusive). Fields tied to
/// an empty partition are `None` and `dipper` is then `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayNightSummary {
    /// Mean daytime systolic pressure (mmHg, 1 decimal)
    pub day_systolic_avg: Option<f64>,
    /// Mean nighttime systolic pressure (mmHg, 1 decimal)
    pub night_systolic_avg: Option<f64>,
    /// Mean daytime diastolic pressure (mmHg, 1 decimal)
    pub day_diastolic_avg: Option<f64>,
    /// Mean nighttime diastolic pressure (mmHg, 1 decimal)
    pub night_diastolic_avg: Option<f64>,
    /// (day - night) / night x 100 for systolic (percent, 1 decimal)
    pub systolic_diff_pct: Option<f64>,
    /// (day - night) / night x 100 for diastolic (percent, 1 decimal)
    pub diastolic_diff_pct: Option<f64>,
    /// True iff both percent differences are >= 10.0 after rounding
    pub dipper: bool,
}

/// Clinical blood-pressure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Normal,
    Elevated,
    Stage1,
    Stage2,
    Stage3,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Normal => "normal",
            Category::Elevated => "elevated",
            Category::Stage1 => "stage1",
            Category::Stage2 => "stage2",
            Category::Stage3 => "stage3",
        }
    }
}

/// Count and share of buckets falling into one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    /// Buckets classified into this category
    pub count: usize,
    /// Share of all buckets (percent, 1 decimal)
    pub pct: f64,
}

/// How the bucketed series distributes over the five clinical categories.
///
/// The categories partition the series: every bucket lands in exactly one,
/// so the counts sum to the bucket count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    /// Normal (systolic < 120 and diastolic < 80)
    pub normal: CategoryCount,
    /// Elevated (systolic 120-129 and diastolic < 80)
    pub elevated: CategoryCount,
    /// Stage 1 hypertension (systolic 130-139 or diastolic 80-89)
    pub stage1: CategoryCount,
    /// Stage 2 hypertension (systolic 140-159 or diastolic 90-99)
    pub stage2: CategoryCount,
    /// Stage 3 hypertension (systolic >= 160 or diastolic >= 100)
    pub stage3: CategoryCount,
}

/// Share of buckets spending time above the configured limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureLoad {
    /// (systolic count + diastolic count) / (2 x total) x 100 (percent, 1 decimal)
    pub total_pct: f64,
    /// Share of buckets with systolic above the limit (percent, 1 decimal)
    pub systolic_pct: f64,
    /// Share of buckets with diastolic above the limit (percent, 1 decimal)
    pub diastolic_pct: f64,
    /// Daytime systolic load; `None` when no daytime buckets exist
    pub day_systolic_pct: Option<f64>,
    /// Nighttime systolic load; `None` when no nighttime buckets exist
    pub night_systolic_pct: Option<f64>,
    /// Daytime diastolic load; `None` when no daytime buckets exist
    pub day_diastolic_pct: Option<f64>,
    /// Nighttime diastolic load; `None` when no nighttime buckets exist
    pub night_diastolic_pct: Option<f64>,
}

/// Day/night means and differences for one calendar date.
///
/// Only dates with at least one daytime and one nighttime bucket appear;
/// chart-ready data for the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyDayNight {
    /// Calendar date the buckets fall on
    pub date: NaiveDate,
    /// Mean daytime systolic pressure (mmHg, 1 decimal)
    pub day_systolic_avg: f64,
    /// Mean nighttime systolic pressure (mmHg, 1 decimal)
    pub night_systolic_avg: f64,
    /// Mean daytime diastolic pressure (mmHg, 1 decimal)
    pub day_diastolic_avg: f64,
    /// Mean nighttime diastolic pressure (mmHg, 1 decimal)
    pub night_diastolic_avg: f64,
    /// Day minus night systolic mean, signed (mmHg, 1 decimal)
    pub systolic_diff: f64,
    /// Day minus night diastolic mean, signed (mmHg, 1 decimal)
    pub diastolic_diff: f64,
}

/// The full bundle of independent sub-reports over one bucketed series.
///
/// Each field is a pure function of (series, thresholds); the whole bundle is
/// recomputed on every threshold change, never partially invalidated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsBundle {
    /// Systolic average/max/min
    pub systolic: ChannelSummary,
    /// Diastolic average/max/min
    pub diastolic: ChannelSummary,
    /// Pulse average/max/min
    pub pulse: ChannelSummary,
    /// Per-channel standard deviation over the bucketed means
    pub variability: VariabilitySummary,
    /// Buckets above the configured limits
    pub exceedance: ThresholdExceedance,
    /// Day/night comparison and dipper classification
    pub day_night: DayNightSummary,
    /// Distribution over the five clinical categories
    pub categories: CategoryBreakdown,
    /// Pressure load overall and per day/night partition
    pub load: PressureLoad,
    /// Per-date day/night differences, ascending by date
    pub daily_day_night: Vec<DailyDayNight>,
}

/// One full pipeline run: parse -> aggregate -> statistics -> advice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    /// Thresholds this run was computed against
    pub thresholds: Thresholds,
    /// Valid readings that entered aggregation
    pub reading_count: usize,
    /// Bucketed series, ascending by bucket start
    pub series: Vec<BucketedReading>,
    /// Statistics over the series
    pub statistics: StatisticsBundle,
    /// Prioritized guidance derived from the statistics
    pub advice: Vec<String>,
    /// Lines the parser rejected
    pub errors: Vec<LineError>,
}

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Versioned report payload.
///
/// The interface to all rendering collaborators (charts, tables, PDF
/// composer); they own no business logic and consume this as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportPayload {
    pub report_version: String,
    pub producer: ReportProducer,
    pub generated_at_utc: String,
    pub thresholds: Thresholds,
    /// Valid readings behind the series
    pub reading_count: usize,
    /// Buckets in the series
    pub bucket_count: usize,
    pub series: Vec<BucketedReading>,
    pub statistics: StatisticsBundle,
    pub advice: Vec<String>,
    pub line_errors: Vec<LineError>,
}
