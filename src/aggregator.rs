//! Time-bucket aggregation
//!
//! This module merges readings into fixed 5-minute buckets:
//! - Minute floored to the lower multiple of 5, seconds zeroed
//! - Per-channel arithmetic mean, rounded to the nearest integer
//! - Per-channel population standard deviation, rounded to 1 decimal
//!
//! A monitor sampled repeatedly within a short window should count as one
//! clinical observation, not several.

use crate::types::{BucketedReading, Reading};
use chrono::{Duration, NaiveDateTime, SubsecRound, Timelike};
use std::collections::BTreeMap;

/// Aggregator for merging readings into 5-minute buckets
pub struct Aggregator;

impl Aggregator {
    /// Merge readings into 5-minute buckets, ascending by bucket start.
    ///
    /// The output never has more buckets than input readings; a bucket with
    /// a single source reading has standard deviation 0.0 on every channel.
    pub fn aggregate(readings: &[Reading]) -> Vec<BucketedReading> {
        let mut groups: BTreeMap<NaiveDateTime, Vec<&Reading>> = BTreeMap::new();
        for reading in readings {
            groups
                .entry(bucket_start(reading.taken_at))
                .or_default()
                .push(reading);
        }

        groups
            .into_iter()
            .map(|(start, members)| reduce_bucket(start, &members))
            .collect()
    }
}

/// Floor a timestamp to the start of its 5-minute bucket.
fn bucket_start(taken_at: NaiveDateTime) -> NaiveDateTime {
    let truncated = taken_at.trunc_subsecs(0);
    let truncated = truncated - Duration::seconds(i64::from(truncated.second()));
    truncated - Duration::minutes(i64::from(truncated.minute() % 5))
}

fn reduce_bucket(start: NaiveDateTime, members: &[&Reading]) -> BucketedReading {
    let systolic: Vec<f64> = members.iter().map(|r| f64::from(r.systolic)).collect();
    let diastolic: Vec<f64> = members.iter().map(|r| f64::from(r.diastolic)).collect();
    let pulse: Vec<f64> = members.iter().map(|r| f64::from(r.pulse)).collect();

    BucketedReading {
        bucket_start: start,
        systolic: rounded_mean(&systolic),
        diastolic: rounded_mean(&diastolic),
        pulse: rounded_mean(&pulse),
        systolic_sd: round1(population_std_dev(&systolic)),
        diastolic_sd: round1(population_std_dev(&diastolic)),
        pulse_sd: round1(population_std_dev(&pulse)),
    }
}

fn rounded_mean(values: &[f64]) -> u16 {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    mean.round() as u16
}

/// Population standard deviation (unrounded); 0.0 for a single value.
pub(crate) fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|value| {
            let diff = value - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;
    variance.sqrt()
}

/// Round to 1 decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
