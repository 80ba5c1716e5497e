//! Statistics derivation
//!
//! This module computes the statistics bundle from a bucketed series:
//! - Per-channel summaries and variability
//! - Threshold exceedance counts
//! - Day/night comparison and dipper classification
//! - Clinical category distribution
//! - Pressure load, overall and per day/night partition
//!
//! Every sub-report is a pure function of (series, thresholds). The public
//! pipeline never feeds an empty series in, but each function is still total:
//! on an empty slice counts are 0 and percentages 0.0, and values tied to an
//! empty day/night partition are `None`.

use crate::aggregator::{population_std_dev, round1};
use crate::types::{
    BucketedReading, Category, CategoryBreakdown, CategoryCount, ChannelSummary, DailyDayNight,
    DayNightSummary, PressureLoad, StatisticsBundle, ThresholdExceedance, Thresholds,
    VariabilitySummary,
};
use chrono::{NaiveDate, Timelike};
use std::collections::BTreeMap;

impl StatisticsBundle {
    /// Compute every sub-report over the given series and thresholds.
    pub fn compute(series: &[BucketedReading], thresholds: &Thresholds) -> StatisticsBundle {
        StatisticsBundle {
            systolic: compute_channel_summary(series, |b| b.systolic),
            diastolic: compute_channel_summary(series, |b| b.diastolic),
            pulse: compute_channel_summary(series, |b| b.pulse),
            variability: compute_variability(series),
            exceedance: compute_exceedance(series, thresholds),
            day_night: compute_day_night(series),
            categories: compute_categories(series),
            load: compute_pressure_load(series, thresholds),
            daily_day_night: compute_daily_day_night(series),
        }
    }
}

/// Daytime is wall-clock hour 6 (inclusive) through 18 (exclusive).
fn is_day(bucket: &BucketedReading) -> bool {
    let hour = bucket.bucket_start.hour();
    (6..18).contains(&hour)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// count / total x 100, rounded to 1 decimal; 0.0 when total is zero.
fn share_pct(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(count as f64 / total as f64 * 100.0)
}

fn compute_channel_summary(
    series: &[BucketedReading],
    channel: fn(&BucketedReading) -> u16,
) -> ChannelSummary {
    let values: Vec<u16> = series.iter().map(channel).collect();
    ChannelSummary {
        average: mean(&values.iter().map(|v| f64::from(*v)).collect::<Vec<_>>())
            .map(round1)
            .unwrap_or(0.0),
        max: values.iter().copied().max().unwrap_or(0),
        min: values.iter().copied().min().unwrap_or(0),
    }
}

/// Standard deviation over the per-bucket means, not a combination of the
/// per-bucket deviations.
fn compute_variability(series: &[BucketedReading]) -> VariabilitySummary {
    let systolic: Vec<f64> = series.iter().map(|b| f64::from(b.systolic)).collect();
    let diastolic: Vec<f64> = series.iter().map(|b| f64::from(b.diastolic)).collect();
    let pulse: Vec<f64> = series.iter().map(|b| f64::from(b.pulse)).collect();

    VariabilitySummary {
        systolic_sd: round1(population_std_dev(&systolic)),
        diastolic_sd: round1(population_std_dev(&diastolic)),
        pulse_sd: round1(population_std_dev(&pulse)),
    }
}

fn compute_exceedance(series: &[BucketedReading], thresholds: &Thresholds) -> ThresholdExceedance {
    let total = series.len();
    let systolic_count = series
        .iter()
        .filter(|b| b.systolic > thresholds.systolic_limit)
        .count();
    let diastolic_count = series
        .iter()
        .filter(|b| b.diastolic > thresholds.diastolic_limit)
        .count();

    ThresholdExceedance {
        total,
        systolic_count,
        diastolic_count,
        systolic_pct: share_pct(systolic_count, total),
        diastolic_pct: share_pct(diastolic_count, total),
    }
}

fn compute_day_night(series: &[BucketedReading]) -> DayNightSummary {
    let day: Vec<&BucketedReading> = series.iter().filter(|b| is_day(b)).collect();
    let night: Vec<&BucketedReading> = series.iter().filter(|b| !is_day(b)).collect();

    let day_systolic = mean(&day.iter().map(|b| f64::from(b.systolic)).collect::<Vec<_>>());
    let night_systolic = mean(&night.iter().map(|b| f64::from(b.systolic)).collect::<Vec<_>>());
    let day_diastolic = mean(&day.iter().map(|b| f64::from(b.diastolic)).collect::<Vec<_>>());
    let night_diastolic = mean(&night.iter().map(|b| f64::from(b.diastolic)).collect::<Vec<_>>());

    // Percent differences come from the unrounded means; the dipper
    // comparison runs on the rounded values, so 9.96% qualifies as 10.0%.
    let systolic_diff_pct = percent_difference(day_systolic, night_systolic);
    let diastolic_diff_pct = percent_difference(day_diastolic, night_diastolic);
    let dipper = matches!(
        (systolic_diff_pct, diastolic_diff_pct),
        (Some(systolic), Some(diastolic)) if systolic >= 10.0 && diastolic >= 10.0
    );

    DayNightSummary {
        day_systolic_avg: day_systolic.map(round1),
        night_systolic_avg: night_systolic.map(round1),
        day_diastolic_avg: day_diastolic.map(round1),
        night_diastolic_avg: night_diastolic.map(round1),
        systolic_diff_pct,
        diastolic_diff_pct,
        dipper,
    }
}

fn percent_difference(day: Option<f64>, night: Option<f64>) -> Option<f64> {
    match (day, night) {
        (Some(day), Some(night)) => Some(round1((day - night) / night * 100.0)),
        _ => None,
    }
}

/// Classify one bucket into its clinical category.
///
/// Branch order matters and the first match wins: 135/95 satisfies both the
/// stage 1 and stage 2 conditions and lands in stage 1. Within the
/// parser-validated ranges the first four branches leave exactly
/// systolic >= 160 or diastolic >= 100, so the last arm is a plain else.
pub fn classify(systolic: u16, diastolic: u16) -> Category {
    if systolic < 120 && diastolic < 80 {
        Category::Normal
    } else if (120..=129).contains(&systolic) && diastolic < 80 {
        Category::Elevated
    } else if (130..=139).contains(&systolic) || (80..=89).contains(&diastolic) {
        Category::Stage1
    } else if (140..=159).contains(&systolic) || (90..=99).contains(&diastolic) {
        Category::Stage2
    } else {
        Category::Stage3
    }
}

fn compute_categories(series: &[BucketedReading]) -> CategoryBreakdown {
    let total = series.len();
    let mut counts = [0usize; 5];
    for bucket in series {
        let slot = match classify(bucket.systolic, bucket.diastolic) {
            Category::Normal => 0,
            Category::Elevated => 1,
            Category::Stage1 => 2,
            Category::Stage2 => 3,
            Category::Stage3 => 4,
        };
        counts[slot] += 1;
    }

    let count = |slot: usize| CategoryCount {
        count: counts[slot],
        pct: share_pct(counts[slot], total),
    };
    CategoryBreakdown {
        normal: count(0),
        elevated: count(1),
        stage1: count(2),
        stage2: count(3),
        stage3: count(4),
    }
}

fn compute_pressure_load(series: &[BucketedReading], thresholds: &Thresholds) -> PressureLoad {
    let day: Vec<&BucketedReading> = series.iter().filter(|b| is_day(b)).collect();
    let night: Vec<&BucketedReading> = series.iter().filter(|b| !is_day(b)).collect();

    let over_systolic = |b: &&BucketedReading| b.systolic > thresholds.systolic_limit;
    let over_diastolic = |b: &&BucketedReading| b.diastolic > thresholds.diastolic_limit;

    let systolic_count = series.iter().filter(|b| over_systolic(b)).count();
    let diastolic_count = series.iter().filter(|b| over_diastolic(b)).count();

    let partition_pct = |count: usize, total: usize| -> Option<f64> {
        if total == 0 {
            None
        } else {
            Some(share_pct(count, total))
        }
    };

    PressureLoad {
        total_pct: share_pct(systolic_count + diastolic_count, series.len() * 2),
        systolic_pct: share_pct(systolic_count, series.len()),
        diastolic_pct: share_pct(diastolic_count, series.len()),
        day_systolic_pct: partition_pct(day.iter().copied().filter(over_systolic).count(), day.len()),
        night_systolic_pct: partition_pct(
            night.iter().copied().filter(over_systolic).count(),
            night.len(),
        ),
        day_diastolic_pct: partition_pct(
            day.iter().copied().filter(over_diastolic).count(),
            day.len(),
        ),
        night_diastolic_pct: partition_pct(
            night.iter().copied().filter(over_diastolic).count(),
            night.len(),
        ),
    }
}

/// Per-date day/night means for dates covering both windows, ascending.
fn compute_daily_day_night(series: &[BucketedReading]) -> Vec<DailyDayNight> {
    struct DayGroup {
        day: Vec<(f64, f64)>,
        night: Vec<(f64, f64)>,
    }

    let mut by_date: BTreeMap<NaiveDate, DayGroup> = BTreeMap::new();
    for bucket in series {
        let group = by_date
            .entry(bucket.bucket_start.date())
            .or_insert_with(|| DayGroup {
                day: Vec::new(),
                night: Vec::new(),
            });
        let pair = (f64::from(bucket.systolic), f64::from(bucket.diastolic));
        if is_day(bucket) {
            group.day.push(pair);
        } else {
            group.night.push(pair);
        }
    }

    by_date
        .into_iter()
        .filter(|(_, group)| !group.day.is_empty() && !group.night.is_empty())
        .map(|(date, group)| {
            let avg = |pairs: &[(f64, f64)], pick: fn(&(f64, f64)) -> f64| {
                pairs.iter().map(pick).sum::<f64>() / pairs.len() as f64
            };
            let day_systolic = avg(&group.day, |p| p.0);
            let night_systolic = avg(&group.night, |p| p.0);
            let day_diastolic = avg(&group.day, |p| p.1);
            let night_diastolic = avg(&group.night, |p| p.1);

            DailyDayNight {
                date,
                day_systolic_avg: round1(day_systolic),
                night_systolic_avg: round1(night_systolic),
                day_diastolic_avg: round1(day_diastolic),
                night_diastolic_avg: round1(night_diastolic),
                systolic_diff: round1(day_systolic - night_systolic),
                diastolic_diff: round1(day_diastolic - night_diastolic),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn bucket_at(day: u32, hour: u32, systolic: u16, diastolic: u16, pulse: u16) -> BucketedReading {
        BucketedReading {
            bucket_start: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            systolic,
            diastolic,
            pulse,
            systolic_sd: 0.0,
            diastolic_sd: 0.0,
            pulse_sd: 0.0,
        }
    }

    /// The two-bucket profile: 150/95 at 08:00 and 110/70 at 20:00.
    fn two_bucket_series() -> Vec<BucketedReading> {
        vec![bucket_at(1, 8, 150, 95, 75), bucket_at(1, 20, 110, 70, 65)]
    }

    #[test]
    fn test_channel_summaries() {
        let stats = StatisticsBundle::compute(&two_bucket_series(), &Thresholds::default());

        assert_eq!(stats.systolic.average, 130.0);
        assert_eq!(stats.systolic.max, 150);
        assert_eq!(stats.systolic.min, 110);
        assert_eq!(stats.diastolic.average, 82.5);
        assert_eq!(stats.pulse.average, 70.0);
    }

    #[test]
    fn test_variability_over_bucket_means() {
        let stats = StatisticsBundle::compute(&two_bucket_series(), &Thresholds::default());

        assert_eq!(stats.variability.systolic_sd, 20.0);
        assert_eq!(stats.variability.diastolic_sd, 12.5);
        assert_eq!(stats.variability.pulse_sd, 5.0);
    }

    #[test]
    fn test_exceedance_with_default_thresholds() {
        let stats = StatisticsBundle::compute(&two_bucket_series(), &Thresholds::default());

        assert_eq!(stats.exceedance.total, 2);
        assert_eq!(stats.exceedance.systolic_count, 1);
        assert_eq!(stats.exceedance.diastolic_count, 1);
        assert_eq!(stats.exceedance.systolic_pct, 50.0);
        assert_eq!(stats.exceedance.diastolic_pct, 50.0);
    }

    #[test]
    fn test_exceedance_is_strict() {
        // Exactly at the limit does not count.
        let series = vec![bucket_at(1, 8, 140, 90, 70)];
        let stats = StatisticsBundle::compute(&series, &Thresholds::default());

        assert_eq!(stats.exceedance.systolic_count, 0);
        assert_eq!(stats.exceedance.diastolic_count, 0);
    }

    #[test]
    fn test_day_night_comparison() {
        let day_night = compute_day_night(&two_bucket_series());

        assert_eq!(day_night.day_systolic_avg, Some(150.0));
        assert_eq!(day_night.night_systolic_avg, Some(110.0));
        // (150 - 110) / 110 x 100 = 36.36...
        assert_eq!(day_night.systolic_diff_pct, Some(36.4));
        assert_eq!(day_night.diastolic_diff_pct, Some(35.7));
        assert!(day_night.dipper);
    }

    #[test]
    fn test_non_dipper_when_difference_small() {
        let series = vec![bucket_at(1, 8, 120, 80, 70), bucket_at(1, 20, 118, 79, 68)];
        let day_night = compute_day_night(&series);

        assert_eq!(day_night.systolic_diff_pct, Some(1.7));
        assert!(!day_night.dipper);
    }

    #[test]
    fn test_day_night_partition_boundaries() {
        let hours = [(5, false), (6, true), (17, true), (18, false), (23, false), (0, false)];
        for (hour, day) in hours {
            let bucket = bucket_at(1, hour, 120, 80, 70);
            assert_eq!(is_day(&bucket), day, "hour {hour}");
        }
    }

    #[test]
    fn test_day_night_partition_is_total() {
        // Every hour lands in exactly one partition.
        let series: Vec<BucketedReading> = (0..24)
            .map(|hour| {
                let systolic = if (6..18).contains(&hour) { 130 } else { 110 };
                bucket_at(1, hour, systolic, 80, 70)
            })
            .collect();
        let day_night = compute_day_night(&series);

        assert_eq!(day_night.day_systolic_avg, Some(130.0));
        assert_eq!(day_night.night_systolic_avg, Some(110.0));
    }

    #[test]
    fn test_empty_night_partition_disables_dipper() {
        let series = vec![bucket_at(1, 9, 150, 95, 75), bucket_at(1, 15, 110, 70, 65)];
        let day_night = compute_day_night(&series);

        assert_eq!(day_night.night_systolic_avg, None);
        assert_eq!(day_night.systolic_diff_pct, None);
        assert!(!day_night.dipper);
    }

    #[test]
    fn test_category_priority_prefers_stage1() {
        // 135/95 satisfies both the stage 1 and stage 2 conditions; the
        // earlier branch wins.
        assert_eq!(classify(135, 95), Category::Stage1);
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(classify(119, 79), Category::Normal);
        assert_eq!(classify(120, 79), Category::Elevated);
        assert_eq!(classify(129, 79), Category::Elevated);
        assert_eq!(classify(119, 80), Category::Stage1);
        assert_eq!(classify(130, 79), Category::Stage1);
        assert_eq!(classify(139, 89), Category::Stage1);
        assert_eq!(classify(140, 70), Category::Stage2);
        assert_eq!(classify(119, 99), Category::Stage2);
        assert_eq!(classify(160, 70), Category::Stage3);
        assert_eq!(classify(119, 100), Category::Stage3);
        assert_eq!(classify(250, 150), Category::Stage3);
    }

    #[test]
    fn test_categories_partition_the_series() {
        let series = vec![
            bucket_at(1, 8, 115, 75, 70),
            bucket_at(1, 9, 125, 78, 70),
            bucket_at(1, 10, 135, 95, 70),
            bucket_at(1, 11, 145, 92, 70),
            bucket_at(1, 12, 165, 105, 70),
            bucket_at(1, 13, 120, 80, 70),
            bucket_at(1, 20, 110, 100, 70),
        ];
        let categories = compute_categories(&series);

        let sum = categories.normal.count
            + categories.elevated.count
            + categories.stage1.count
            + categories.stage2.count
            + categories.stage3.count;
        assert_eq!(sum, series.len());
        assert_eq!(categories.stage1.count, 2);
        assert_eq!(categories.stage3.count, 2);
    }

    #[test]
    fn test_pressure_load() {
        let series = vec![
            bucket_at(1, 8, 150, 95, 75),
            bucket_at(1, 9, 120, 80, 70),
            bucket_at(1, 20, 110, 70, 65),
            bucket_at(1, 21, 145, 92, 68),
        ];
        let load = compute_pressure_load(&series, &Thresholds::default());

        assert_eq!(load.systolic_pct, 50.0);
        assert_eq!(load.diastolic_pct, 50.0);
        // (2 + 2) / (2 x 4) x 100
        assert_eq!(load.total_pct, 50.0);
        assert_eq!(load.day_systolic_pct, Some(50.0));
        assert_eq!(load.night_systolic_pct, Some(50.0));
    }

    #[test]
    fn test_pressure_load_empty_partition_is_undefined() {
        let series = vec![bucket_at(1, 8, 150, 95, 75)];
        let load = compute_pressure_load(&series, &Thresholds::default());

        assert_eq!(load.day_systolic_pct, Some(100.0));
        assert_eq!(load.night_systolic_pct, None);
        assert_eq!(load.night_diastolic_pct, None);
    }

    #[test]
    fn test_empty_series_is_all_zeroes() {
        let stats = StatisticsBundle::compute(&[], &Thresholds::default());

        assert_eq!(stats.systolic.average, 0.0);
        assert_eq!(stats.exceedance.total, 0);
        assert_eq!(stats.exceedance.systolic_pct, 0.0);
        assert_eq!(stats.load.total_pct, 0.0);
        assert_eq!(stats.day_night.day_systolic_avg, None);
        assert!(!stats.day_night.dipper);
        assert!(stats.daily_day_night.is_empty());
    }

    #[test]
    fn test_threshold_change_only_moves_threshold_dependent_outputs() {
        let series = two_bucket_series();
        let default = StatisticsBundle::compute(&series, &Thresholds::default());
        let tightened = StatisticsBundle::compute(
            &series,
            &Thresholds {
                systolic_limit: 120,
                diastolic_limit: 70,
            },
        );

        assert_eq!(default.systolic, tightened.systolic);
        assert_eq!(default.diastolic, tightened.diastolic);
        assert_eq!(default.pulse, tightened.pulse);
        assert_eq!(default.variability, tightened.variability);
        assert_eq!(default.day_night, tightened.day_night);
        assert_eq!(default.categories, tightened.categories);
        assert_eq!(default.daily_day_night, tightened.daily_day_night);

        assert_ne!(default.exceedance, tightened.exceedance);
        assert_ne!(default.load, tightened.load);
        assert_eq!(tightened.exceedance.systolic_count, 1);
        assert_eq!(tightened.exceedance.diastolic_count, 1);
    }

    #[test]
    fn test_daily_day_night_keeps_covered_dates_only() {
        let series = vec![
            // Jan 1 covers both windows
            bucket_at(1, 8, 150, 95, 75),
            bucket_at(1, 10, 140, 90, 72),
            bucket_at(1, 22, 110, 70, 65),
            // Jan 2 is daytime only
            bucket_at(2, 9, 130, 85, 70),
            // Jan 3 covers both windows
            bucket_at(3, 7, 125, 82, 70),
            bucket_at(3, 23, 115, 78, 66),
        ];
        let daily = compute_daily_day_night(&series);

        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(daily[0].day_systolic_avg, 145.0);
        assert_eq!(daily[0].night_systolic_avg, 110.0);
        assert_eq!(daily[0].systolic_diff, 35.0);
        assert_eq!(daily[0].diastolic_diff, 22.5);
        assert_eq!(daily[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(daily[1].systolic_diff, 10.0);
    }

    #[test]
    fn test_daily_day_night_difference_can_be_negative() {
        let series = vec![bucket_at(1, 8, 110, 70, 65), bucket_at(1, 20, 150, 95, 75)];
        let daily = compute_daily_day_night(&series);

        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].systolic_diff, -40.0);
    }

    #[test]
    fn test_mean_of_empty_slice_is_none() {
        let empty: [f64; 0] = [];
        assert_eq!(mean(&empty), None);
    }
}
