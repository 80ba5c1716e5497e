//! Guidance generation
//!
//! This module maps the statistics bundle to an ordered list of
//! natural-language guidance strings. Every rule is evaluated
//! unconditionally and appends at most one message; the output order is
//! fixed regardless of which rules fire.

use crate::types::{
    ChannelSummary, DayNightSummary, PressureLoad, StatisticsBundle, VariabilitySummary,
};

/// Systolic standard deviation above which variability guidance fires (mmHg)
const SYSTOLIC_SD_LIMIT: f64 = 15.0;

/// Diastolic standard deviation above which variability guidance fires (mmHg)
const DIASTOLIC_SD_LIMIT: f64 = 10.0;

/// Load percentage above which load guidance fires
const LOAD_PCT_LIMIT: f64 = 25.0;

/// Generate the guidance list for one statistics bundle.
///
/// Rule order in the output is fixed: overall level, variability, circadian
/// rhythm, pressure load, pulse.
pub fn generate_advice(stats: &StatisticsBundle) -> Vec<String> {
    let mut advice = Vec::new();

    advice.push(overall_level_advice(&stats.systolic, &stats.diastolic));
    if let Some(message) = variability_advice(&stats.variability) {
        advice.push(message);
    }
    if let Some(message) = circadian_advice(&stats.day_night) {
        advice.push(message);
    }
    if let Some(message) = load_advice(&stats.load) {
        advice.push(message);
    }
    if let Some(message) = pulse_advice(&stats.pulse) {
        advice.push(message);
    }

    advice
}

/// Six mutually exclusive tiers keyed on the average systolic/diastolic.
///
/// The comparisons run on the averages themselves, so a value strictly
/// between two integer tier bounds (e.g. a 129.4 average with diastolic
/// below 80) matches no earlier tier and falls through to the last one.
fn overall_level_advice(systolic: &ChannelSummary, diastolic: &ChannelSummary) -> String {
    let sys = systolic.average;
    let dia = diastolic.average;

    let message = if sys < 120.0 && dia < 80.0 {
        "Your blood pressure is at a normal level. Keep up the healthy lifestyle."
    } else if (120.0..=129.0).contains(&sys) && dia < 80.0 {
        "Your blood pressure is elevated. Suggested actions: \
         1) cut down on dietary salt; 2) get more exercise; \
         3) maintain a healthy weight; 4) keep monitoring your blood pressure."
    } else if sys < 120.0 && (80.0..=89.0).contains(&dia) {
        "Your diastolic pressure is on the high side. Suggested actions: \
         1) cut down on dietary salt; 2) get more exercise; \
         3) maintain a healthy weight; 4) keep monitoring your blood pressure."
    } else if (130.0..=139.0).contains(&sys) || (80.0..=89.0).contains(&dia) {
        "Your readings indicate stage 1 hypertension. Suggested actions: \
         1) consult a doctor soon; 2) take antihypertensive medication as prescribed; \
         3) strictly manage diet and exercise; 4) measure your blood pressure daily."
    } else if (140.0..=159.0).contains(&sys) || (90.0..=99.0).contains(&dia) {
        "Your readings indicate stage 2 hypertension. Suggested actions: \
         1) seek medical care promptly; 2) follow your prescription strictly; \
         3) change your lifestyle; 4) watch your blood pressure closely."
    } else {
        "Your readings indicate stage 3 hypertension. Suggested actions: \
         1) seek medical care immediately; 2) inpatient treatment may be required; \
         3) follow your prescription strictly; \
         4) measure your blood pressure several times a day."
    };

    message.to_string()
}

fn variability_advice(variability: &VariabilitySummary) -> Option<String> {
    if variability.systolic_sd > SYSTOLIC_SD_LIMIT || variability.diastolic_sd > DIASTOLIC_SD_LIMIT
    {
        Some(
            "Your blood pressure fluctuates considerably. Suggested actions: \
             1) keep a regular daily routine; 2) avoid emotional agitation; \
             3) eat at regular times; 4) measure more frequently."
                .to_string(),
        )
    } else {
        None
    }
}

fn circadian_advice(day_night: &DayNightSummary) -> Option<String> {
    if day_night.dipper {
        None
    } else {
        Some(
            "Your blood pressure shows an abnormal circadian rhythm (non-dipper). \
             Suggested actions: 1) improve sleep quality; 2) avoid staying up late; \
             3) limit activity at night; \
             4) ask your doctor whether medication timing should change."
                .to_string(),
        )
    }
}

fn load_advice(load: &PressureLoad) -> Option<String> {
    if load.systolic_pct > LOAD_PCT_LIMIT || load.diastolic_pct > LOAD_PCT_LIMIT {
        Some(
            "Your blood pressure load is high. Suggested actions: \
             1) discuss adjusting medication dose or type with your doctor; \
             2) strengthen lifestyle interventions; 3) schedule regular follow-ups; \
             4) avoid strenuous exercise."
                .to_string(),
        )
    } else {
        None
    }
}

fn pulse_advice(pulse: &ChannelSummary) -> Option<String> {
    if pulse.average > 100.0 {
        Some(
            "Your average pulse is fast. Suggested actions: 1) keep calm; \
             2) avoid strenuous exercise; \
             3) ask your doctor whether a rate-control medication is needed."
                .to_string(),
        )
    } else if pulse.average < 60.0 {
        Some(
            "Your average pulse is slow. Suggested actions: \
             1) increase exercise moderately; \
             2) ask your doctor whether your blood-pressure medication needs adjusting."
                .to_string(),
        )
    } else {
        None
    }
}
