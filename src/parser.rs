//! CSV parsing
//!
//! This module turns raw monitor exports into validated readings:
//! - Header columns resolved against synonym lists (Chinese and English)
//! - Quote-aware line splitting
//! - Per-line date, number, and range validation
//!
//! A missing required column aborts the whole parse; a bad data line is
//! recorded as an error and the remaining lines still parse.

use crate::error::AnalysisError;
use crate::types::{LineError, ParseOutcome, Reading};
use chrono::{NaiveDateTime, SubsecRound};

/// Header synonyms for the date/time column
const DATE_SYNONYMS: &[&str] = &["日期", "date", "时间", "time", "测量时间", "测量日期"];

/// Header synonyms for the systolic column
const SYSTOLIC_SYNONYMS: &[&str] = &["高压", "high", "收缩压", "systolic", "收缩"];

/// Header synonyms for the diastolic column
const DIASTOLIC_SYNONYMS: &[&str] = &["低压", "low", "舒张压", "diastolic", "舒张"];

/// Header synonyms for the pulse column
const PULSE_SYNONYMS: &[&str] = &["脉搏", "pulse", "心率", "heart rate", "心跳"];

/// Accepted timestamp patterns, tried in order. A `,` millisecond separator
/// is normalized to `.` before matching, and `%.f` also matches no fraction.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];

/// Supported systolic range (mmHg)
const SYSTOLIC_RANGE: (u16, u16) = (60, 250);

/// Supported diastolic range (mmHg)
const DIASTOLIC_RANGE: (u16, u16) = (40, 150);

/// Supported pulse range (bpm)
const PULSE_RANGE: (u16, u16) = (40, 200);

/// Parser for raw CSV text
pub struct CsvParser;

impl CsvParser {
    /// Parse raw CSV/TSV text into validated readings plus per-line errors.
    ///
    /// The first line must be a header naming all four required columns;
    /// otherwise the parse fails with [`AnalysisError::MissingColumns`] and
    /// no readings are produced.
    pub fn parse(raw: &str) -> Result<ParseOutcome, AnalysisError> {
        let mut lines = raw.lines();
        let header = lines.next().unwrap_or("");
        let columns = resolve_columns(header)?;

        let mut readings = Vec::new();
        let mut errors = Vec::new();

        // Data starts on line 2; the header counts as line 1.
        for (index, line) in lines.enumerate() {
            let line_number = index + 2;
            if line.trim().is_empty() {
                continue;
            }

            match decode_line(line, &columns) {
                Ok(reading) => readings.push(reading),
                Err(message) => errors.push(LineError {
                    line: line_number,
                    content: line.to_string(),
                    message,
                }),
            }
        }

        Ok(ParseOutcome { readings, errors })
    }
}

/// Resolved 0-based column indexes of the four required fields
struct ColumnMap {
    date: usize,
    systolic: usize,
    diastolic: usize,
    pulse: usize,
}

impl ColumnMap {
    fn widest(&self) -> usize {
        self.date.max(self.systolic).max(self.diastolic).max(self.pulse)
    }
}

fn resolve_columns(header: &str) -> Result<ColumnMap, AnalysisError> {
    let headers: Vec<String> = header
        .split(|c: char| c == '\t' || c == ',')
        .map(|h| clean_field(h).to_lowercase())
        .collect();

    let date = find_column(&headers, DATE_SYNONYMS);
    let systolic = find_column(&headers, SYSTOLIC_SYNONYMS);
    let diastolic = find_column(&headers, DIASTOLIC_SYNONYMS);
    let pulse = find_column(&headers, PULSE_SYNONYMS);

    match (date, systolic, diastolic, pulse) {
        (Some(date), Some(systolic), Some(diastolic), Some(pulse)) => Ok(ColumnMap {
            date,
            systolic,
            diastolic,
            pulse,
        }),
        _ => {
            let mut missing = Vec::new();
            if date.is_none() {
                missing.push("date");
            }
            if systolic.is_none() {
                missing.push("systolic");
            }
            if diastolic.is_none() {
                missing.push("diastolic");
            }
            if pulse.is_none() {
                missing.push("pulse");
            }
            Err(AnalysisError::MissingColumns(missing.join(", ")))
        }
    }
}

/// Pick the first header containing any synonym, iterating synonyms in
/// declared order (case-insensitive substring match).
fn find_column(headers: &[String], synonyms: &[&str]) -> Option<usize> {
    for synonym in synonyms {
        let needle = synonym.to_lowercase();
        if let Some(index) = headers.iter().position(|h| h.contains(&needle)) {
            return Some(index);
        }
    }
    None
}

/// Split a data line on commas outside quote spans.
///
/// Any `"` or `'` toggles a single in-quotes flag and is dropped from the
/// field, so mismatched quote kinds still toggle state. Fields are trimmed.
fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' | '\'' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

/// Trim a field and strip one surrounding quote character of either kind.
fn clean_field(raw: &str) -> &str {
    let field = raw.trim();
    let field = field
        .strip_prefix('"')
        .or_else(|| field.strip_prefix('\''))
        .unwrap_or(field);
    field
        .strip_suffix('"')
        .or_else(|| field.strip_suffix('\''))
        .unwrap_or(field)
}

fn decode_line(line: &str, columns: &ColumnMap) -> Result<Reading, String> {
    let fields = split_line(line);
    if fields.len() <= columns.widest() {
        return Err(format!(
            "expected at least {} fields, found {}",
            columns.widest() + 1,
            fields.len()
        ));
    }

    let taken_at = parse_timestamp(&fields[columns.date])
        .ok_or_else(|| format!("unrecognized date format: {}", fields[columns.date]))?;
    let systolic = parse_channel("systolic", &fields[columns.systolic], SYSTOLIC_RANGE)?;
    let diastolic = parse_channel("diastolic", &fields[columns.diastolic], DIASTOLIC_RANGE)?;
    let pulse = parse_channel("pulse", &fields[columns.pulse], PULSE_RANGE)?;

    Ok(Reading {
        taken_at,
        systolic,
        diastolic,
        pulse,
    })
}

/// Try each accepted timestamp pattern in order. Fractional seconds are
/// accepted and then truncated to zero.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let normalized = clean_field(raw).replace(',', ".");
    for format in TIMESTAMP_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Some(parsed.trunc_subsecs(0));
        }
    }
    None
}

fn parse_channel(name: &str, raw: &str, range: (u16, u16)) -> Result<u16, String> {
    let value: u16 = clean_field(raw)
        .parse()
        .map_err(|_| format!("{name} is not a valid integer: {raw}"))?;
    let (min, max) = range;
    if value < min || value > max {
        return Err(format!(
            "{name} value {value} outside supported range {min}-{max}"
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_parse_english_header() {
        let csv = "Date,Systolic,Diastolic,Pulse\n2024-01-01 08:00:00,150,95,75\n";
        let outcome = CsvParser::parse(csv).unwrap();

        assert_eq!(outcome.errors.len(), 0);
        assert_eq!(outcome.readings.len(), 1);
        let reading = &outcome.readings[0];
        assert_eq!(reading.taken_at, at(2024, 1, 1, 8, 0, 0));
        assert_eq!(reading.systolic, 150);
        assert_eq!(reading.diastolic, 95);
        assert_eq!(reading.pulse, 75);
    }

    #[test]
    fn test_parse_chinese_header() {
        let csv = "测量时间,高压,低压,脉搏\n2024/1/1 8:05,120,80,66\n";
        let outcome = CsvParser::parse(csv).unwrap();

        assert_eq!(outcome.readings.len(), 1);
        assert_eq!(outcome.readings[0].taken_at, at(2024, 1, 1, 8, 5, 0));
    }

    #[test]
    fn test_header_synonym_substring_match() {
        // "measurement date" contains "date"; extra columns are ignored
        let csv = "id,measurement date,systolic (mmHg),diastolic (mmHg),pulse (bpm)\n\
                   1,2024-01-01 08:00,118,76,64\n";
        let outcome = CsvParser::parse(csv).unwrap();

        assert_eq!(outcome.readings.len(), 1);
        assert_eq!(outcome.readings[0].systolic, 118);
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let csv = "date,systolic,diastolic\n2024-01-01 08:00,120,80\n";
        let err = CsvParser::parse(csv).unwrap_err();

        match err {
            AnalysisError::MissingColumns(fields) => assert_eq!(fields, "pulse"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_timestamp_formats() {
        for raw in [
            "2024-01-01 08:00:00",
            "2024/01/01 08:00:00",
            "2024-1-1 8:0:0",
            "2024-01-01 08:00",
            "2024/1/1 8:00",
            "2024-01-01 08:00:00.123",
            "2024-01-01 08:00:00,123",
        ] {
            let parsed = parse_timestamp(raw);
            assert!(parsed.is_some(), "failed to parse {raw}");
            assert_eq!(parsed.unwrap().date(), at(2024, 1, 1, 8, 0, 0).date());
        }

        assert!(parse_timestamp("01/02/2024 08:00").is_none());
        assert!(parse_timestamp("2024-01-01").is_none());
        assert!(parse_timestamp("not a date").is_none());
    }

    #[test]
    fn test_fractional_seconds_truncated() {
        let parsed = parse_timestamp("2024-01-01 08:00:02.987").unwrap();
        assert_eq!(parsed, at(2024, 1, 1, 8, 0, 2));
    }

    #[test]
    fn test_quoted_fields() {
        // The timestamp carries a comma millisecond separator, so it must be
        // quoted to survive field splitting.
        let csv = "date,systolic,diastolic,pulse\n\
                   \"2024-01-01 08:00:00,500\",'150',\"95\",75\n";
        let outcome = CsvParser::parse(csv).unwrap();

        assert_eq!(outcome.errors.len(), 0);
        assert_eq!(outcome.readings.len(), 1);
        let reading = &outcome.readings[0];
        assert_eq!(reading.taken_at, at(2024, 1, 1, 8, 0, 0));
        assert_eq!(reading.systolic, 150);
        assert_eq!(reading.diastolic, 95);
    }

    #[test]
    fn test_out_of_range_line_rejected_others_kept() {
        let csv = "date,systolic,diastolic,pulse\n\
                   2024-01-01 08:00,150,95,75\n\
                   2024-01-01 08:10,300,95,75\n\
                   2024-01-01 08:20,110,70,65\n";
        let outcome = CsvParser::parse(csv).unwrap();

        assert_eq!(outcome.readings.len(), 2);
        assert_eq!(outcome.errors.len(), 1);
        let error = &outcome.errors[0];
        assert_eq!(error.line, 3);
        assert!(error.content.contains("300"));
        assert!(error.message.contains("systolic"));
        assert!(error.message.contains("60-250"));
    }

    #[test]
    fn test_range_invariants_hold_for_all_readings() {
        let csv = "date,systolic,diastolic,pulse\n\
                   2024-01-01 08:00,59,80,70\n\
                   2024-01-01 08:05,251,80,70\n\
                   2024-01-01 08:10,120,39,70\n\
                   2024-01-01 08:15,120,151,70\n\
                   2024-01-01 08:20,120,80,39\n\
                   2024-01-01 08:25,120,80,201\n\
                   2024-01-01 08:30,60,40,40\n\
                   2024-01-01 08:35,250,150,200\n";
        let outcome = CsvParser::parse(csv).unwrap();

        assert_eq!(outcome.readings.len(), 2);
        assert_eq!(outcome.errors.len(), 6);
        for reading in &outcome.readings {
            assert!((60..=250).contains(&reading.systolic));
            assert!((40..=150).contains(&reading.diastolic));
            assert!((40..=200).contains(&reading.pulse));
        }
    }

    #[test]
    fn test_non_numeric_field_is_line_error() {
        let csv = "date,systolic,diastolic,pulse\n2024-01-01 08:00,abc,95,75\n";
        let outcome = CsvParser::parse(csv).unwrap();

        assert_eq!(outcome.readings.len(), 0);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].message.contains("systolic"));
    }

    #[test]
    fn test_bad_date_is_line_error() {
        let csv = "date,systolic,diastolic,pulse\n01/02/2024,120,80,70\n";
        let outcome = CsvParser::parse(csv).unwrap();

        assert_eq!(outcome.readings.len(), 0);
        assert!(outcome.errors[0].message.contains("date format"));
    }

    #[test]
    fn test_blank_lines_skipped_silently() {
        let csv = "date,systolic,diastolic,pulse\n\n2024-01-01 08:00,120,80,70\n   \n";
        let outcome = CsvParser::parse(csv).unwrap();

        assert_eq!(outcome.readings.len(), 1);
        assert_eq!(outcome.errors.len(), 0);
    }

    #[test]
    fn test_short_line_is_line_error() {
        let csv = "date,systolic,diastolic,pulse\n2024-01-01 08:00,120\n";
        let outcome = CsvParser::parse(csv).unwrap();

        assert_eq!(outcome.readings.len(), 0);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].message.contains("fields"));
    }

    #[test]
    fn test_split_line_keeps_comma_inside_quotes() {
        let fields = split_line("\"a,b\",c, 'd' ");
        assert_eq!(fields, vec!["a,b", "c", "d"]);
    }
}
