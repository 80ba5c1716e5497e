//! Report encoding
//!
//! This module encodes a finished analysis into the versioned payload
//! consumed by rendering collaborators (charts, tables, PDF composer).
//! The payload is plain data; no presentation logic lives here.

use crate::error::AnalysisError;
use crate::types::{Analysis, ReportPayload, ReportProducer};
use crate::{PRODUCER_NAME, TENSIO_VERSION};
use chrono::Utc;
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "bp.report.v1";

/// Encoder for producing versioned report payloads
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode an analysis into a report payload
    pub fn encode(&self, analysis: &Analysis) -> ReportPayload {
        let producer = ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: TENSIO_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        ReportPayload {
            report_version: REPORT_VERSION.to_string(),
            producer,
            generated_at_utc: Utc::now().to_rfc3339(),
            thresholds: analysis.thresholds,
            reading_count: analysis.reading_count,
            bucket_count: analysis.series.len(),
            series: analysis.series.clone(),
            statistics: analysis.statistics.clone(),
            advice: analysis.advice.clone(),
            line_errors: analysis.errors.clone(),
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(&self, analysis: &Analysis) -> Result<String, AnalysisError> {
        let payload = self.encode(analysis);
        serde_json::to_string_pretty(&payload).map_err(AnalysisError::JsonError)
    }
}
