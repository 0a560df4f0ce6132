pub mod case;
pub mod file_utils;
pub mod utils;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use case::{
    Case, CaseFile, CasePage, CaseProcessingStatus, CaseReport, CaseStatus, Pagination,
    StatusFilter, UnknownStatus,
};
pub use file_utils::ValidationError;

/// `{ "case": {...} }` wrapper returned by upload and get-one
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CaseEnvelope {
    pub case: Case,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `GET /{id}/report`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ReportEnvelope {
    #[serde(deserialize_with = "utils::deserialize_id")]
    pub case_id: String,
    #[serde(default)]
    pub status: Option<CaseStatus>,
    pub report: Value,
    #[serde(default, with = "utils::timestamp_opt", skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<ReportEnvelope> for CaseReport {
    fn from(envelope: ReportEnvelope) -> Self {
        // Servers without an envelope timestamp still date the report body
        let generated_at = envelope.generated_at.or_else(|| {
            envelope
                .report
                .get("analysis_date")
                .and_then(Value::as_str)
                .and_then(|raw| utils::parse_timestamp(raw).ok())
        });
        CaseReport {
            case_id: envelope.case_id,
            status: envelope.status,
            report_data: envelope.report,
            generated_at,
        }
    }
}

/// Error body returned by the service on 4xx/5xx
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_extensions: Vec<String>,
}

/// Response from health check endpoint
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String, // "ok" when healthy
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_envelope_passes_payload_through() {
        let body = json!({
            "case_id": 3,
            "status": "completed",
            "report": {
                "summary": "placeholder",
                "analysis_date": "2024-05-02T08:00:00",
                "analysis": {"network_connections": [], "indicators_found": 0}
            }
        });
        let report: CaseReport = serde_json::from_value::<ReportEnvelope>(body.clone())
            .unwrap()
            .into();
        assert_eq!(report.case_id, "3");
        assert_eq!(report.status, Some(CaseStatus::Completed));
        assert_eq!(report.report_data, body["report"]);
        assert!(report.generated_at.is_some());
    }

    #[test]
    fn test_report_envelope_requires_report() {
        let body = json!({"case_id": 3, "status": "completed"});
        assert!(serde_json::from_value::<ReportEnvelope>(body).is_err());
    }

    #[test]
    fn test_report_without_dates() {
        let body = json!({"case_id": "3", "report": ["opaque", 1]});
        let report: CaseReport = serde_json::from_value::<ReportEnvelope>(body)
            .unwrap()
            .into();
        assert_eq!(report.generated_at, None);
        assert_eq!(report.status, None);
    }

    #[test]
    fn test_error_response_optional_extensions() {
        let parsed: ErrorResponse = serde_json::from_str(r#"{"error": "boom"}"#).unwrap();
        assert_eq!(parsed.error, "boom");
        assert!(parsed.allowed_extensions.is_empty());
    }
}
