//! Wire types shared by the REST endpoints.

use serde::{Deserialize, Serialize};

/// Envelope code carried by every successful JSON response.
pub const SUCCESS_CODE: i64 = 200;

/// Standard JSON envelope wrapping every non-binary response.
///
/// `code` is 200 on success; any other value is an application-level error
/// whose human-readable cause, when the server provides one, is in `msg`.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

/// A named collection of uploaded documents used as retrieval context.
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeBase {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub doc_count: u64,
    #[serde(default)]
    pub created_at: String,
}

/// Parse lifecycle of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl DocumentStatus {
    /// Whether parsing has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentStatus::Completed | DocumentStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
            DocumentStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One document inside a knowledge base.
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub file_size: u64,
    pub status: DocumentStatus,
    #[serde(default)]
    pub chunk_count: u64,
    #[serde(default)]
    pub created_at: String,
}

/// One company known to the report backend.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanySummary {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
}

/// Record counts acknowledged by the carbon-data import endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub company: String,
    pub daily_records: u64,
    pub scope2_records: u64,
    pub scope3_dimensions: u64,
    pub satellite_records: u64,
}

/// Raw bytes from a binary-download endpoint, plus the server-suggested
/// filename when the `Content-Disposition` header carried one.
#[derive(Debug)]
pub struct DownloadedFile {
    pub filename: Option<String>,
    pub bytes: bytes::Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_with_data() {
        let json = r#"{"code":200,"msg":"ok","data":[1,2,3]}"#;
        let envelope: Envelope<Vec<i64>> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.code, SUCCESS_CODE);
        assert_eq!(envelope.msg.as_deref(), Some("ok"));
        assert_eq!(envelope.data, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_envelope_without_optional_fields() {
        let json = r#"{"code":500}"#;
        let envelope: Envelope<Vec<i64>> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.code, 500);
        assert!(envelope.msg.is_none());
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_document_status_parsing() {
        let doc: Document = serde_json::from_str(
            r#"{"id":7,"name":"manual.pdf","status":"processing"}"#,
        )
        .unwrap();
        assert_eq!(doc.status, DocumentStatus::Processing);
        assert!(!doc.status.is_terminal());
        assert_eq!(doc.file_size, 0);
    }

    #[test]
    fn test_document_status_unknown_value_is_tolerated() {
        let doc: Document =
            serde_json::from_str(r#"{"id":7,"name":"manual.pdf","status":"queued"}"#).unwrap();
        assert_eq!(doc.status, DocumentStatus::Unknown);
        assert!(!doc.status.is_terminal());
    }

    #[test]
    fn test_document_status_terminality() {
        assert!(DocumentStatus::Completed.is_terminal());
        assert!(DocumentStatus::Failed.is_terminal());
        assert!(!DocumentStatus::Pending.is_terminal());
    }

    #[test]
    fn test_import_summary_field_names() {
        let json = r#"{
            "company": "示例企业",
            "dailyRecords": 366,
            "scope2Records": 1,
            "scope3Dimensions": 4,
            "satelliteRecords": 800
        }"#;
        let summary: ImportSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.company, "示例企业");
        assert_eq!(summary.daily_records, 366);
        assert_eq!(summary.scope2_records, 1);
        assert_eq!(summary.scope3_dimensions, 4);
        assert_eq!(summary.satellite_records, 800);
    }
}
