use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One captured HTTP request, the unit moved through the pipeline.
///
/// Built once at request completion and never mutated afterwards except
/// for the enrichment step filling `file_content_json`; a record is
/// either persisted whole or dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLogRecord {
    /// Correlation identifier, generated before any processing begins.
    /// Also exposed to handlers via the `RequestId` extension.
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub query_string: String,
    pub status_code: u16,
    pub remote_ip: String,
    pub user_agent: String,
    /// Elapsed wall-clock seconds for the whole request.
    pub request_time: f64,
    /// Completion timestamp.
    pub created_at: DateTime<Utc>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    /// Uploaded file content: the parsed JSON document, or a wrapped
    /// error object when the upload was not valid JSON.
    pub file_content_json: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_preserves_optional_fields() {
        let rec = RequestLogRecord {
            request_id: "req-1".into(),
            method: "POST".into(),
            path: "/roles".into(),
            query_string: String::new(),
            status_code: 200,
            remote_ip: "10.0.0.1".into(),
            user_agent: "wechat/8".into(),
            request_time: 0.042,
            created_at: Utc::now(),
            file_name: Some("card.json".into()),
            file_size: Some(128),
            file_content_json: Some(serde_json::json!({"a": 1})),
        };
        let json = serde_json::to_string(&rec).unwrap();
        let decoded: RequestLogRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.request_id, "req-1");
        assert_eq!(decoded.file_size, Some(128));
        assert_eq!(decoded.file_content_json.unwrap()["a"], 1);
    }

    #[test]
    fn no_upload_serialises_nulls() {
        let rec = RequestLogRecord {
            request_id: "req-2".into(),
            method: "GET".into(),
            path: "/books".into(),
            query_string: "page=1".into(),
            status_code: 200,
            remote_ip: String::new(),
            user_agent: String::new(),
            request_time: 0.001,
            created_at: Utc::now(),
            file_name: None,
            file_size: None,
            file_content_json: None,
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert!(json["file_name"].is_null());
        assert!(json["file_size"].is_null());
        assert!(json["file_content_json"].is_null());
    }
}
