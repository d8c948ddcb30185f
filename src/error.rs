use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ShortstackError {
    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Corpus store error: {0}")]
    CorpusStore(String),

    #[error("Vector index error: {0}")]
    VectorIndex(String),

    #[error("Snapshot store error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ShortstackError>;

impl From<std::io::Error> for ShortstackError {
    fn from(e: std::io::Error) -> Self {
        ShortstackError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for ShortstackError {
    fn from(e: serde_json::Error) -> Self {
        ShortstackError::Json(e.to_string())
    }
}

impl ShortstackError {
    /// HTTP status this error maps to. Malformed input is the caller's
    /// fault; failures reaching an external store are gateway problems;
    /// the rest is internal.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ShortstackError::TenantNotFound(_) => StatusCode::NOT_FOUND,
            ShortstackError::InvalidOperation(_) | ShortstackError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ShortstackError::CorpusStore(_) | ShortstackError::VectorIndex(_) => {
                StatusCode::BAD_GATEWAY
            }
            ShortstackError::Snapshot(_)
            | ShortstackError::Io(_)
            | ShortstackError::Json(_)
            | ShortstackError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Axum IntoResponse implementation (feature-gated)
#[cfg(feature = "axum-support")]
use axum::response::{IntoResponse, Json, Response};
#[cfg(feature = "axum-support")]
use serde::Serialize;

#[cfg(feature = "axum-support")]
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[cfg(feature = "axum-support")]
impl IntoResponse for ShortstackError {
    fn into_response(self) -> Response {
        let (error_code, suggestion) = match &self {
            ShortstackError::TenantNotFound(_) => (
                "tenant_not_found",
                Some("Send at least one mutation event for this tenant first".to_string()),
            ),
            ShortstackError::InvalidOperation(_) => (
                "invalid_operation",
                Some("Use \"ADD\" or \"DELETE\"".to_string()),
            ),
            ShortstackError::InvalidRequest(_) => ("invalid_request", None),
            ShortstackError::CorpusStore(_) => ("corpus_store_error", None),
            ShortstackError::VectorIndex(_) => ("vector_index_error", None),
            ShortstackError::Snapshot(_) => ("snapshot_error", None),
            ShortstackError::Io(_) => ("io_error", None),
            ShortstackError::Json(_) => ("json_error", None),
            ShortstackError::Config(_) => ("config_error", None),
        };

        let status = self.status_code();
        let body = ErrorResponse {
            error: error_code.to_string(),
            message: self.to_string(),
            suggestion,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_input_is_client_error() {
        assert_eq!(
            ShortstackError::InvalidOperation("UPSERT".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ShortstackError::InvalidRequest("tenant_id must not be empty".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn external_store_errors_are_bad_gateway() {
        assert_eq!(
            ShortstackError::CorpusStore("connection refused".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ShortstackError::VectorIndex("timeout".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[cfg(feature = "axum-support")]
    mod into_response_tests {
        use super::*;
        use axum::response::IntoResponse;

        #[test]
        fn into_response_status_matches_status_code_for_all_variants() {
            let errors: Vec<ShortstackError> = vec![
                ShortstackError::TenantNotFound("t".into()),
                ShortstackError::InvalidOperation("op".into()),
                ShortstackError::InvalidRequest("r".into()),
                ShortstackError::CorpusStore("e".into()),
                ShortstackError::VectorIndex("e".into()),
                ShortstackError::Snapshot("e".into()),
                ShortstackError::Io("e".into()),
                ShortstackError::Json("e".into()),
                ShortstackError::Config("e".into()),
            ];
            for e in errors {
                let expected = e.status_code();
                let actual = e.clone().into_response().status();
                assert_eq!(
                    actual, expected,
                    "into_response() status ({}) != status_code() ({}) for {:?}",
                    actual, expected, e
                );
            }
        }
    }
}
