use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Failure of a single API round trip. None of these are retried.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}{}", detail_suffix(.detail))]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {}", d)).unwrap_or_default()
}

/// FastAPI-style error envelope
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl ApiError {
    /// Build a status error from a non-2xx response body.
    /// Only a plain string `detail` is kept; validation arrays are dropped.
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let detail = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| match b.detail {
                serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            });

        ApiError::Status { status, detail }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            ApiError::Decode(_) => None,
        }
    }

    /// Backend-provided message for a 4xx business-rule rejection
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Status { status, detail } if status.is_client_error() => detail.as_deref(),
            _ => None,
        }
    }

    /// Message for the user: the backend detail if present, else `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail()
            .map(String::from)
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_extracted_from_400() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            br#"{"detail":"You already have a pending request for this object"}"#,
        );

        assert_eq!(
            err.detail(),
            Some("You already have a pending request for this object")
        );
        assert_eq!(
            err.user_message("Failed"),
            "You already have a pending request for this object"
        );
    }

    #[test]
    fn test_server_error_detail_not_surfaced() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, br#"{"detail":"db down"}"#);
        assert_eq!(err.detail(), None);
        assert_eq!(err.user_message("Failed to submit request"), "Failed to submit request");
    }

    #[test]
    fn test_unparseable_or_structured_detail_is_generic() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, b"<html>bad</html>");
        assert_eq!(err.detail(), None);

        let err = ApiError::from_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            br#"{"detail":[{"loc":["body","reason"],"msg":"field required"}]}"#,
        );
        assert_eq!(err.detail(), None);
        assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
    }

    #[test]
    fn test_display_includes_detail() {
        let err = ApiError::from_status(StatusCode::FORBIDDEN, br#"{"detail":"Admins only"}"#);
        assert_eq!(err.to_string(), "backend returned 403 Forbidden: Admins only");
    }
}
