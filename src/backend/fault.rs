use serde::Deserialize;
use thiserror::Error;

/// A failure during a single request to the remote backend.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct BackendFault {
    pub kind: FaultKind,
    pub message: String,
}

impl BackendFault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Network, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(FaultKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(FaultKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Auth, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(FaultKind::InvalidRequest, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(FaultKind::MalformedResponse, message)
    }

    pub fn empty_response() -> Self {
        Self::new(
            FaultKind::EmptyResponse,
            "The model returned a response without any text content",
        )
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Unknown, message)
    }

    /// Classifies a non-success HTTP status.
    pub fn from_status(status: reqwest::StatusCode, detail: &str) -> Self {
        match status.as_u16() {
            400 => Self::invalid_request(format!("Invalid request: {detail}")),
            401 | 403 => Self::auth(format!("Authentication failed: {detail}")),
            429 => Self::rate_limit(format!("Rate limit exceeded: {detail}")),
            500..=599 => Self::server_error(format!("Server error ({status}): {detail}")),
            _ => Self::unknown(format!("HTTP {status}: {detail}")),
        }
    }

    /// Classifies a transport-level error from reqwest.
    pub fn from_transport(err: &reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            Self::network(format!("Request to {url} timed out: {err}"))
        } else if err.is_connect() {
            Self::network(format!("Failed to connect to {url}: {err}"))
        } else {
            Self::unknown(format!("Request to {url} failed: {err}"))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Extracts the human-readable message from an `{"error":{"message":...}}`
/// body, falling back to the (truncated) raw body.
pub(crate) fn error_detail(body: &str) -> String {
    const MAX_RAW: usize = 300;

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.error.message;
    }

    let body = body.trim();
    if body.is_empty() {
        return "(empty response body)".to_string();
    }
    match body.char_indices().nth(MAX_RAW) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Fault classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Timeouts, refused connections, dropped bodies.
    Network,
    /// 429
    RateLimit,
    /// 5xx
    ServerError,
    /// 401, 403
    Auth,
    /// 400
    InvalidRequest,
    /// Body could not be decoded.
    MalformedResponse,
    /// Decoded fine but carried no text.
    EmptyResponse,
    Unknown,
}

impl FaultKind {
    /// Returns `true` if resending the same request may succeed.
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::RateLimit | Self::ServerError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_classification() {
        let cases = [
            (StatusCode::BAD_REQUEST, FaultKind::InvalidRequest),
            (StatusCode::UNAUTHORIZED, FaultKind::Auth),
            (StatusCode::FORBIDDEN, FaultKind::Auth),
            (StatusCode::TOO_MANY_REQUESTS, FaultKind::RateLimit),
            (StatusCode::INTERNAL_SERVER_ERROR, FaultKind::ServerError),
            (StatusCode::SERVICE_UNAVAILABLE, FaultKind::ServerError),
            (StatusCode::NOT_FOUND, FaultKind::Unknown),
        ];

        for (status, kind) in cases {
            assert_eq!(BackendFault::from_status(status, "detail").kind, kind);
        }
    }

    #[test]
    fn test_from_status_keeps_detail() {
        let fault = BackendFault::from_status(StatusCode::TOO_MANY_REQUESTS, "quota exhausted");
        assert!(fault.to_string().contains("quota exhausted"));
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(FaultKind::Network.is_retryable());
        assert!(FaultKind::RateLimit.is_retryable());
        assert!(FaultKind::ServerError.is_retryable());
        assert!(!FaultKind::Auth.is_retryable());
        assert!(!FaultKind::InvalidRequest.is_retryable());
        assert!(!FaultKind::MalformedResponse.is_retryable());
        assert!(!FaultKind::EmptyResponse.is_retryable());
    }

    #[test]
    fn test_error_detail_unwraps_json_error() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(error_detail(body), "Resource has been exhausted");
    }

    #[test]
    fn test_error_detail_falls_back_to_raw_body() {
        assert_eq!(error_detail("bad gateway"), "bad gateway");
        assert_eq!(error_detail("  "), "(empty response body)");
    }

    #[test]
    fn test_error_detail_truncates_long_bodies() {
        let body = "x".repeat(1000);
        let detail = error_detail(&body);
        assert!(detail.ends_with("..."));
        assert_eq!(detail.len(), 303);
    }

    #[test]
    fn test_empty_response_message() {
        let fault = BackendFault::empty_response();
        assert_eq!(fault.kind, FaultKind::EmptyResponse);
        assert!(!fault.to_string().is_empty());
    }
}
