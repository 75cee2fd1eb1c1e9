//! Error types for the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::provider::ProviderError;
use crate::screener::QueryError;

/// Errors returned by request handlers.
///
/// Every variant renders as `{"error": message}`; only the status differs.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The provider was disabled at startup.
    #[error("{0} package not installed")]
    NotInstalled(&'static str),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Request timed out")]
    Timeout,

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotInstalled(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Query(e) if e.is_upstream() => StatusCode::BAD_GATEWAY,
            ApiError::Query(_) => StatusCode::BAD_REQUEST,
            ApiError::Provider(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status == StatusCode::BAD_GATEWAY {
            tracing::warn!(error = %message, "Upstream provider failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %message, "Request rejected");
        }

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ApiError::NotInstalled("screener").to_string(),
            "screener package not installed"
        );
        assert_eq!(
            ApiError::Query(QueryError::UnknownField("foo".into())).to_string(),
            "Unknown column: foo"
        );
    }

    #[test]
    fn test_status_by_kind() {
        assert_eq!(
            ApiError::NotInstalled("ticker").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::InvalidRequest("missing".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::PayloadTooLarge.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(ApiError::Timeout.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            ApiError::Query(QueryError::UnknownOperator("~".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Query(QueryError::Provider(ProviderError::Network("down".into()))).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Provider(ProviderError::Decode("eof".into())).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_error_into_response() {
        let response = ApiError::NotInstalled("ticker").into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "ticker package not installed"})
        );
    }
}
