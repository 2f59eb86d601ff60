use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, ProxyError>;

/// Proxy failure taxonomy.
///
/// Client-input problems surface as 400 before any origin traffic; origin
/// failures echo the origin's status when one exists, else 502.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("url is required")]
    MissingUrl,

    #[error("invalid target URL: {0}")]
    InvalidTarget(String),

    #[error("origin fetch failed: {0}")]
    OriginFetch(#[from] reqwest::Error),
}

impl ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::MissingUrl | ProxyError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            ProxyError::OriginFetch(e) => e
                .status()
                .and_then(|s| StatusCode::from_u16(s.as_u16()).ok())
                .unwrap_or(StatusCode::BAD_GATEWAY),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        error!("Request failed ({}): {}", status, self);

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_url_maps_to_400() {
        assert_eq!(ProxyError::MissingUrl.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_target_maps_to_400() {
        let err = ProxyError::InvalidTarget("ftp scheme".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_url_message_matches_api_contract() {
        assert_eq!(ProxyError::MissingUrl.to_string(), "url is required");
    }
}
