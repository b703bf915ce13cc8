use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use super::types::FailureResponse;
use crate::error::MenuScanError;

/// Every failure the HTTP surface reports.
///
/// All variants map to the same response: 500 with `{ success: false,
/// message }`. Clients of the menu service only distinguish success from
/// failure.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Malformed upload: {0}")]
    Multipart(String),

    #[error(transparent)]
    Scan(#[from] MenuScanError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        tracing::error!("Request failed: {}", message);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(FailureResponse::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_error_is_a_500_with_message() {
        let response = ApiError::from(MenuScanError::NoMenuFile).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["message"].as_str().unwrap().contains("No menu file"));
    }
}
