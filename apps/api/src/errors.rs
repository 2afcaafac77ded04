use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::platform::PlatformError;
use crate::review::flow::FlowError;
use crate::review::validation::UploadRejection;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Platform not ready")]
    NotReady,

    #[error("{0}")]
    Flow(#[from] FlowError),

    #[error("Platform error: {0}")]
    Platform(PlatformError),
}

impl From<PlatformError> for AppError {
    fn from(e: PlatformError) -> Self {
        match e {
            PlatformError::InvalidUsername(name) => {
                AppError::Validation(format!("Invalid username: {name}"))
            }
            err @ PlatformError::WeakPassword(_) => AppError::Validation(err.to_string()),
            err @ PlatformError::UsernameTaken(_) => AppError::Conflict(err.to_string()),
            PlatformError::InvalidCredentials => AppError::Unauthorized,
            other => AppError::Platform(other),
        }
    }
}

impl From<UploadRejection> for AppError {
    fn from(e: UploadRejection) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, detail) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid username or password".to_string(),
                None,
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None),
            AppError::NotReady => (
                StatusCode::SERVICE_UNAVAILABLE,
                "NOT_READY",
                "The service is still starting up".to_string(),
                None,
            ),
            AppError::Flow(e) => {
                tracing::error!(step = ?e.step, "Upload flow failed: {}", e.detail);
                (
                    StatusCode::BAD_GATEWAY,
                    "FLOW_ERROR",
                    e.step.message().to_string(),
                    Some(e.detail.clone()),
                )
            }
            AppError::Platform(e) => {
                tracing::error!("Platform error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PLATFORM_ERROR",
                    "A storage or AI service error occurred".to_string(),
                    Some(e.to_string()),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if cfg!(debug_assertions) {
            if let Some(detail) = detail {
                error["detail"] = json!(detail);
            }
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;
    use crate::review::flow::FailedStep;

    async fn body(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_flow_error_shows_fixed_message() {
        let (status, json) = body(AppError::Flow(FlowError {
            step: FailedStep::Conversion,
            detail: "mupdf exploded".into(),
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            json["error"]["message"],
            "Error: Failed to Convert PDF To Image"
        );
    }

    #[tokio::test]
    async fn test_invalid_username_is_a_validation_error() {
        let error = AppError::from(PlatformError::InvalidUsername("a b".into()));
        let (status, json) = body(error).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_platform_error_hides_cause_but_keeps_debug_detail() {
        let error = AppError::from(PlatformError::Storage("disk on fire".into()));
        let (status, json) = body(error).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["message"], "A storage or AI service error occurred");
        if cfg!(debug_assertions) {
            assert_eq!(json["error"]["detail"], "Storage error: disk on fire");
        }
    }

    #[tokio::test]
    async fn test_credential_errors_map_to_client_statuses() {
        let (status, json) = body(PlatformError::InvalidCredentials.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["code"], "UNAUTHORIZED");

        let (status, _) = body(PlatformError::UsernameTaken("alice".into()).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, json) = body(PlatformError::WeakPassword(8).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"]["message"].as_str().unwrap().contains('8'));
    }

    #[tokio::test]
    async fn test_rejection_message_names_the_limit() {
        let (status, json) = body(UploadRejection::TooLarge(21 * 1024 * 1024).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"]["message"].as_str().unwrap().contains("20 MB"));
    }
}
