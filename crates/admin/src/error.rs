//! Unified error handling for admin.
//!
//! Handlers return `Result<T, AppError>`. Responses carry a JSON body
//! `{"error": "..."}`; conflicts add a machine-readable `code`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::etl::{EtlCounts, EtlError, Stage, Step};

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Repository operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// ETL stage failed and was rolled back.
    #[error("ETL error: {0}")]
    Etl(#[from] EtlError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or wrong API token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
}

/// Body of a failed ETL run. The stage was rolled back; `completed` holds
/// the counts of the steps that finished first.
#[derive(Debug, Serialize)]
struct EtlErrorBody {
    error: String,
    stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<Step>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed: Option<EtlCounts>,
}

impl From<&EtlError> for EtlErrorBody {
    fn from(err: &EtlError) -> Self {
        Self {
            error: err.summary(),
            stage: err.stage(),
            step: err.failed_step(),
            completed: err.completed(),
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::Validation(_) => StatusCode::BAD_REQUEST,
                RepositoryError::NotFound(_) => StatusCode::NOT_FOUND,
                RepositoryError::Conflict { .. } => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Etl(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        if let Self::Etl(err) = &self {
            return (status, Json(EtlErrorBody::from(err))).into_response();
        }

        // Don't expose internal error details to clients
        let (message, code) = match &self {
            _ if status.is_server_error() => ("Internal server error".to_string(), None),
            Self::Database(RepositoryError::Conflict { code, message }) => {
                (message.clone(), Some(*code))
            }
            Self::Database(RepositoryError::NotFound(what)) | Self::NotFound(what) => {
                (format!("{what} not found"), None)
            }
            Self::Database(err) => (err.to_string(), None),
            Self::Unauthorized(msg) | Self::BadRequest(msg) => (msg.clone(), None),
            Self::Etl(_) | Self::Internal(_) => (self.to_string(), None),
        };

        let body = ErrorBody {
            error: &message,
            code,
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;
    use crate::db::conflict_code;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        (
            status,
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null),
        )
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order-123".to_string());
        assert_eq!(err.to_string(), "Not found: order-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(RepositoryError::Validation("bad".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(RepositoryError::NotFound("order 1".to_string()).into()),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_conflict_body_carries_code() {
        let err: AppError =
            RepositoryError::conflict(conflict_code::CATEGORY_IN_USE, "category in use").into();
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "category in use");
        assert_eq!(body["code"], "CATEGORY_IN_USE");
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let err: AppError = RepositoryError::DataCorruption("order 9: bad status".into()).into();
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert!(body.get("code").is_none());
    }

    #[tokio::test]
    async fn test_etl_failure_reports_completed_counts() {
        let err: AppError = EtlError::Step {
            stage: Stage::Staging,
            step: Step::Dates,
            completed: EtlCounts {
                customers: 4,
                products: 2,
                ..EtlCounts::default()
            },
            source: sqlx::Error::PoolTimedOut,
        }
        .into();
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "staging ETL failed at dim_date");
        assert_eq!(body["stage"], "staging");
        assert_eq!(body["step"], "dim_date");
        assert_eq!(body["completed"]["clientesInserted"], 4);
        assert_eq!(body["completed"]["productosInserted"], 2);
        assert_eq!(body["completed"]["fechasInserted"], 0);
        assert_eq!(body["completed"]["ventasInserted"], 0);
    }

    #[tokio::test]
    async fn test_etl_begin_failure_has_no_counts() {
        let err: AppError = EtlError::Begin {
            stage: Stage::Warehouse,
            source: sqlx::Error::PoolTimedOut,
        }
        .into();
        let (_, body) = body_json(err).await;

        assert_eq!(body["error"], "warehouse ETL could not start");
        assert!(body.get("completed").is_none());
        assert!(body.get("step").is_none());
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let (status, body) = body_json(AppError::NotFound("order 7".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "order 7 not found");
    }
}
