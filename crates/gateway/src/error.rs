use {
    axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    tracing::error,
};

use parley_common::{ApiError, ApiResponse};

/// Response wrapper for `ApiError` so handlers can use `?`.
/// Internal detail goes to the logs; the client sees the generic
/// message and an error envelope.
pub struct AppError(pub ApiError);

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(source) = &self.0 {
            error!(error = %source, "request failed");
        }
        let status_code = self.0.status_code();
        let status =
            StatusCode::from_u16(status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ApiResponse::error(status_code, self.0.to_string());
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
