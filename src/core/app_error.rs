use axum::{
    Json,
    extract::{multipart::MultipartRejection, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::store::StoreError;

/// Uniform response envelope shared by every endpoint.
#[derive(Serialize, Debug, ToSchema)]
pub struct StdResponse<T, M> {
    pub status: u16,
    pub data: Option<T>,
    pub message: Option<M>,
}

impl<T, M> StdResponse<T, M> {
    pub fn ok(data: T, message: M) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            data: Some(data),
            message: Some(message),
        }
    }

    pub fn created(data: T, message: M) -> Self {
        Self {
            status: StatusCode::CREATED.as_u16(),
            data: Some(data),
            message: Some(message),
        }
    }

    /// A 200 carrying only a message.
    pub fn empty(message: M) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            data: None,
            message: Some(message),
        }
    }
}

impl<T: Serialize, M: Serialize> IntoResponse for StdResponse<T, M> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    ForbiddenResource(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// The target is in a state that no longer accepts the operation.
    #[error("{0}")]
    ImmutableState(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::ImmutableState(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::ForbiddenResource(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => AppError::Conflict(message),
            StoreError::OrderDone => AppError::ImmutableState(StoreError::OrderDone.to_string()),
            StoreError::InsufficientStock { product_name } => {
                AppError::BadRequest(format!("Not enough stock for {}", product_name))
            }
            StoreError::Backend(err) => AppError::Other(err),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Other(err) => {
                tracing::error!(error = ?err, "Request failed with an internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        StdResponse::<(), String> {
            status: status.as_u16(),
            data: None,
            message: Some(message),
        }
        .into_response()
    }
}
