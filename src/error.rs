use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::models::order::OrderStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("order is {0} and can no longer be edited")]
    OrderNotEditable(OrderStatus),

    #[error("order must keep at least one item; cancel it instead")]
    EmptyOrder,

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("menu suggestion unavailable: {0}")]
    SuggestionUnavailable(String),

    #[error("positioning denied")]
    PositioningDenied,

    #[error("positioning unavailable: {0}")]
    PositioningUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::EmptyOrder => StatusCode::BAD_REQUEST,
            AppError::InvalidTransition { .. } | AppError::OrderNotEditable(_) => {
                StatusCode::CONFLICT
            }
            AppError::PositioningDenied => StatusCode::FORBIDDEN,
            AppError::StoreUnavailable(_)
            | AppError::SuggestionUnavailable(_)
            | AppError::PositioningUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
