use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::geo::CoordinateField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingParameter {
    Page,
    Limit,
}

impl fmt::Display for PagingParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PagingParameter::Page => f.write_str("page"),
            PagingParameter::Limit => f.write_str("limit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingProblem {
    NotInteger,
    NotPositive,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("{0} is out of range")]
    CoordinateOutOfRange(CoordinateField),

    #[error("distance service credential is not configured")]
    MisconfiguredCredential,

    #[error("distance service unreachable: {0}")]
    ServiceUnreachable(String),

    #[error("no route found (route status {0})")]
    RouteNotFound(String),

    #[error("write failed: {0}")]
    WriteError(String),

    #[error("read failed: {0}")]
    ReadError(String),

    #[error("order {0} not found")]
    OrderNotFound(i64),

    #[error("order id {0:?} is not an integer")]
    InvalidOrderId(String),

    #[error("order {0} already taken")]
    AlreadyTaken(i64),

    #[error("invalid status value: {0:?}")]
    InvalidStatusValue(String),

    #[error("invalid {0} parameter: {1:?}")]
    InvalidPagingParameter(PagingParameter, PagingProblem),

    #[error("page {page} exceeds {total} pages")]
    PageOutOfRange { page: usize, total: usize },

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MalformedRequest(_)
            | AppError::CoordinateOutOfRange(_)
            | AppError::InvalidStatusValue(_)
            | AppError::InvalidPagingParameter(..)
            | AppError::PageOutOfRange { .. } => StatusCode::BAD_REQUEST,
            AppError::RouteNotFound(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::OrderNotFound(_) | AppError::InvalidOrderId(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyTaken(_) => StatusCode::CONFLICT,
            AppError::ServiceUnreachable(_) => StatusCode::BAD_GATEWAY,
            AppError::MisconfiguredCredential
            | AppError::WriteError(_)
            | AppError::ReadError(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to clients. Never includes the underlying cause.
    pub fn public_message(&self) -> String {
        match self {
            AppError::MalformedRequest(_) => "The format of the request body is wrong.".to_string(),
            AppError::CoordinateOutOfRange(field) => format!("{field} is not in the valid range."),
            AppError::MisconfiguredCredential => "Distance service is not configured.".to_string(),
            AppError::ServiceUnreachable(_) => "Distance service is unavailable.".to_string(),
            AppError::RouteNotFound(_) => {
                "No route found between origin and destination.".to_string()
            }
            AppError::WriteError(_) => "Failed to save order.".to_string(),
            AppError::ReadError(_) => "Failed to read orders.".to_string(),
            AppError::OrderNotFound(_) | AppError::InvalidOrderId(_) => {
                "Order does not exist.".to_string()
            }
            AppError::AlreadyTaken(_) => "Order has already been taken.".to_string(),
            AppError::InvalidStatusValue(_) => {
                "Status in request body is not in the correct value.".to_string()
            }
            AppError::InvalidPagingParameter(param, PagingProblem::NotInteger) => {
                format!("{param} is not a valid integer.")
            }
            AppError::InvalidPagingParameter(param, PagingProblem::NotPositive) => {
                format!("{param} must be a positive integer.")
            }
            AppError::PageOutOfRange { .. } => {
                "Page number exceeds total number of pages.".to_string()
            }
            AppError::Internal(_) => "Internal server error.".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let body = Json(json!({
            "error": self.public_message()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_message_names_the_field() {
        let err = AppError::CoordinateOutOfRange(CoordinateField::DestinationLongitude);
        assert_eq!(
            err.public_message(),
            "destination longitude is not in the valid range."
        );
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_causes_are_not_exposed() {
        let err = AppError::WriteError("UNIQUE constraint failed: orders.id".to_string());
        assert_eq!(err.public_message(), "Failed to save order.");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unparsable_order_id_reads_like_a_missing_order() {
        let missing = AppError::OrderNotFound(42);
        let unparsable = AppError::InvalidOrderId("abc".to_string());
        assert_eq!(unparsable.status_code(), missing.status_code());
        assert_eq!(unparsable.public_message(), missing.public_message());
    }

    #[test]
    fn paging_messages_name_the_parameter() {
        let err = AppError::InvalidPagingParameter(PagingParameter::Limit, PagingProblem::NotInteger);
        assert_eq!(err.public_message(), "limit is not a valid integer.");

        let err = AppError::InvalidPagingParameter(PagingParameter::Page, PagingProblem::NotPositive);
        assert_eq!(err.public_message(), "page must be a positive integer.");
    }
}
