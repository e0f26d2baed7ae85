//! API error handling
//!
//! Domain errors become structured responses keyed by their kind. Store and
//! other infrastructure failures are logged in full and answered with a
//! generic message.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use core_kernel::Money;
use domain_cashflow::CashflowError;
use domain_treasury::TreasuryError;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    NotFound { kind: &'static str, message: String },

    #[error("{message}")]
    Validation {
        kind: &'static str,
        message: String,
        remaining: Option<Money>,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound { kind, message } => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: kind.to_string(),
                    message,
                    remaining: None,
                    details: None,
                },
            ),
            ApiError::Validation {
                kind,
                message,
                remaining,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: kind.to_string(),
                    message,
                    remaining,
                    details: None,
                },
            ),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "bad_request".to_string(),
                    message,
                    remaining: None,
                    details: None,
                },
            ),
            ApiError::Unavailable(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse {
                    error: "service_unavailable".to_string(),
                    message,
                    remaining: None,
                    details: None,
                },
            ),
            ApiError::Internal(detail) => {
                error!(detail = %detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "internal_error".to_string(),
                        message: INTERNAL_MESSAGE.to_string(),
                        remaining: None,
                        details: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<TreasuryError> for ApiError {
    fn from(err: TreasuryError) -> Self {
        let kind = err.kind();
        if err.is_not_found() {
            ApiError::NotFound {
                kind,
                message: err.to_string(),
            }
        } else if err.is_validation() {
            ApiError::Validation {
                kind,
                remaining: err.remaining(),
                message: err.to_string(),
            }
        } else {
            match err {
                TreasuryError::TransientFailure { .. } | TreasuryError::LedgerWriteConflict => {
                    ApiError::Unavailable(err.to_string())
                }
                other => ApiError::Internal(other.to_string()),
            }
        }
    }
}

impl From<CashflowError> for ApiError {
    fn from(err: CashflowError) -> Self {
        if err.is_validation() {
            let kind = match err {
                CashflowError::InvalidPeriod(_) => "InvalidPeriod",
                _ => "InvalidHorizon",
            };
            ApiError::Validation {
                kind,
                message: err.to_string(),
                remaining: None,
            }
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::BadRequest(errors.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{Currency, PortError};
    use rust_decimal_macros::dec;

    #[test]
    fn test_treasury_error_mapping() {
        let not_found: ApiError = TreasuryError::BillNotFound("BILL-1".into()).into();
        assert!(matches!(not_found, ApiError::NotFound { kind: "BillNotFound", .. }));

        let over: ApiError = TreasuryError::OverpaymentRejected {
            remaining: Money::new(dec!(400), Currency::USD),
            attempted: Money::new(dec!(600), Currency::USD),
        }
        .into();
        match over {
            ApiError::Validation { kind, remaining, .. } => {
                assert_eq!(kind, "OverpaymentRejected");
                assert_eq!(remaining, Some(Money::new(dec!(400), Currency::USD)));
            }
            other => panic!("unexpected {other:?}"),
        }

        let transient: ApiError = TreasuryError::TransientFailure { attempts: 3 }.into();
        assert!(matches!(transient, ApiError::Unavailable(_)));

        let store: ApiError = TreasuryError::Store(PortError::internal("lock bills_pkey")).into();
        assert!(matches!(store, ApiError::Internal(_)));
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let response = ApiError::Internal("deadlock on bills_pkey in tx 991".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
