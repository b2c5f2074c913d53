//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use aurum_core::{CartError, CatalogError, ChargeStatus, LineId, PaymentIntentId, PricingError};

use crate::collaborators::{CatalogStoreError, OrderWriteError, PaymentError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Selection could not be priced or the cart cannot be checked out.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Catalog data breaks a list invariant.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Cart mutation referenced a missing line.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Catalog read failed.
    #[error("Catalog error: {0}")]
    CatalogStore(#[from] CatalogStoreError),

    /// Payment gateway call failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Order write failed.
    #[error("Order error: {0}")]
    OrderWrite(#[from] OrderWriteError),

    /// The charge intent has not been paid.
    #[error("Payment not completed (status: {0})")]
    PaymentIncomplete(ChargeStatus),

    /// The charged amount differs from the current quote.
    #[error("Payment amount {actual} does not match order total {expected}")]
    PaymentMismatch { expected: Decimal, actual: Decimal },

    /// The charge intent was not created for this session's checkout.
    #[error("Payment {0} does not belong to this checkout")]
    ForeignPayment(PaymentIntentId),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Session store failure.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    incomplete_line_ids: Option<Vec<LineId>>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Pricing(PricingError::IncompleteCartLine { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Pricing(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Catalog(CatalogError::IndexOutOfRange { .. }) => StatusCode::BAD_REQUEST,
            Self::Catalog(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Cart(CartError::LineNotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Payment(PaymentError::InvalidIntentId(_)) => StatusCode::BAD_REQUEST,
            Self::OrderWrite(OrderWriteError::DuplicatePayment(_)) | Self::ForeignPayment(_) => {
                StatusCode::CONFLICT
            }
            Self::CatalogStore(_) | Self::Payment(_) | Self::OrderWrite(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::PaymentIncomplete(_) => StatusCode::PAYMENT_REQUIRED,
            Self::PaymentMismatch { .. } => StatusCode::CONFLICT,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn is_reportable(&self) -> bool {
        matches!(
            self,
            Self::OrderWrite(OrderWriteError::DuplicatePayment(_))
                | Self::ForeignPayment(_)
                | Self::CatalogStore(_)
                | Self::Payment(_)
                | Self::OrderWrite(_)
                | Self::PaymentMismatch { .. }
                | Self::Session(_)
                | Self::Internal(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server and collaborator errors to Sentry
        if self.is_reportable() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let error = match &self {
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Payment(PaymentError::InvalidIntentId(_))
            | Self::OrderWrite(OrderWriteError::DuplicatePayment(_)) => self.to_string(),
            Self::CatalogStore(_) | Self::Payment(_) | Self::OrderWrite(_) => {
                "External service error".to_string()
            }
            _ => self.to_string(),
        };

        let incomplete_line_ids = match self {
            Self::Pricing(PricingError::IncompleteCartLine { line_ids }) => Some(line_ids),
            _ => None,
        };

        (
            status,
            Json(ErrorBody {
                error,
                incomplete_line_ids,
            }),
        )
            .into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
