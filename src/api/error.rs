//! HTTP mapping for service errors

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::services::ServiceError;

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::PaymentProofTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ServiceError::Conflict(_)
            | ServiceError::AlreadyRegistered
            | ServiceError::AlreadyAttended
            | ServiceError::AlreadyConnected
            | ServiceError::AlreadySubmitted
            | ServiceError::AlreadyClaimed => StatusCode::CONFLICT,
            ServiceError::InvalidState(_)
            | ServiceError::RegistrationClosed
            | ServiceError::EventFull
            | ServiceError::FacultyRestricted
            | ServiceError::YearRestricted
            | ServiceError::PaymentProofRequired
            | ServiceError::NotRegistered
            | ServiceError::QrInvalid
            | ServiceError::QrExpired
            | ServiceError::QrWrongEvent
            | ServiceError::QrWrongKind
            | ServiceError::OutOfRange { .. }
            | ServiceError::SelfScan
            | ServiceError::PeerNotRegistered
            | ServiceError::NotCompleted => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if let ServiceError::Database(detail) = &self {
            tracing::error!("Database error: {}", detail);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(json!({ "error": message, "code": self.code() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_rules_are_unprocessable() {
        assert_eq!(
            ServiceError::EventFull.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::AlreadyClaimed.status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::PaymentProofTooLarge { size: 2, max: 1 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
