//! Error type shared by the workflow services

use std::fmt;

use crate::domain::DomainError;

/// Error type for service operations
///
/// Business-rule rejections get their own variant so callers can show the
/// matching failure message instead of a generic error.
#[derive(Debug)]
pub enum ServiceError {
    Database(String),
    NotFound(&'static str),
    Validation(String),
    Unauthorized(String),
    Forbidden,
    Conflict(String),
    InvalidState(String),

    // Registration
    RegistrationClosed,
    EventFull,
    FacultyRestricted,
    YearRestricted,
    PaymentProofRequired,
    PaymentProofTooLarge { size: usize, max: usize },
    AlreadyRegistered,
    NotRegistered,

    // Check-in and networking scans
    QrInvalid,
    QrExpired,
    QrWrongEvent,
    QrWrongKind,
    OutOfRange { distance_m: f64, radius_m: f64 },
    AlreadyAttended,
    SelfScan,
    PeerNotRegistered,
    AlreadyConnected,

    // Quests and rewards
    AlreadySubmitted,
    NotCompleted,
    AlreadyClaimed,
}

impl ServiceError {
    /// Stable machine-readable code, used by the API layer
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Database(_) => "database_error",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Validation(_) => "validation_error",
            ServiceError::Unauthorized(_) => "unauthorized",
            ServiceError::Forbidden => "forbidden",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::InvalidState(_) => "invalid_state",
            ServiceError::RegistrationClosed => "registration_closed",
            ServiceError::EventFull => "event_full",
            ServiceError::FacultyRestricted => "faculty_restricted",
            ServiceError::YearRestricted => "year_restricted",
            ServiceError::PaymentProofRequired => "payment_proof_required",
            ServiceError::PaymentProofTooLarge { .. } => "payment_proof_too_large",
            ServiceError::AlreadyRegistered => "already_registered",
            ServiceError::NotRegistered => "not_registered",
            ServiceError::QrInvalid => "qr_invalid",
            ServiceError::QrExpired => "qr_expired",
            ServiceError::QrWrongEvent => "qr_wrong_event",
            ServiceError::QrWrongKind => "qr_wrong_kind",
            ServiceError::OutOfRange { .. } => "out_of_range",
            ServiceError::AlreadyAttended => "already_attended",
            ServiceError::SelfScan => "self_scan",
            ServiceError::PeerNotRegistered => "peer_not_registered",
            ServiceError::AlreadyConnected => "already_connected",
            ServiceError::AlreadySubmitted => "already_submitted",
            ServiceError::NotCompleted => "not_completed",
            ServiceError::AlreadyClaimed => "already_claimed",
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Database(msg) => write!(f, "Database error: {}", msg),
            ServiceError::NotFound(what) => write!(f, "{} not found", what),
            ServiceError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ServiceError::Unauthorized(msg) => write!(f, "{}", msg),
            ServiceError::Forbidden => write!(f, "You are not allowed to do that"),
            ServiceError::Conflict(msg) => write!(f, "{}", msg),
            ServiceError::InvalidState(msg) => write!(f, "{}", msg),
            ServiceError::RegistrationClosed => write!(f, "Registration for this event has closed"),
            ServiceError::EventFull => write!(f, "Maximum capacity reached"),
            ServiceError::FacultyRestricted => {
                write!(f, "This event is restricted to other faculties")
            }
            ServiceError::YearRestricted => {
                write!(f, "This event is restricted to other years of study")
            }
            ServiceError::PaymentProofRequired => {
                write!(f, "Proof of payment is required for this event")
            }
            ServiceError::PaymentProofTooLarge { size, max } => write!(
                f,
                "Proof of payment is {} bytes, the limit is {} bytes",
                size, max
            ),
            ServiceError::AlreadyRegistered => write!(f, "You are already registered"),
            ServiceError::NotRegistered => write!(f, "You are not registered for this event"),
            ServiceError::QrInvalid => write!(f, "This QR code is not recognised"),
            ServiceError::QrExpired => write!(f, "This QR code has expired, scan a fresh one"),
            ServiceError::QrWrongEvent => write!(f, "This QR code belongs to another event"),
            ServiceError::QrWrongKind => write!(f, "This QR code cannot be used here"),
            ServiceError::OutOfRange {
                distance_m,
                radius_m,
            } => write!(
                f,
                "You are {:.0}m from the venue, move within {:.0}m",
                distance_m, radius_m
            ),
            ServiceError::AlreadyAttended => write!(f, "Attendance already recorded"),
            ServiceError::SelfScan => write!(f, "You cannot connect with yourself"),
            ServiceError::PeerNotRegistered => {
                write!(f, "That attendee is not registered for this event")
            }
            ServiceError::AlreadyConnected => write!(f, "You are already connected"),
            ServiceError::AlreadySubmitted => write!(f, "Already submitted"),
            ServiceError::NotCompleted => write!(f, "Quest is not completed yet"),
            ServiceError::AlreadyClaimed => write!(f, "Reward already claimed"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self {
        ServiceError::Database(e.to_string())
    }
}

impl From<DomainError> for ServiceError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound => ServiceError::NotFound("Resource"),
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::Database(msg) => ServiceError::Database(msg),
            DomainError::Corrupt(msg) => ServiceError::Database(msg),
        }
    }
}
