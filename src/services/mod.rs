//! Services Layer
//!
//! Business workflows, independent of HTTP. Each takes the connection, the
//! caller's [`Session`](crate::domain::Session) and the current instant, so
//! handlers and tests drive them the same way.

pub mod account_service;
pub mod attendance_service;
pub mod badge_service;
pub mod chat_service;
pub mod error;
pub mod event_service;
pub mod feedback_service;
pub mod geo;
pub mod leaderboard_service;
pub mod network_service;
pub mod notification_service;
pub mod qr;
pub mod quest_service;
pub mod quiz_service;
pub mod registration_service;
pub mod reward_service;

pub use error::ServiceError;
