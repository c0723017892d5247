//! Domain layer - Pure business abstractions
//!
//! This layer contains NO framework dependencies (no SeaORM, no Axum).
//! Only trait definitions, closed vocabularies and domain error types.

pub mod catalog;
pub mod errors;
pub mod repositories;
pub mod session;

pub use catalog::{EventCategory, Faculty, QuestType, Role};
pub use errors::DomainError;
pub use repositories::*;
pub use session::Session;
