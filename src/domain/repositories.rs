//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;
use serde::Serialize;

use super::{DomainError, EventCategory, Faculty};

/// Filter criteria for event queries
#[derive(Debug, Default, Clone)]
pub struct EventFilter {
    pub category: Option<EventCategory>,
    /// Only events ending after this RFC 3339 instant
    pub ending_after: Option<String>,
    pub organiser: Option<String>,
}

/// Event data for API responses
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub organiser: String,
    pub category: EventCategory,
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub start_at: String,
    pub end_at: String,
    pub registration_deadline: String,
    pub capacity: i32,
    pub participant_count: i32,
    pub requires_payment: bool,
    pub fee: Option<f64>,
    pub restricted_faculties: Vec<Faculty>,
    pub restricted_years: Vec<i32>,
}

impl Event {
    pub fn remaining_capacity(&self) -> i32 {
        (self.capacity - self.participant_count).max(0)
    }

    pub fn is_full(&self) -> bool {
        self.participant_count >= self.capacity
    }

    pub fn is_faculty_restricted(&self) -> bool {
        !self.restricted_faculties.is_empty()
    }

    pub fn is_year_restricted(&self) -> bool {
        !self.restricted_years.is_empty()
    }
}

/// Repository trait for Event entity
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Find all events matching the filter, earliest start first
    async fn find_all(&self, filter: EventFilter) -> Result<Vec<Event>, DomainError>;

    /// Find an event by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<Event>, DomainError>;

    /// Events the given user holds a registration for
    async fn find_registered(&self, user_id: i32) -> Result<Vec<Event>, DomainError>;
}

/// One user's standing on a faculty leaderboard, unranked
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    pub user_id: i32,
    pub display_name: String,
    pub points: i64,
    pub updated_at: String,
}

/// Repository trait for leaderboard entries
#[async_trait]
pub trait LeaderboardRepository: Send + Sync {
    /// All entries recorded for a faculty, in no particular order
    async fn entries_for_faculty(&self, faculty: Faculty)
    -> Result<Vec<LeaderboardRow>, DomainError>;
}
