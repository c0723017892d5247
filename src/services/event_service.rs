//! Event Service - catalog reads, derived fields and event creation

use chrono::{DateTime, Utc};
use sea_orm::*;
use serde::{Deserialize, Serialize};

use super::ServiceError;
use crate::domain::{
    Event, EventCategory, EventFilter, EventRepository, Faculty, QuestType, Session,
};
use crate::models::event;
use crate::models::quest;
use crate::models::user::Entity as User;
use crate::utils::time::{parse_timestamp, timestamp, windows_overlap};

/// Registration verdict shown next to an event
#[derive(Debug, Clone, Serialize)]
pub struct Eligibility {
    pub eligible: bool,
    pub code: Option<&'static str>,
    pub reason: Option<String>,
}

impl From<Result<(), ServiceError>> for Eligibility {
    fn from(result: Result<(), ServiceError>) -> Self {
        match result {
            Ok(()) => Self {
                eligible: true,
                code: None,
                reason: None,
            },
            Err(e) => Self {
                eligible: false,
                code: Some(e.code()),
                reason: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    pub id: i32,
    pub title: String,
    pub start_at: String,
    pub end_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    pub remaining_capacity: i32,
    pub is_full: bool,
    pub is_registered: bool,
    /// Other registered events whose time window overlaps this one
    pub clashes: Vec<EventSummary>,
    pub eligibility: Eligibility,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewQuest {
    pub quest_type: QuestType,
    pub title: String,
    pub description: Option<String>,
    pub question: Option<String>,
    pub correct_answer: Option<String>,
    /// Early-bird slots or required connections
    pub target_count: Option<i32>,
    #[serde(default)]
    pub diamond_reward: i32,
    #[serde(default)]
    pub points_reward: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub organiser: String,
    pub category: EventCategory,
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub registration_deadline: DateTime<Utc>,
    pub capacity: i32,
    #[serde(default)]
    pub requires_payment: bool,
    pub fee: Option<f64>,
    #[serde(default)]
    pub restricted_faculties: Vec<Faculty>,
    #[serde(default)]
    pub restricted_years: Vec<i32>,
    #[serde(default)]
    pub quests: Vec<NewQuest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedEvent {
    pub event: Event,
    pub quests: Vec<quest::Model>,
}

/// Registration preconditions, checked in a fixed order so the first
/// failing rule is the one reported.
pub fn check_eligibility(
    event: &Event,
    faculty: Faculty,
    year_of_study: i32,
    now: DateTime<Utc>,
    already_registered: bool,
) -> Result<(), ServiceError> {
    let deadline = parse_timestamp(&event.registration_deadline).ok_or_else(|| {
        ServiceError::Database(format!("event {} has an unreadable deadline", event.id))
    })?;
    if now > deadline {
        return Err(ServiceError::RegistrationClosed);
    }
    if already_registered {
        return Err(ServiceError::AlreadyRegistered);
    }
    if event.is_full() {
        return Err(ServiceError::EventFull);
    }
    if event.is_faculty_restricted() && !event.restricted_faculties.contains(&faculty) {
        return Err(ServiceError::FacultyRestricted);
    }
    if event.is_year_restricted() && !event.restricted_years.contains(&year_of_study) {
        return Err(ServiceError::YearRestricted);
    }
    Ok(())
}

fn window(event: &Event) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    Some((
        parse_timestamp(&event.start_at)?,
        parse_timestamp(&event.end_at)?,
    ))
}

/// Registered events that overlap `event`, excluding itself
pub fn find_clashes(event: &Event, registered: &[Event]) -> Vec<EventSummary> {
    let Some(target) = window(event) else {
        return Vec::new();
    };
    registered
        .iter()
        .filter(|other| other.id != event.id)
        .filter(|other| window(other).is_some_and(|w| windows_overlap(target, w)))
        .map(|other| EventSummary {
            id: other.id,
            title: other.title.clone(),
            start_at: other.start_at.clone(),
            end_at: other.end_at.clone(),
        })
        .collect()
}

pub async fn list_events(
    repo: &dyn EventRepository,
    filter: EventFilter,
) -> Result<Vec<Event>, ServiceError> {
    Ok(repo.find_all(filter).await?)
}

/// One event with the fields derived for the session user
pub async fn event_view(
    db: &DatabaseConnection,
    repo: &dyn EventRepository,
    session: &Session,
    event_id: i32,
    now: DateTime<Utc>,
) -> Result<EventView, ServiceError> {
    let event = repo
        .find_by_id(event_id)
        .await?
        .ok_or(ServiceError::NotFound("Event"))?;

    let registered = repo.find_registered(session.user_id).await?;
    let is_registered = registered.iter().any(|e| e.id == event.id);
    let clashes = find_clashes(&event, &registered);

    // Stored profile, not the token, decides eligibility
    let user = User::find_by_id(session.user_id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound("User"))?;
    let faculty = user.faculty.parse::<Faculty>()?;
    let eligibility =
        check_eligibility(&event, faculty, user.year_of_study, now, is_registered).into();

    Ok(EventView {
        remaining_capacity: event.remaining_capacity(),
        is_full: event.is_full(),
        is_registered,
        clashes,
        eligibility,
        event,
    })
}

fn validate_new_event(input: &NewEvent) -> Result<(), ServiceError> {
    if input.title.trim().is_empty() {
        return Err(ServiceError::Validation("Title is required".to_string()));
    }
    if input.capacity < 1 {
        return Err(ServiceError::Validation(
            "Capacity must be at least 1".to_string(),
        ));
    }
    if input.end_at <= input.start_at {
        return Err(ServiceError::Validation(
            "Event must end after it starts".to_string(),
        ));
    }
    if input.registration_deadline > input.end_at {
        return Err(ServiceError::Validation(
            "Registration must close before the event ends".to_string(),
        ));
    }
    if !(-90.0..=90.0).contains(&input.latitude) || !(-180.0..=180.0).contains(&input.longitude) {
        return Err(ServiceError::Validation("Invalid coordinates".to_string()));
    }
    if input.requires_payment && input.fee.is_none_or(|fee| fee <= 0.0) {
        return Err(ServiceError::Validation(
            "Paid events need a positive fee".to_string(),
        ));
    }
    for q in &input.quests {
        if q.title.trim().is_empty() {
            return Err(ServiceError::Validation("Quest title is required".to_string()));
        }
        if q.diamond_reward < 0 || q.points_reward < 0 {
            return Err(ServiceError::Validation(
                "Quest rewards cannot be negative".to_string(),
            ));
        }
        if q.quest_type == QuestType::QuestionAnswer
            && (q.question.as_deref().is_none_or(|s| s.trim().is_empty())
                || q.correct_answer.as_deref().is_none_or(|s| s.trim().is_empty()))
        {
            return Err(ServiceError::Validation(
                "Q&A quests need a question and an answer".to_string(),
            ));
        }
    }
    Ok(())
}

/// Create an event with its quest templates (organisers and admins)
pub async fn create_event(
    db: &DatabaseConnection,
    session: &Session,
    input: NewEvent,
    now: DateTime<Utc>,
) -> Result<CreatedEvent, ServiceError> {
    if !session.role.can_manage_events() {
        return Err(ServiceError::Forbidden);
    }
    validate_new_event(&input)?;

    let faculty_codes: Vec<&str> = input.restricted_faculties.iter().map(|f| f.code()).collect();
    let faculties_json = serde_json::to_string(&faculty_codes)
        .map_err(|e| ServiceError::Validation(e.to_string()))?;
    let years_json = serde_json::to_string(&input.restricted_years)
        .map_err(|e| ServiceError::Validation(e.to_string()))?;
    let now_str = timestamp(now);

    let txn = db.begin().await?;

    let saved = event::ActiveModel {
        title: Set(input.title.trim().to_string()),
        description: Set(input.description),
        organiser: Set(input.organiser),
        category: Set(input.category.code().to_string()),
        location_name: Set(input.location_name),
        latitude: Set(input.latitude),
        longitude: Set(input.longitude),
        start_at: Set(timestamp(input.start_at)),
        end_at: Set(timestamp(input.end_at)),
        registration_deadline: Set(timestamp(input.registration_deadline)),
        capacity: Set(input.capacity),
        participant_count: Set(0),
        requires_payment: Set(input.requires_payment),
        fee: Set(input.fee),
        restricted_faculties: Set(faculties_json),
        restricted_years: Set(years_json),
        created_by: Set(Some(session.user_id)),
        created_at: Set(now_str.clone()),
        updated_at: Set(now_str.clone()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut quests = Vec::with_capacity(input.quests.len());
    for q in input.quests {
        let target_count = q.quest_type.completion_threshold(q.target_count.unwrap_or(1));
        let model = quest::ActiveModel {
            event_id: Set(saved.id),
            quest_type: Set(q.quest_type.code().to_string()),
            title: Set(q.title.trim().to_string()),
            description: Set(q.description),
            question: Set(q.question),
            correct_answer: Set(q.correct_answer),
            target_count: Set(target_count),
            diamond_reward: Set(q.diamond_reward),
            points_reward: Set(q.points_reward),
            created_at: Set(now_str.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        quests.push(model);
    }

    txn.commit().await?;

    tracing::info!(
        "🎪 Event {} '{}' created with {} quests by user {}",
        saved.id,
        saved.title,
        quests.len(),
        session.user_id
    );

    Ok(CreatedEvent {
        event: Event::try_from(saved)?,
        quests,
    })
}
