//! Shared fixtures for the integration tests
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use uniexp::config::CampusRules;
use uniexp::db;
use uniexp::domain::{EventCategory, Faculty, QuestType, Role, Session};
use uniexp::models::user;
use uniexp::services::event_service::{self, CreatedEvent, NewEvent, NewQuest};
use uniexp::services::qr::{QrCodec, QrPayload};
use uniexp::services::registration_service::{self, RegistrationReceipt, RegistrationRequest};
use uniexp::utils::time::timestamp;

pub const VENUE: (f64, f64) = (1.5585, 103.6375);
pub const QR_SECRET: &str = "integration-test-secret";

/// Fixed "current" instant, three days before the fixture events
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

pub async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

pub fn rules() -> CampusRules {
    CampusRules::default()
}

pub fn codec() -> QrCodec {
    QrCodec::new(QR_SECRET)
}

pub async fn create_user(
    db: &DatabaseConnection,
    email: &str,
    faculty: Faculty,
    year_of_study: i32,
    role: Role,
) -> Session {
    let saved = user::ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set("$argon2id$dummy".to_string()),
        display_name: Set(email.split('@').next().unwrap_or(email).to_string()),
        faculty: Set(faculty.code().to_string()),
        year_of_study: Set(year_of_study),
        role: Set(role.code().to_string()),
        diamonds: Set(0),
        points: Set(0),
        email_verified: Set(true),
        onboarding_completed: Set(false),
        created_at: Set(timestamp(now())),
        updated_at: Set(timestamp(now())),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create user");
    Session::new(saved.id, faculty, role)
}

pub async fn create_student(db: &DatabaseConnection, email: &str) -> Session {
    create_user(db, email, Faculty::Computing, 2, Role::Student).await
}

pub async fn create_organiser(db: &DatabaseConnection) -> Session {
    create_user(
        db,
        "organiser@uni.test",
        Faculty::Computing,
        3,
        Role::Organiser,
    )
    .await
}

pub fn quest(quest_type: QuestType, target_count: Option<i32>) -> NewQuest {
    NewQuest {
        quest_type,
        title: format!("{} quest", quest_type.label()),
        description: None,
        question: None,
        correct_answer: None,
        target_count,
        diamond_reward: 10,
        points_reward: 20,
    }
}

pub fn qna_quest(question: &str, answer: &str) -> NewQuest {
    let mut q = quest(QuestType::QuestionAnswer, None);
    q.question = Some(question.to_string());
    q.correct_answer = Some(answer.to_string());
    q
}

pub fn event_input(title: &str, capacity: i32, quests: Vec<NewQuest>) -> NewEvent {
    let start = now() + Duration::days(3);
    NewEvent {
        title: title.to_string(),
        description: None,
        organiser: "Tech Society".to_string(),
        category: EventCategory::Technology,
        location_name: "Main Hall".to_string(),
        latitude: VENUE.0,
        longitude: VENUE.1,
        start_at: start,
        end_at: start + Duration::hours(3),
        registration_deadline: start - Duration::days(1),
        capacity,
        requires_payment: false,
        fee: None,
        restricted_faculties: vec![],
        restricted_years: vec![],
        quests,
    }
}

pub async fn create_event(
    db: &DatabaseConnection,
    organiser: &Session,
    input: NewEvent,
) -> CreatedEvent {
    event_service::create_event(db, organiser, input, now())
        .await
        .expect("Failed to create event")
}

pub async fn register(
    db: &DatabaseConnection,
    session: &Session,
    event_id: i32,
) -> RegistrationReceipt {
    registration_service::register(
        db,
        &rules(),
        session,
        event_id,
        RegistrationRequest::default(),
        now(),
    )
    .await
    .expect("Failed to register")
}

pub fn attendance_qr(event_id: i32, at: DateTime<Utc>) -> String {
    codec()
        .seal(&QrPayload::attendance(event_id, at))
        .expect("Failed to seal QR")
}

pub fn networking_qr(event_id: i32, user_id: i32, at: DateTime<Utc>) -> String {
    codec()
        .seal(&QrPayload::networking(event_id, user_id, at))
        .expect("Failed to seal QR")
}
