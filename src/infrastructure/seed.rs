//! Demo data for local development (`SEED_DEMO=1`)

use chrono::{Duration, Utc};
use sea_orm::*;

use crate::domain::{EventCategory, Faculty, QuestType, Role, Session};
use crate::infrastructure::auth::hash_password;
use crate::models::user;
use crate::services::event_service::{self, NewEvent, NewQuest};
use crate::utils::time::timestamp;

const DEMO_PASSWORD: &str = "password123";

struct DemoUser {
    email: &'static str,
    name: &'static str,
    faculty: Faculty,
    year: i32,
    role: Role,
}

const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        email: "admin@uniexp.test",
        name: "Campus Admin",
        faculty: Faculty::Computing,
        year: 1,
        role: Role::Admin,
    },
    DemoUser {
        email: "organiser@uniexp.test",
        name: "Tech Society",
        faculty: Faculty::Computing,
        year: 3,
        role: Role::Organiser,
    },
    DemoUser {
        email: "aisyah@uniexp.test",
        name: "Aisyah",
        faculty: Faculty::Computing,
        year: 2,
        role: Role::Student,
    },
    DemoUser {
        email: "daniel@uniexp.test",
        name: "Daniel",
        faculty: Faculty::Engineering,
        year: 1,
        role: Role::Student,
    },
];

fn quest(quest_type: QuestType, title: &str, target_count: Option<i32>, diamonds: i32) -> NewQuest {
    NewQuest {
        quest_type,
        title: title.to_string(),
        description: None,
        question: None,
        correct_answer: None,
        target_count,
        diamond_reward: diamonds,
        points_reward: diamonds * 2,
    }
}

pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    let already = user::Entity::find()
        .filter(user::Column::Email.eq(DEMO_USERS[0].email))
        .count(db)
        .await?;
    if already > 0 {
        tracing::info!("Demo data already present, skipping");
        return Ok(());
    }

    let now = Utc::now();
    let password_hash = hash_password(DEMO_PASSWORD).map_err(DbErr::Custom)?;

    let mut organiser = None;
    for demo in DEMO_USERS {
        let saved = user::ActiveModel {
            email: Set(demo.email.to_string()),
            password_hash: Set(password_hash.clone()),
            display_name: Set(demo.name.to_string()),
            faculty: Set(demo.faculty.code().to_string()),
            year_of_study: Set(demo.year),
            role: Set(demo.role.code().to_string()),
            diamonds: Set(0),
            points: Set(0),
            email_verified: Set(true),
            onboarding_completed: Set(true),
            created_at: Set(timestamp(now)),
            updated_at: Set(timestamp(now)),
            ..Default::default()
        }
        .insert(db)
        .await?;
        if demo.role == Role::Organiser {
            organiser = Some(Session::new(saved.id, demo.faculty, demo.role));
        }
    }
    let organiser = organiser.ok_or_else(|| DbErr::Custom("no demo organiser".to_string()))?;

    let start = now + Duration::days(3);
    let mut qna = quest(QuestType::QuestionAnswer, "Listen closely", None, 15);
    qna.question = Some("Which crate powers the backend's HTTP layer?".to_string());
    qna.correct_answer = Some("axum".to_string());

    let events = vec![
        NewEvent {
            title: "Hack Night".to_string(),
            description: Some("An evening of building, pizza and demos.".to_string()),
            organiser: "Tech Society".to_string(),
            category: EventCategory::Technology,
            location_name: "Computing Block, Lab 2".to_string(),
            latitude: 1.5585,
            longitude: 103.6375,
            start_at: start,
            end_at: start + Duration::hours(4),
            registration_deadline: start - Duration::hours(2),
            capacity: 50,
            requires_payment: false,
            fee: None,
            restricted_faculties: vec![],
            restricted_years: vec![],
            quests: vec![
                quest(QuestType::Attendance, "Show up", None, 10),
                quest(QuestType::EarlyBird, "First ten through the door", Some(10), 20),
                quest(QuestType::Networking, "Meet three builders", Some(3), 15),
                qna,
                quest(QuestType::Feedback, "Tell us how it went", None, 5),
            ],
        },
        NewEvent {
            title: "Engineering Career Fair".to_string(),
            description: Some("Meet recruiters from across the region.".to_string()),
            organiser: "Engineering Society".to_string(),
            category: EventCategory::Career,
            location_name: "Great Hall".to_string(),
            latitude: 1.5610,
            longitude: 103.6402,
            start_at: start + Duration::days(7),
            end_at: start + Duration::days(7) + Duration::hours(6),
            registration_deadline: start + Duration::days(6),
            capacity: 200,
            requires_payment: true,
            fee: Some(5.0),
            restricted_faculties: vec![Faculty::Engineering, Faculty::Computing],
            restricted_years: vec![],
            quests: vec![
                quest(QuestType::Attendance, "Check in", None, 10),
                quest(QuestType::Networking, "Talk to five recruiters", Some(5), 25),
            ],
        },
    ];

    for input in events {
        event_service::create_event(db, &organiser, input, now)
            .await
            .map_err(|e| DbErr::Custom(e.to_string()))?;
    }

    tracing::info!(
        "Seeded {} demo users (password '{}')",
        DEMO_USERS.len(),
        DEMO_PASSWORD
    );
    Ok(())
}
