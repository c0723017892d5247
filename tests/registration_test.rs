//! Registration workflow against an in-memory database

mod common;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Duration;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use common::*;
use uniexp::domain::{Faculty, QuestType, Role};
use uniexp::models::{
    event, network_connection, quest_progress_entry, registration, scheduled_notification,
};
use uniexp::services::ServiceError;
use uniexp::infrastructure::SeaOrmEventRepository;
use uniexp::services::event_service;
use uniexp::services::network_service::{self, PeerScan};
use uniexp::services::registration_service::{self, RegistrationRequest};

async fn participant_count(db: &sea_orm::DatabaseConnection, event_id: i32) -> i32 {
    event::Entity::find_by_id(event_id)
        .one(db)
        .await
        .unwrap()
        .unwrap()
        .participant_count
}

async fn register_paid(
    db: &sea_orm::DatabaseConnection,
    student: &uniexp::domain::Session,
    event_id: i32,
    payment_proof: Option<String>,
) -> Result<registration_service::RegistrationReceipt, ServiceError> {
    registration_service::register(
        db,
        &rules(),
        student,
        event_id,
        RegistrationRequest { payment_proof },
        now(),
    )
    .await
}

#[tokio::test]
async fn test_register_initialises_quests_and_reminders() {
    let db = setup_test_db().await;
    let organiser = create_organiser(&db).await;
    let student = create_student(&db, "aisyah@uni.test").await;
    let created = create_event(
        &db,
        &organiser,
        event_input(
            "Hack Night",
            50,
            vec![
                quest(QuestType::Attendance, None),
                quest(QuestType::EarlyBird, Some(10)),
                quest(QuestType::Networking, Some(3)),
                qna_quest("Mascot?", "Ferris"),
                quest(QuestType::Feedback, None),
            ],
        ),
    )
    .await;

    let receipt = register(&db, &student, created.event.id).await;
    assert!(receipt.is_verified);
    assert_eq!(receipt.quests_initialised, 5);
    assert_eq!(receipt.reminders_scheduled, 2);
    assert_eq!(receipt.remaining_capacity, 49);
    assert_eq!(participant_count(&db, created.event.id).await, 1);

    let entries = quest_progress_entry::Entity::find()
        .filter(quest_progress_entry::Column::UserId.eq(student.user_id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(entries.len(), 5);
    assert!(entries.iter().all(|e| e.progress == 0 && !e.is_completed));
    let mut thresholds: Vec<i32> = entries.iter().map(|e| e.threshold).collect();
    thresholds.sort();
    assert_eq!(thresholds, vec![1, 1, 1, 3, 10]);

    // Replaying the initialisation creates nothing new
    let added = registration_service::ensure_quest_progress(
        &db,
        student.user_id,
        created.event.id,
        now(),
    )
    .await
    .unwrap();
    assert_eq!(added, 0);
}

#[tokio::test]
async fn test_full_event_rejects_the_next_registration() {
    let db = setup_test_db().await;
    let organiser = create_organiser(&db).await;
    let created = create_event(&db, &organiser, event_input("Small Talk", 50, vec![])).await;

    for i in 0..50 {
        let student = create_student(&db, &format!("s{}@uni.test", i)).await;
        register(&db, &student, created.event.id).await;
    }
    assert_eq!(participant_count(&db, created.event.id).await, 50);

    let late = create_student(&db, "late@uni.test").await;
    let result = registration_service::register(
        &db,
        &rules(),
        &late,
        created.event.id,
        RegistrationRequest::default(),
        now(),
    )
    .await;
    assert!(matches!(result, Err(ServiceError::EventFull)));

    assert_eq!(participant_count(&db, created.event.id).await, 50);
    let rows = registration::Entity::find()
        .filter(registration::Column::UserId.eq(late.user_id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(rows, 0);
}

#[tokio::test]
async fn test_restrictions_and_deadline_write_nothing() {
    let db = setup_test_db().await;
    let organiser = create_organiser(&db).await;
    let mut input = event_input("Engineers Only", 10, vec![]);
    input.restricted_faculties = vec![Faculty::Engineering];
    input.restricted_years = vec![3];
    let created = create_event(&db, &organiser, input).await;
    let event_id = created.event.id;

    let computing = create_student(&db, "c@uni.test").await;
    let result = registration_service::register(
        &db,
        &rules(),
        &computing,
        event_id,
        RegistrationRequest::default(),
        now(),
    )
    .await;
    assert!(matches!(result, Err(ServiceError::FacultyRestricted)));

    let first_year = create_user(&db, "e1@uni.test", Faculty::Engineering, 1, Role::Student).await;
    let result = registration_service::register(
        &db,
        &rules(),
        &first_year,
        event_id,
        RegistrationRequest::default(),
        now(),
    )
    .await;
    assert!(matches!(result, Err(ServiceError::YearRestricted)));

    let third_year = create_user(&db, "e3@uni.test", Faculty::Engineering, 3, Role::Student).await;
    let too_late = now() + Duration::days(2) + Duration::seconds(1);
    let result = registration_service::register(
        &db,
        &rules(),
        &third_year,
        event_id,
        RegistrationRequest::default(),
        too_late,
    )
    .await;
    assert!(matches!(result, Err(ServiceError::RegistrationClosed)));

    assert_eq!(participant_count(&db, event_id).await, 0);
    assert_eq!(registration::Entity::find().count(&db).await.unwrap(), 0);

    register(&db, &third_year, event_id).await;
    assert_eq!(participant_count(&db, event_id).await, 1);
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let db = setup_test_db().await;
    let organiser = create_organiser(&db).await;
    let student = create_student(&db, "twice@uni.test").await;
    let created = create_event(&db, &organiser, event_input("Twice", 10, vec![])).await;

    register(&db, &student, created.event.id).await;
    let again = registration_service::register(
        &db,
        &rules(),
        &student,
        created.event.id,
        RegistrationRequest::default(),
        now(),
    )
    .await;
    assert!(matches!(again, Err(ServiceError::AlreadyRegistered)));
    assert_eq!(participant_count(&db, created.event.id).await, 1);
}

#[tokio::test]
async fn test_paid_event_requires_a_small_proof() {
    let db = setup_test_db().await;
    let organiser = create_organiser(&db).await;
    let student = create_student(&db, "payer@uni.test").await;
    let mut input = event_input("Gala Dinner", 10, vec![]);
    input.requires_payment = true;
    input.fee = Some(25.0);
    let created = create_event(&db, &organiser, input).await;
    let event_id = created.event.id;

    assert!(matches!(
        register_paid(&db, &student, event_id, None).await,
        Err(ServiceError::PaymentProofRequired)
    ));

    let oversized = STANDARD.encode(vec![0u8; 100 * 1024 + 1]);
    assert!(matches!(
        register_paid(&db, &student, event_id, Some(oversized)).await,
        Err(ServiceError::PaymentProofTooLarge { .. })
    ));
    assert_eq!(participant_count(&db, event_id).await, 0);

    let proof = format!("data:image/jpeg;base64,{}", STANDARD.encode(vec![1u8; 2048]));
    let receipt = register_paid(&db, &student, event_id, Some(proof)).await.unwrap();
    assert!(!receipt.is_verified);

    let verified = registration_service::verify_registration(
        &db,
        &organiser,
        receipt.registration_id,
        now(),
    )
    .await
    .unwrap();
    assert!(verified.is_verified);

    let forbidden = registration_service::verify_registration(
        &db,
        &student,
        receipt.registration_id,
        now(),
    )
    .await;
    assert!(matches!(forbidden, Err(ServiceError::Forbidden)));
}

#[tokio::test]
async fn test_cancel_rolls_everything_back() {
    let db = setup_test_db().await;
    let organiser = create_organiser(&db).await;
    let student = create_student(&db, "flaky@uni.test").await;
    let created = create_event(
        &db,
        &organiser,
        event_input("Maybe", 10, vec![quest(QuestType::Attendance, None)]),
    )
    .await;
    let event_id = created.event.id;

    register(&db, &student, event_id).await;
    registration_service::cancel_registration(&db, &student, event_id, now())
        .await
        .unwrap();

    assert_eq!(participant_count(&db, event_id).await, 0);
    assert_eq!(registration::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(
        quest_progress_entry::Entity::find().count(&db).await.unwrap(),
        0
    );
    assert_eq!(
        scheduled_notification::Entity::find()
            .count(&db)
            .await
            .unwrap(),
        0
    );

    let again = registration_service::cancel_registration(&db, &student, event_id, now()).await;
    assert!(matches!(again, Err(ServiceError::NotRegistered)));

    // The freed seat can be taken again
    register(&db, &student, event_id).await;
    assert_eq!(participant_count(&db, event_id).await, 1);
}

#[tokio::test]
async fn test_my_registrations_lists_events() {
    let db = setup_test_db().await;
    let organiser = create_organiser(&db).await;
    let student = create_student(&db, "busy@uni.test").await;
    let a = create_event(&db, &organiser, event_input("A", 10, vec![])).await;
    let b = create_event(&db, &organiser, event_input("B", 10, vec![])).await;
    register(&db, &student, a.event.id).await;
    register(&db, &student, b.event.id).await;

    let mine = registration_service::my_registrations(&db, &student)
        .await
        .unwrap();
    let titles: Vec<&str> = mine.iter().map(|r| r.event.title.as_str()).collect();
    assert_eq!(titles.len(), 2);
    assert!(titles.contains(&"A") && titles.contains(&"B"));
}

#[tokio::test]
async fn test_cancel_is_refused_after_networking() {
    let db = setup_test_db().await;
    let organiser = create_organiser(&db).await;
    let a = create_student(&db, "a@uni.test").await;
    let b = create_student(&db, "b@uni.test").await;
    let created = create_event(
        &db,
        &organiser,
        event_input("Mixer", 10, vec![quest(QuestType::Networking, Some(3))]),
    )
    .await;
    let event_id = created.event.id;
    let quest_id = created.quests[0].id;
    register(&db, &a, event_id).await;
    register(&db, &b, event_id).await;

    network_service::scan_peer(
        &db,
        &codec(),
        &rules(),
        &a,
        PeerScan {
            event_id,
            qr: networking_qr(event_id, b.user_id, now()),
        },
        now(),
    )
    .await
    .unwrap();

    // Neither the scanner nor the scanned side can withdraw
    for session in [&a, &b] {
        let result =
            registration_service::cancel_registration(&db, session, event_id, now()).await;
        assert!(matches!(result, Err(ServiceError::InvalidState(_))));
    }

    assert_eq!(participant_count(&db, event_id).await, 2);
    let edges = network_connection::Entity::find()
        .filter(network_connection::Column::EventId.eq(event_id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(edges, 2);
    for user_id in [a.user_id, b.user_id] {
        let entry = quest_progress_entry::Entity::find()
            .filter(quest_progress_entry::Column::UserId.eq(user_id))
            .filter(quest_progress_entry::Column::QuestId.eq(quest_id))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.progress, 1);
    }
}

#[tokio::test]
async fn test_event_view_judges_the_stored_faculty() {
    let db = setup_test_db().await;
    let organiser = create_organiser(&db).await;
    let mut input = event_input("Engineers Only", 10, vec![]);
    input.restricted_faculties = vec![Faculty::Engineering];
    let created = create_event(&db, &organiser, input).await;
    let event_id = created.event.id;
    let repo = SeaOrmEventRepository::new(db.clone());

    // Token issued before the profile moved to Engineering
    let engineer = create_user(&db, "moved@uni.test", Faculty::Engineering, 2, Role::Student).await;
    let stale = uniexp::domain::Session::student(engineer.user_id, Faculty::Computing);
    let view = event_service::event_view(&db, &repo, &stale, event_id, now())
        .await
        .unwrap();
    assert!(view.eligibility.eligible);

    // And the reverse: the token claims a faculty the profile does not have
    let computing = create_student(&db, "claims@uni.test").await;
    let forged = uniexp::domain::Session::student(computing.user_id, Faculty::Engineering);
    let view = event_service::event_view(&db, &repo, &forged, event_id, now())
        .await
        .unwrap();
    assert!(!view.eligibility.eligible);
    assert_eq!(view.eligibility.code, Some("faculty_restricted"));

    // The verdicts agree with what registration decides
    registration_service::register(
        &db,
        &rules(),
        &stale,
        event_id,
        RegistrationRequest::default(),
        now(),
    )
    .await
    .unwrap();
    let refused = registration_service::register(
        &db,
        &rules(),
        &forged,
        event_id,
        RegistrationRequest::default(),
        now(),
    )
    .await;
    assert!(matches!(refused, Err(ServiceError::FacultyRestricted)));
}
