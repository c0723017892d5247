//! Check-in, early-bird, networking, Q&A and feedback quests end to end

mod common;

use chrono::Duration;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use common::*;
use uniexp::domain::{QuestType, Session};
use uniexp::models::{badge, network_connection, quest_progress_entry};
use uniexp::services::ServiceError;
use uniexp::services::attendance_service::{self, AttendanceScan, EarlyBirdVerdict};
use uniexp::services::badge_service;
use uniexp::services::feedback_service::{self, FeedbackForm};
use uniexp::services::network_service::{self, PeerScan};
use uniexp::services::quest_service::{self, QuestState};
use uniexp::services::quiz_service::{self, AnswerResult, AnswerSubmission};
use uniexp::utils::time::parse_timestamp;

async fn entry_for(
    db: &sea_orm::DatabaseConnection,
    user_id: i32,
    quest_id: i32,
) -> quest_progress_entry::Model {
    quest_service::find_entry(db, user_id, quest_id)
        .await
        .unwrap()
        .expect("entry exists")
}

fn scan_at_venue(event_id: i32, at: chrono::DateTime<chrono::Utc>) -> AttendanceScan {
    AttendanceScan {
        event_id,
        qr: attendance_qr(event_id, at),
        latitude: VENUE.0 + 0.0003,
        longitude: VENUE.1,
    }
}

async fn check_in(
    db: &sea_orm::DatabaseConnection,
    session: &Session,
    event_id: i32,
    at: chrono::DateTime<chrono::Utc>,
) -> Result<attendance_service::AttendanceReceipt, ServiceError> {
    attendance_service::scan_attendance(
        db,
        &codec(),
        &rules(),
        session,
        scan_at_venue(event_id, at),
        at,
    )
    .await
}

async fn scan_from(
    db: &sea_orm::DatabaseConnection,
    session: Session,
    event_id: i32,
    qr: String,
    latitude: f64,
    at: chrono::DateTime<chrono::Utc>,
) -> Result<attendance_service::AttendanceReceipt, ServiceError> {
    let scan = AttendanceScan {
        event_id,
        qr,
        latitude,
        longitude: VENUE.1,
    };
    attendance_service::scan_attendance(db, &codec(), &rules(), &session, scan, at).await
}

#[tokio::test]
async fn test_attendance_scan_completes_quest_once() {
    let db = setup_test_db().await;
    let organiser = create_organiser(&db).await;
    let student = create_student(&db, "aisyah@uni.test").await;
    let created = create_event(
        &db,
        &organiser,
        event_input("Talk", 50, vec![quest(QuestType::Attendance, None)]),
    )
    .await;
    let event_id = created.event.id;
    let quest_id = created.quests[0].id;
    register(&db, &student, event_id).await;

    let before = entry_for(&db, student.user_id, quest_id).await;
    assert_eq!((before.progress, before.threshold), (0, 1));

    let receipt = check_in(&db, &student, event_id, now()).await.unwrap();
    assert_eq!(receipt.early_bird, EarlyBirdVerdict::NoQuest);
    assert_eq!(receipt.quests.len(), 1);
    assert!(receipt.quests[0].newly_completed);

    let after = entry_for(&db, student.user_id, quest_id).await;
    assert_eq!(after.progress, 1);
    assert!(after.is_completed);
    assert!(!after.claimed);

    // Attendance badge counter moved by exactly one
    let badges = badge_service::my_badges(&db, &student).await.unwrap();
    let regular = badges.iter().find(|b| b.badge_type == "attendance").unwrap();
    assert_eq!(regular.progress, 1);
    assert!(!regular.is_unlocked);

    let again = check_in(&db, &student, event_id, now() + Duration::seconds(1)).await;
    assert!(matches!(again, Err(ServiceError::AlreadyAttended)));
    let still = entry_for(&db, student.user_id, quest_id).await;
    assert_eq!(still.progress, 1);
}

#[tokio::test]
async fn test_replayed_completion_token_is_a_no_op() {
    let db = setup_test_db().await;
    let organiser = create_organiser(&db).await;
    let student = create_student(&db, "replay@uni.test").await;
    let created = create_event(
        &db,
        &organiser,
        event_input("Replay", 10, vec![quest(QuestType::Networking, Some(3))]),
    )
    .await;
    register(&db, &student, created.event.id).await;
    let quest = &created.quests[0];

    let first = quest_service::apply_progress(&db, student.user_id, quest, "network:x", now())
        .await
        .unwrap();
    assert!(first.applied);
    assert_eq!(first.progress, 1);

    let replay = quest_service::apply_progress(&db, student.user_id, quest, "network:x", now())
        .await
        .unwrap();
    assert!(!replay.applied);
    assert_eq!(replay.progress, 1);
    assert_eq!(replay.state, QuestState::InProgress);
}

#[tokio::test]
async fn test_qr_and_geofence_rejections() {
    let db = setup_test_db().await;
    let organiser = create_organiser(&db).await;
    let student = create_student(&db, "roamer@uni.test").await;
    let created = create_event(
        &db,
        &organiser,
        event_input("Fenced", 10, vec![quest(QuestType::Attendance, None)]),
    )
    .await;
    let other = create_event(&db, &organiser, event_input("Elsewhere", 10, vec![])).await;
    let event_id = created.event.id;
    register(&db, &student, event_id).await;

    let scan = |qr: String, latitude: f64, at| {
        scan_from(&db, student, event_id, qr, latitude, at)
    };

    // Stale code
    let stale = scan(attendance_qr(event_id, now()), VENUE.0, now() + Duration::seconds(6)).await;
    assert!(matches!(stale, Err(ServiceError::QrExpired)));

    // Code for another event
    let foreign = scan(attendance_qr(other.event.id, now()), VENUE.0, now()).await;
    assert!(matches!(foreign, Err(ServiceError::QrWrongEvent)));

    // Forged code
    let forged = scan("bm90LWEtcmVhbC1jb2Rl".to_string(), VENUE.0, now()).await;
    assert!(matches!(forged, Err(ServiceError::QrInvalid)));

    // Networking code at the venue screen
    let wrong_kind = scan(
        networking_qr(event_id, organiser.user_id, now()),
        VENUE.0,
        now(),
    )
    .await;
    assert!(matches!(wrong_kind, Err(ServiceError::QrWrongKind)));

    // ~1.1km away
    let far = scan(attendance_qr(event_id, now()), VENUE.0 + 0.01, now()).await;
    assert!(matches!(far, Err(ServiceError::OutOfRange { .. })));

    let entry = entry_for(&db, student.user_id, created.quests[0].id).await;
    assert_eq!(entry.progress, 0);

    let ok = scan(attendance_qr(event_id, now()), VENUE.0, now()).await;
    assert!(ok.is_ok());
}

#[tokio::test]
async fn test_unregistered_user_cannot_check_in() {
    let db = setup_test_db().await;
    let organiser = create_organiser(&db).await;
    let stranger = create_student(&db, "stranger@uni.test").await;
    let created = create_event(&db, &organiser, event_input("Closed Door", 10, vec![])).await;

    let result = check_in(&db, &stranger, created.event.id, now()).await;
    assert!(matches!(result, Err(ServiceError::NotRegistered)));
}

#[tokio::test]
async fn test_early_bird_slots_go_to_first_arrivals() {
    let db = setup_test_db().await;
    let organiser = create_organiser(&db).await;
    let created = create_event(
        &db,
        &organiser,
        event_input(
            "Dawn Run",
            10,
            vec![
                quest(QuestType::Attendance, None),
                quest(QuestType::EarlyBird, Some(2)),
            ],
        ),
    )
    .await;
    let event_id = created.event.id;
    let early_bird = created
        .quests
        .iter()
        .find(|q| q.quest_type == "early_bird")
        .unwrap()
        .id;

    let mut students = Vec::new();
    for i in 0..3 {
        let s = create_student(&db, &format!("runner{}@uni.test", i)).await;
        register(&db, &s, event_id).await;
        students.push(s);
    }

    let first = check_in(&db, &students[0], event_id, now()).await.unwrap();
    assert_eq!(first.early_bird, EarlyBirdVerdict::Credited { rank: 1 });
    let second = check_in(&db, &students[1], event_id, now() + Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(second.early_bird, EarlyBirdVerdict::Credited { rank: 2 });
    let third = check_in(&db, &students[2], event_id, now() + Duration::seconds(2))
        .await
        .unwrap();
    assert_eq!(
        third.early_bird,
        EarlyBirdVerdict::Missed { rank: 3, slots: 2 }
    );

    let winner = entry_for(&db, students[0].user_id, early_bird).await;
    assert!(winner.is_completed);
    assert_eq!(winner.progress, winner.threshold);

    let late = entry_for(&db, students[2].user_id, early_bird).await;
    assert!(late.is_failed);
    assert!(!late.is_completed);
    assert_eq!(late.progress, 0);

    // Re-evaluating gives the same answer and credits nothing new
    let (verdict, outcomes) =
        attendance_service::evaluate_early_bird(&db, students[0].user_id, event_id, now())
            .await
            .unwrap();
    assert_eq!(verdict, EarlyBirdVerdict::Credited { rank: 1 });
    assert!(outcomes.iter().all(|o| !o.applied));
}

#[tokio::test]
async fn test_networking_is_symmetric_and_deduplicated() {
    let db = setup_test_db().await;
    let organiser = create_organiser(&db).await;
    let a = create_student(&db, "a@uni.test").await;
    let b = create_student(&db, "b@uni.test").await;
    let outsider = create_student(&db, "o@uni.test").await;
    let created = create_event(
        &db,
        &organiser,
        event_input("Mixer", 10, vec![quest(QuestType::Networking, Some(2))]),
    )
    .await;
    let event_id = created.event.id;
    let quest_id = created.quests[0].id;
    register(&db, &a, event_id).await;
    register(&db, &b, event_id).await;

    let scan = |scanner: Session, qr: String| {
        let db = db.clone();
        async move {
            network_service::scan_peer(
                &db,
                &codec(),
                &rules(),
                &scanner,
                PeerScan { event_id, qr },
                now(),
            )
            .await
        }
    };

    let receipt = scan(a, networking_qr(event_id, b.user_id, now()))
        .await
        .unwrap();
    assert_eq!(receipt.peer_id, b.user_id);
    assert_eq!(receipt.quests[0].progress, 1);
    assert_eq!(receipt.peer_quests[0].progress, 1);

    let edges = network_connection::Entity::find()
        .filter(network_connection::Column::EventId.eq(event_id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(edges, 2);

    // Either direction counts as the same pair
    let again = scan(b, networking_qr(event_id, a.user_id, now())).await;
    assert!(matches!(again, Err(ServiceError::AlreadyConnected)));

    let selfie = scan(a, networking_qr(event_id, a.user_id, now())).await;
    assert!(matches!(selfie, Err(ServiceError::SelfScan)));

    let unregistered_peer = scan(a, networking_qr(event_id, outsider.user_id, now())).await;
    assert!(matches!(
        unregistered_peer,
        Err(ServiceError::PeerNotRegistered)
    ));

    assert_eq!(entry_for(&db, a.user_id, quest_id).await.progress, 1);
    assert_eq!(entry_for(&db, b.user_id, quest_id).await.progress, 1);

    let connections = network_service::list_connections(&db, &a, event_id)
        .await
        .unwrap();
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0].user_id, b.user_id);
}

#[tokio::test]
async fn test_qna_wrong_answer_changes_nothing() {
    let db = setup_test_db().await;
    let organiser = create_organiser(&db).await;
    let student = create_student(&db, "quiz@uni.test").await;
    let created = create_event(
        &db,
        &organiser,
        event_input("Quiz", 10, vec![qna_quest("Our mascot?", "Ferris")]),
    )
    .await;
    register(&db, &student, created.event.id).await;
    let quest_id = created.quests[0].id;

    let answer = |text: &str| AnswerSubmission {
        answer: text.to_string(),
    };

    let wrong = quiz_service::submit_answer(&db, &student, quest_id, answer("Gopher"), now())
        .await
        .unwrap();
    assert!(matches!(wrong, AnswerResult::Incorrect { .. }));
    assert_eq!(entry_for(&db, student.user_id, quest_id).await.progress, 0);

    let right = quiz_service::submit_answer(&db, &student, quest_id, answer("  ferris "), now())
        .await
        .unwrap();
    match right {
        AnswerResult::Correct { outcome } => assert!(outcome.newly_completed),
        other => panic!("expected correct, got {:?}", other),
    }

    let repeat = quiz_service::submit_answer(&db, &student, quest_id, answer("Ferris"), now()).await;
    assert!(matches!(repeat, Err(ServiceError::AlreadySubmitted)));
}

#[tokio::test]
async fn test_feedback_once_per_event() {
    let db = setup_test_db().await;
    let organiser = create_organiser(&db).await;
    let student = create_student(&db, "critic@uni.test").await;
    let created = create_event(
        &db,
        &organiser,
        event_input("Review Me", 10, vec![quest(QuestType::Feedback, None)]),
    )
    .await;
    register(&db, &student, created.event.id).await;

    let form = |rating| FeedbackForm {
        rating,
        liked: "The speakers".to_string(),
        improvement: "More chairs".to_string(),
    };

    let invalid =
        feedback_service::submit_feedback(&db, &student, created.event.id, form(0), now()).await;
    assert!(matches!(invalid, Err(ServiceError::Validation(_))));

    let receipt =
        feedback_service::submit_feedback(&db, &student, created.event.id, form(5), now())
            .await
            .unwrap();
    assert_eq!(receipt.quests.len(), 1);
    assert!(receipt.quests[0].newly_completed);

    let again =
        feedback_service::submit_feedback(&db, &student, created.event.id, form(4), now()).await;
    assert!(matches!(again, Err(ServiceError::AlreadySubmitted)));
}

#[tokio::test]
async fn test_quest_board_shows_states() {
    let db = setup_test_db().await;
    let organiser = create_organiser(&db).await;
    let student = create_student(&db, "board@uni.test").await;
    let created = create_event(
        &db,
        &organiser,
        event_input(
            "Board",
            10,
            vec![
                quest(QuestType::Attendance, None),
                quest(QuestType::Networking, Some(3)),
            ],
        ),
    )
    .await;

    let unregistered = quest_service::quest_board(&db, &student, created.event.id).await;
    assert!(matches!(unregistered, Err(ServiceError::NotRegistered)));

    register(&db, &student, created.event.id).await;
    check_in(&db, &student, created.event.id, now()).await.unwrap();

    let board = quest_service::quest_board(&db, &student, created.event.id)
        .await
        .unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].state, QuestState::Completed);
    assert_eq!(board[1].state, QuestState::NotStarted);
    assert_eq!(board[1].threshold, 3);
}

#[tokio::test]
async fn test_attendance_badge_unlocks_at_threshold() {
    let db = setup_test_db().await;
    let organiser = create_organiser(&db).await;
    let student = create_student(&db, "regular@uni.test").await;

    let mut unlocked_on = Vec::new();
    for i in 0..3 {
        let created = create_event(
            &db,
            &organiser,
            event_input(&format!("Talk {}", i), 10, vec![quest(QuestType::Attendance, None)]),
        )
        .await;
        register(&db, &student, created.event.id).await;
        let receipt = check_in(&db, &student, created.event.id, now()).await.unwrap();
        let update = receipt.quests[0]
            .badges
            .iter()
            .find(|b| b.name == "Regular")
            .cloned()
            .expect("attendance badge moved");
        assert_eq!(update.progress, i + 1);
        unlocked_on.push(update.newly_unlocked);
    }
    assert_eq!(unlocked_on, vec![false, false, true]);

    let badges = badge_service::my_badges(&db, &student).await.unwrap();
    let regular = badges.iter().find(|b| b.badge_type == "attendance").unwrap();
    assert_eq!((regular.progress, regular.threshold), (3, 3));
    assert!(regular.is_unlocked);
    assert!(regular.unlocked_at.is_some());

    // Other badge families did not move
    let connector = badges.iter().find(|b| b.badge_type == "networking").unwrap();
    assert_eq!(connector.progress, 0);
    assert!(!connector.is_unlocked);
}

#[tokio::test]
async fn test_default_badges_use_rfc3339_timestamps() {
    let db = setup_test_db().await;
    let badges = badge::Entity::find().all(&db).await.unwrap();
    assert_eq!(badges.len(), 5);
    for b in badges {
        assert!(
            parse_timestamp(&b.created_at).is_some(),
            "unreadable created_at {:?}",
            b.created_at
        );
        assert!(b.created_at.ends_with('Z'));
    }
}
