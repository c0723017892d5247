//! HTTP surface: routing, auth extraction and error mapping

mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`

use common::*;
use uniexp::auth::create_jwt;
use uniexp::config::{CampusRules, Config};
use uniexp::domain::Session;
use uniexp::server;
use uniexp::services::event_service;
use uniexp::services::registration_service::{self, RegistrationRequest};

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        port: 0,
        cors_allowed_origins: vec![],
        profile: "test".to_string(),
        rules: CampusRules::default(),
        qr_secret: QR_SECRET.to_string(),
    }
}

fn app(db: DatabaseConnection) -> Router {
    server::build_router(db, &test_config())
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method(method)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri).method("GET");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn bearer(session: &Session) -> String {
    create_jwt(session).expect("Failed to create JWT")
}

#[tokio::test]
async fn test_health() {
    let app = app(setup_test_db().await);
    let (status, _) = send(&app, get("/api/health", None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_signup_verify_login_me() {
    let app = app(setup_test_db().await);

    let (status, created) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/signup",
            None,
            json!({
                "email": "Nadia@Uni.test",
                "password": "correct horse",
                "display_name": "Nadia",
                "faculty": "law",
                "year_of_study": 1
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["user"]["email"], "nadia@uni.test");
    let verification = created["verification_token"]
        .as_str()
        .expect("token exposed in debug builds")
        .to_string();

    let login_body = json!({ "email": "nadia@uni.test", "password": "correct horse" });

    // Unverified accounts cannot log in yet
    let (status, body) = send(
        &app,
        json_request("POST", "/api/auth/login", None, login_body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/verify-email",
            None,
            json!({ "token": verification }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "nadia@uni.test", "password": "wrong password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, session) = send(
        &app,
        json_request("POST", "/api/auth/login", None, login_body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = session["token"].as_str().unwrap().to_string();

    let (status, me) = send(&app, get("/api/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["display_name"], "Nadia");
    assert_eq!(me["faculty"], "law");
    assert_eq!(me["diamonds"], 0);
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let app = app(setup_test_db().await);
    let body = json!({
        "email": "dup@uni.test",
        "password": "long enough",
        "display_name": "Dup",
        "faculty": "science",
        "year_of_study": 2
    });
    let (first, _) = send(&app, json_request("POST", "/api/auth/signup", None, body.clone())).await;
    assert_eq!(first, StatusCode::CREATED);
    let (second, err) = send(&app, json_request("POST", "/api/auth/signup", None, body)).await;
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(err["code"], "conflict");
}

#[tokio::test]
async fn test_protected_routes_need_a_token() {
    let app = app(setup_test_db().await);

    let (status, body) = send(&app, get("/api/auth/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (status, _) = send(&app, get("/api/registrations", Some("not-a-jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_on_full_event_is_unprocessable() {
    let db = setup_test_db().await;
    let organiser = create_organiser(&db).await;
    let first = create_student(&db, "first@uni.test").await;
    let second = create_student(&db, "second@uni.test").await;

    // Handlers run on the wall clock, so the event sits ahead of real time
    let mut input = event_input("Tiny Room", 1, vec![]);
    let start = Utc::now() + Duration::days(3);
    input.start_at = start;
    input.end_at = start + Duration::hours(2);
    input.registration_deadline = start - Duration::days(1);
    let created = event_service::create_event(&db, &organiser, input, Utc::now())
        .await
        .unwrap();
    let event_id = created.event.id;
    registration_service::register(
        &db,
        &rules(),
        &first,
        event_id,
        RegistrationRequest::default(),
        Utc::now(),
    )
    .await
    .unwrap();

    let app = app(db);
    let token = bearer(&second);

    let (status, detail) = send(&app, get(&format!("/api/events/{}", event_id), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["is_full"], true);
    assert_eq!(detail["eligibility"]["eligible"], false);
    assert_eq!(detail["eligibility"]["code"], "event_full");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/events/{}/registration", event_id),
            Some(&token),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "event_full");
    assert_eq!(body["error"], "Maximum capacity reached");
}

#[tokio::test]
async fn test_unknown_event_is_not_found() {
    let db = setup_test_db().await;
    let student = create_student(&db, "lost@uni.test").await;
    let app = app(db);

    let (status, body) = send(&app, get("/api/events/4242", Some(&bearer(&student)))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}
