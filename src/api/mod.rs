pub mod auth;
pub mod chat;
pub mod error;
pub mod events;
pub mod health;
pub mod leaderboard;
pub mod notifications;
pub mod quests;
pub mod registration;
pub mod scan;
pub mod user;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::infrastructure::AppState;

pub fn api_router_with_state(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/verify-email", post(auth::verify_email))
        .route(
            "/auth/password-reset/request",
            post(auth::request_password_reset),
        )
        .route(
            "/auth/password-reset/confirm",
            post(auth::confirm_password_reset),
        )
        .route("/auth/me", get(auth::me))
        // Profile
        .route("/user/push-token", put(user::set_push_token))
        .route("/user/profile-image", put(user::set_profile_image))
        .route("/user/onboarding", post(user::complete_onboarding))
        // Events
        .route(
            "/events",
            get(events::list_events).post(events::create_event),
        )
        .route("/events/:id", get(events::get_event))
        .route(
            "/events/:id/registration",
            post(registration::register).delete(registration::cancel),
        )
        .route("/registrations", get(registration::my_registrations))
        .route("/registrations/:id/verify", post(registration::verify))
        // Quests
        .route("/events/:id/quests", get(quests::quest_board))
        .route("/quests/:id/answer", post(quests::answer))
        .route("/events/:id/feedback", post(quests::feedback))
        .route("/quest-progress/:id/claim", post(quests::claim))
        .route("/badges", get(quests::my_badges))
        // Check-in and networking
        .route("/events/:id/attendance-qr", get(scan::attendance_qr))
        .route("/attendance/scan", post(scan::scan_attendance))
        .route("/events/:id/network-qr", get(scan::network_qr))
        .route("/network/scan", post(scan::scan_peer))
        .route("/events/:id/connections", get(scan::connections))
        // Leaderboard
        .route("/leaderboard", get(leaderboard::my_faculty))
        .route("/leaderboard/:faculty", get(leaderboard::for_faculty))
        // Reminders
        .route("/notifications/due", get(notifications::due))
        .route("/notifications/:id/sent", post(notifications::mark_sent))
        // Chat
        .route(
            "/events/:id/chat",
            get(chat::list_messages).post(chat::post_message),
        )
        .with_state(state)
}
