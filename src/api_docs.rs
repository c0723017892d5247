use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::auth::signup,
        api::auth::login,
        api::events::list_events,
        api::events::get_event,
        api::registration::register,
        api::scan::scan_attendance,
        api::quests::claim,
        api::leaderboard::my_faculty,
    ),
    tags(
        (name = "uniexp", description = "UniEXP campus events API")
    )
)]
pub struct ApiDoc;
