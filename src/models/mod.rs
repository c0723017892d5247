pub mod applied_completion;
pub mod badge;
pub mod badge_progress;
pub mod badge_progress_entry;
pub mod chat_message;
pub mod event;
pub mod feedback;
pub mod leaderboard_entry;
pub mod network_connection;
pub mod quest;
pub mod quest_progress;
pub mod quest_progress_entry;
pub mod registration;
pub mod scheduled_notification;
pub mod user;
