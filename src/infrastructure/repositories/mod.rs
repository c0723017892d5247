//! Repository implementations using SeaORM

pub mod event_repository;
pub mod leaderboard_repository;

pub use event_repository::SeaOrmEventRepository;
pub use leaderboard_repository::SeaOrmLeaderboardRepository;
