//! Leaderboard Service - faculty standings

use serde::Serialize;
use std::cmp::Ordering;

use super::ServiceError;
use crate::domain::{Faculty, LeaderboardRepository, LeaderboardRow};

const PODIUM_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub user_id: i32,
    pub display_name: String,
    pub points: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Standings {
    pub faculty: Faculty,
    pub faculty_name: &'static str,
    pub podium: Vec<RankedEntry>,
    pub others: Vec<RankedEntry>,
    /// 1-based, `None` when the user has no points on this board
    pub my_rank: Option<usize>,
    pub my_points: i64,
}

fn standing_order(a: &LeaderboardRow, b: &LeaderboardRow) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| a.updated_at.cmp(&b.updated_at))
        .then_with(|| a.user_id.cmp(&b.user_id))
}

/// Points descending; whoever reached the score first wins a tie, then the
/// lower user id.
pub fn rank(mut rows: Vec<LeaderboardRow>) -> Vec<RankedEntry> {
    rows.sort_by(standing_order);
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| RankedEntry {
            rank: index + 1,
            user_id: row.user_id,
            display_name: row.display_name,
            points: row.points,
        })
        .collect()
}

pub async fn standings(
    repo: &dyn LeaderboardRepository,
    faculty: Faculty,
    user_id: i32,
) -> Result<Standings, ServiceError> {
    let mut ranked = rank(repo.entries_for_faculty(faculty).await?);

    let mine = ranked.iter().find(|e| e.user_id == user_id);
    let my_rank = mine.map(|e| e.rank);
    let my_points = mine.map(|e| e.points).unwrap_or(0);

    let others = ranked.split_off(PODIUM_SIZE.min(ranked.len()));

    Ok(Standings {
        faculty,
        faculty_name: faculty.label(),
        podium: ranked,
        others,
        my_rank,
        my_points,
    })
}
