pub mod enrollments;
pub mod finalization;
pub mod leaderboard;
pub mod rankings;
pub mod results;
pub mod schedule;
pub mod tournaments;
