pub mod campus_schedule_configs;
pub mod enrollments;
pub mod rankings;
pub mod reward_distributions;
pub mod sessions;
pub mod status_history;
pub mod tournaments;

pub use campus_schedule_configs::CampusScheduleConfigRepo;
pub use enrollments::EnrollmentRepo;
pub use sessions::SessionRepo;
pub use tournaments::{TournamentFilter, TournamentRepo};
