//! Lifecycle State Machine (spec §4.9).

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TournamentStatus {
    Draft,
    SeekingInstructor,
    ReadyForEnrollment,
    Ongoing,
    InProgress,
    Completed,
    Cancelled,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::Draft => "DRAFT",
            TournamentStatus::SeekingInstructor => "SEEKING_INSTRUCTOR",
            TournamentStatus::ReadyForEnrollment => "READY_FOR_ENROLLMENT",
            TournamentStatus::Ongoing => "ONGOING",
            TournamentStatus::InProgress => "IN_PROGRESS",
            TournamentStatus::Completed => "COMPLETED",
            TournamentStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TournamentStatus::Completed | TournamentStatus::Cancelled)
    }
}

impl std::str::FromStr for TournamentStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "DRAFT" => TournamentStatus::Draft,
            "SEEKING_INSTRUCTOR" => TournamentStatus::SeekingInstructor,
            "READY_FOR_ENROLLMENT" => TournamentStatus::ReadyForEnrollment,
            "ONGOING" => TournamentStatus::Ongoing,
            "IN_PROGRESS" => TournamentStatus::InProgress,
            "COMPLETED" => TournamentStatus::Completed,
            "CANCELLED" => TournamentStatus::Cancelled,
            other => return Err(EngineError::NotFound(format!("unknown tournament status {other}"))),
        })
    }
}

/// Who is driving the requested transition, so `IN_PROGRESS ->
/// COMPLETED` can be restricted to the finalizer path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionActor {
    Admin,
    InstructorAcceptance,
    EnrollmentClose,
    FirstMatchResult,
    TournamentFinalizer,
}

pub fn transition(
    current: TournamentStatus,
    requested: TournamentStatus,
    actor: TransitionActor,
) -> Result<TournamentStatus, EngineError> {
    use TournamentStatus::*;
    use TransitionActor::*;

    let permitted = match (current, requested, actor) {
        (Draft, SeekingInstructor, Admin) => true,
        (Draft, ReadyForEnrollment, Admin) => true,
        (SeekingInstructor, ReadyForEnrollment, InstructorAcceptance) => true,
        (SeekingInstructor, ReadyForEnrollment, Admin) => true,
        (ReadyForEnrollment, Ongoing, EnrollmentClose) => true,
        (ReadyForEnrollment, Ongoing, Admin) => true,
        (Ongoing, InProgress, FirstMatchResult) => true,
        (Ongoing, InProgress, Admin) => true,
        (InProgress, Completed, TournamentFinalizer) => true,
        (_, Cancelled, Admin) if !current.is_terminal() => true,
        _ => false,
    };

    if permitted {
        Ok(requested)
    } else {
        Err(EngineError::InvalidTransition {
            from: current.as_str().to_string(),
            to: requested.as_str().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TournamentStatus::*;
    use TransitionActor::*;

    #[test]
    fn draft_can_go_directly_to_ready_for_enrollment() {
        assert_eq!(transition(Draft, ReadyForEnrollment, Admin).unwrap(), ReadyForEnrollment);
    }

    #[test]
    fn completed_only_reachable_via_finalizer() {
        assert!(transition(InProgress, Completed, Admin).is_err());
        assert_eq!(transition(InProgress, Completed, TournamentFinalizer).unwrap(), Completed);
    }

    #[test]
    fn terminal_states_reject_cancellation() {
        assert!(transition(Completed, Cancelled, Admin).is_err());
        assert!(transition(Cancelled, Cancelled, Admin).is_err());
    }

    #[test]
    fn skipping_states_is_rejected() {
        assert!(transition(Draft, Ongoing, Admin).is_err());
    }
}
