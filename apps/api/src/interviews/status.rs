use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle of a recruitment interview.
///
/// ```text
/// scheduled ──> in_progress ──> completed
///                    │
///                    └────────> failed
/// ```
///
/// `completed` and `failed` are terminal. There is no automatic retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    Scheduled,
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("interview cannot move from {from:?} to {to:?}")]
pub struct TransitionError {
    pub from: InterviewStatus,
    pub to: InterviewStatus,
}

impl InterviewStatus {
    pub fn transition(self, to: InterviewStatus) -> Result<InterviewStatus, TransitionError> {
        use InterviewStatus::*;
        match (self, to) {
            (Scheduled, InProgress) | (InProgress, Completed) | (InProgress, Failed) => Ok(to),
            _ => Err(TransitionError { from: self, to }),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, InterviewStatus::Completed | InterviewStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::InterviewStatus::*;
    use super::*;

    #[test]
    fn test_happy_path_in_order() {
        let status = Scheduled.transition(InProgress).unwrap();
        let status = status.transition(Completed).unwrap();
        assert_eq!(status, Completed);
        assert!(status.is_terminal());
    }

    #[test]
    fn test_scheduled_to_completed_rejected() {
        let err = Scheduled.transition(Completed).unwrap_err();
        assert_eq!(
            err,
            TransitionError {
                from: Scheduled,
                to: Completed
            }
        );
    }

    #[test]
    fn test_in_progress_can_fail() {
        assert_eq!(InProgress.transition(Failed), Ok(Failed));
    }

    #[test]
    fn test_failed_is_terminal() {
        for next in [Scheduled, InProgress, Completed, Failed] {
            assert!(Failed.transition(next).is_err());
        }
    }

    #[test]
    fn test_completed_is_terminal() {
        for next in [Scheduled, InProgress, Completed, Failed] {
            assert!(Completed.transition(next).is_err());
        }
    }

    #[test]
    fn test_cannot_restart_in_progress() {
        assert!(InProgress.transition(InProgress).is_err());
        assert!(InProgress.transition(Scheduled).is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(serde_json::to_string(&InProgress).unwrap(), "\"in_progress\"");
    }
}
