use serde::{Deserialize, Serialize};

use crate::domain::session::SessionStatus;
use crate::review::ReviewDecision;

/// The three-step view of a booking shown to the traveler.
///
/// Always derived from the session status; never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingPhase {
    Selecting,
    ManagerReview { decision: Option<ReviewDecision> },
    Ticketing,
}

impl BookingPhase {
    pub fn from_status(status: Option<SessionStatus>) -> Self {
        match status {
            Some(SessionStatus::InManagerReview) => Self::ManagerReview { decision: None },
            Some(SessionStatus::ManagerRejected) => {
                Self::ManagerReview { decision: Some(ReviewDecision::Rejected) }
            }
            Some(SessionStatus::ManagerApproved) | Some(SessionStatus::Completed) => Self::Ticketing,
            _ => Self::Selecting,
        }
    }

    pub fn step(&self) -> usize {
        match self {
            Self::Selecting => 0,
            Self::ManagerReview { .. } => 1,
            Self::Ticketing => 2,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::ManagerReview { decision: Some(ReviewDecision::Rejected) })
    }

    pub fn steps(&self) -> [ProgressStep; 3] {
        let current = self.step();
        let step = |index: usize, label: &'static str| ProgressStep {
            index,
            label,
            status: match index.cmp(&current) {
                std::cmp::Ordering::Less => StepStatus::Completed,
                std::cmp::Ordering::Equal => StepStatus::Current,
                std::cmp::Ordering::Greater => StepStatus::Pending,
            },
        };
        [
            step(0, "Select Travel Options"),
            step(1, "Manager Approval"),
            step(2, "Ticket Processing"),
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Current,
    Pending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ProgressStep {
    pub index: usize,
    pub label: &'static str,
    pub status: StepStatus,
}
