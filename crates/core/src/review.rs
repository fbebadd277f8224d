use serde::{Deserialize, Serialize};

use crate::domain::booking::{BookingId, TravelRequest};
use crate::domain::session::{Session, SessionId, SessionStatus};
use crate::errors::DomainError;
use crate::flows::FlowEvent;

pub const FEEDBACK_MAX_CHARS: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl ReviewDecision {
    /// The session status the backend records for this decision.
    pub fn action(&self) -> SessionStatus {
        match self {
            Self::Approved => SessionStatus::ManagerApproved,
            Self::Rejected => SessionStatus::ManagerRejected,
        }
    }

    pub fn from_action(action: SessionStatus) -> Result<Self, DomainError> {
        match action {
            SessionStatus::ManagerApproved => Ok(Self::Approved),
            SessionStatus::ManagerRejected => Ok(Self::Rejected),
            other => Err(DomainError::InvalidReviewAction { action: other }),
        }
    }

    pub fn flow_event(&self) -> FlowEvent {
        match self {
            Self::Approved => FlowEvent::ManagerApproved,
            Self::Rejected => FlowEvent::ManagerRejected,
        }
    }

    /// Canned rationale offered to the reviewer.
    pub fn default_feedback(&self) -> &'static str {
        match self {
            Self::Approved => "Travel request approved. Proceed with booking.",
            Self::Rejected => "Travel request rejected due to budget constraints.",
        }
    }
}

/// One-shot manager decision, sent exactly as the backend expects it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerReview {
    pub session_id: SessionId,
    pub booking_id: BookingId,
    pub action: SessionStatus,
    pub feedback: String,
}

impl ManagerReview {
    pub fn new(
        booking: &TravelRequest,
        decision: ReviewDecision,
        feedback: &str,
    ) -> Result<Self, DomainError> {
        let review = Self {
            session_id: booking.session_id.clone(),
            booking_id: booking.id.clone(),
            action: decision.action(),
            feedback: feedback.trim().to_owned(),
        };
        review.validate()?;
        Ok(review)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        ReviewDecision::from_action(self.action)?;
        let length = self.feedback.trim().chars().count();
        if length == 0 || length > FEEDBACK_MAX_CHARS {
            return Err(DomainError::InvalidFeedback { length });
        }
        Ok(())
    }

    pub fn decision(&self) -> Result<ReviewDecision, DomainError> {
        ReviewDecision::from_action(self.action)
    }
}

/// Backend reply to a review: both records, already updated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub session: Session,
    pub booking: TravelRequest,
}

impl ReviewOutcome {
    /// The booking with the returned session embedded.
    pub fn into_booking(self) -> TravelRequest {
        let mut booking = self.booking;
        booking.session = Some(self.session);
        booking
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::session::SessionStatus;
    use crate::errors::DomainError;
    use crate::fixtures::booking_fixture;

    use super::{ManagerReview, ReviewDecision, FEEDBACK_MAX_CHARS};

    #[test]
    fn review_carries_booking_and_session_ids() {
        let booking = booking_fixture(vec![], vec![], vec![]);
        let review =
            ManagerReview::new(&booking, ReviewDecision::Approved, "  ok ").expect("valid review");

        assert_eq!(review.booking_id, booking.id);
        assert_eq!(review.session_id, booking.session_id);
        assert_eq!(review.action, SessionStatus::ManagerApproved);
        assert_eq!(review.feedback, "ok");
    }

    #[test]
    fn feedback_is_mandatory_even_for_approval() {
        let booking = booking_fixture(vec![], vec![], vec![]);
        let error = ManagerReview::new(&booking, ReviewDecision::Approved, "   ")
            .expect_err("blank feedback");
        assert_eq!(error, DomainError::InvalidFeedback { length: 0 });
    }

    #[test]
    fn feedback_limit_counts_characters_not_bytes() {
        let booking = booking_fixture(vec![], vec![], vec![]);
        let at_limit = "é".repeat(FEEDBACK_MAX_CHARS);
        assert!(ManagerReview::new(&booking, ReviewDecision::Rejected, &at_limit).is_ok());

        let over = "x".repeat(FEEDBACK_MAX_CHARS + 1);
        let error =
            ManagerReview::new(&booking, ReviewDecision::Rejected, &over).expect_err("too long");
        assert_eq!(error, DomainError::InvalidFeedback { length: 201 });
    }

    #[test]
    fn only_decision_statuses_are_valid_actions() {
        let booking = booking_fixture(vec![], vec![], vec![]);
        let mut review =
            ManagerReview::new(&booking, ReviewDecision::Rejected, "over budget").expect("valid");
        review.action = SessionStatus::Completed;

        assert_eq!(
            review.validate(),
            Err(DomainError::InvalidReviewAction { action: SessionStatus::Completed })
        );
    }

    #[test]
    fn wire_shape_matches_backend_contract() {
        let booking = booking_fixture(vec![], vec![], vec![]);
        let review = ManagerReview::new(
            &booking,
            ReviewDecision::Rejected,
            ReviewDecision::Rejected.default_feedback(),
        )
        .expect("canned feedback is valid");

        let encoded = serde_json::to_value(&review).expect("encode review");
        assert_eq!(encoded["action"], "ManagerRejected");
        assert_eq!(encoded["booking_id"], "bk-fixture");
        assert_eq!(encoded["feedback"], "Travel request rejected due to budget constraints.");
    }
}
