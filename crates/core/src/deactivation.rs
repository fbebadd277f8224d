use serde::{Deserialize, Serialize};

use crate::domain::booking::{BookingId, TravelRequest};
use crate::errors::DomainError;

pub const DEFAULT_DEACTIVATION_REASON: &str = "User requested deactivation after rejection";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivationRequest {
    pub booking_id: BookingId,
    pub reason: String,
}

impl DeactivationRequest {
    pub fn new(booking: &TravelRequest, reason: &str) -> Result<Self, DomainError> {
        let reason = check_deactivation(booking, reason)?;
        Ok(Self { booking_id: booking.id.clone(), reason })
    }
}

/// Checks that `booking` may be abandoned and returns the trimmed reason.
///
/// Inactive bookings are terminal and a completed session is past the point
/// of abandonment; every other stage may be cancelled.
pub fn check_deactivation(booking: &TravelRequest, reason: &str) -> Result<String, DomainError> {
    if booking.is_inactive() {
        return Err(DomainError::BookingInactive { booking_id: booking.id.clone() });
    }
    if let Some(status) = booking.session_status() {
        if !status.is_abandonable() {
            return Err(DomainError::NotAbandonable { status });
        }
    }
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(DomainError::InvalidDeactivationReason);
    }
    Ok(reason.to_owned())
}

#[cfg(test)]
mod tests {
    use crate::domain::session::SessionStatus;
    use crate::errors::DomainError;
    use crate::fixtures::{booking_fixture, with_status};

    use super::{DeactivationRequest, DEFAULT_DEACTIVATION_REASON};

    #[test]
    fn rejected_booking_can_be_abandoned_with_default_reason() {
        let booking =
            with_status(booking_fixture(vec![], vec![], vec![]), SessionStatus::ManagerRejected);
        let request =
            DeactivationRequest::new(&booking, DEFAULT_DEACTIVATION_REASON).expect("abandonable");
        assert_eq!(request.reason, DEFAULT_DEACTIVATION_REASON);
        assert_eq!(request.booking_id, booking.id);
    }

    #[test]
    fn completed_booking_cannot_be_abandoned() {
        let booking = with_status(booking_fixture(vec![], vec![], vec![]), SessionStatus::Completed);
        assert_eq!(
            DeactivationRequest::new(&booking, "too late"),
            Err(DomainError::NotAbandonable { status: SessionStatus::Completed })
        );
    }
}
