use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::deactivation::check_deactivation;
use crate::domain::option::{Leg, TravelOption};
use crate::domain::session::{Session, SessionId, SessionStatus};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub String);

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Lifecycle of the booking record itself, independent of the review session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Active,
    Inactive,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelUser {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub registration: Option<String>,
    #[serde(default)]
    pub manager_id: Option<UserId>,
    #[serde(default)]
    pub budget_band_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Persisted selection: one nullable catalog index per leg.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionIndices {
    pub selected_onward_index: Option<usize>,
    pub selected_return_index: Option<usize>,
    pub selected_hotel_index: Option<usize>,
}

impl SelectionIndices {
    pub fn get(&self, leg: Leg) -> Option<usize> {
        match leg {
            Leg::Onward => self.selected_onward_index,
            Leg::Return => self.selected_return_index,
            Leg::Hotel => self.selected_hotel_index,
        }
    }

    pub fn set(&mut self, leg: Leg, index: Option<usize>) {
        match leg {
            Leg::Onward => self.selected_onward_index = index,
            Leg::Return => self.selected_return_index = index,
            Leg::Hotel => self.selected_hotel_index = index,
        }
    }
}

/// A traveling employee's booking: itinerary, option catalogs, selection and status.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TravelRequest {
    pub id: BookingId,
    #[serde(default)]
    pub purpose: Option<String>,
    pub user_id: UserId,
    pub session_id: SessionId,
    #[serde(default = "default_version")]
    pub version: i64,
    pub destination: String,
    pub departure_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    #[serde(default)]
    pub onward_options: Vec<TravelOption>,
    #[serde(default)]
    pub return_options: Vec<TravelOption>,
    #[serde(default)]
    pub hotel_options: Vec<TravelOption>,
    #[serde(default)]
    pub selected_onward_index: Option<usize>,
    #[serde(default)]
    pub selected_return_index: Option<usize>,
    #[serde(default)]
    pub selected_hotel_index: Option<usize>,
    pub status: BookingStatus,
    #[serde(default)]
    pub inactive_reason: Option<String>,
    #[serde(default)]
    pub manager_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<TravelUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
}

fn default_version() -> i64 {
    1
}

impl TravelRequest {
    pub fn catalog(&self, leg: Leg) -> &[TravelOption] {
        match leg {
            Leg::Onward => &self.onward_options,
            Leg::Return => &self.return_options,
            Leg::Hotel => &self.hotel_options,
        }
    }

    pub fn selection_indices(&self) -> SelectionIndices {
        SelectionIndices {
            selected_onward_index: self.selected_onward_index,
            selected_return_index: self.selected_return_index,
            selected_hotel_index: self.selected_hotel_index,
        }
    }

    pub fn apply_selection_indices(&mut self, indices: SelectionIndices) {
        self.selected_onward_index = indices.selected_onward_index;
        self.selected_return_index = indices.selected_return_index;
        self.selected_hotel_index = indices.selected_hotel_index;
    }

    /// Option chosen for `leg`, if the persisted index is set and in range.
    pub fn selected_option(&self, leg: Leg) -> Option<&TravelOption> {
        self.selection_indices().get(leg).and_then(|index| self.catalog(leg).get(index))
    }

    pub fn session_status(&self) -> Option<SessionStatus> {
        self.session.as_ref().map(|session| session.status)
    }

    pub fn is_inactive(&self) -> bool {
        self.status == BookingStatus::Inactive
    }

    /// Amount invoiced for `leg`: fare for transport legs, whole-stay cost for the hotel.
    pub fn leg_amount(&self, leg: Leg) -> Decimal {
        let Some(option) = self.selected_option(leg) else {
            return Decimal::ZERO;
        };
        let amount = match leg {
            Leg::Onward | Leg::Return => option.price,
            Leg::Hotel => option.total_cost,
        };
        amount.unwrap_or(Decimal::ZERO)
    }

    pub fn total_selected_cost(&self) -> Decimal {
        Leg::ALL.iter().map(|leg| self.leg_amount(*leg)).sum()
    }

    /// Checks that every non-null index points into its catalog.
    pub fn validate_selection_indices(&self) -> Result<(), DomainError> {
        for leg in Leg::ALL {
            if let Some(index) = self.selection_indices().get(leg) {
                let len = self.catalog(leg).len();
                if index >= len {
                    return Err(DomainError::SelectionIndexOutOfRange { leg, index, len });
                }
            }
        }
        Ok(())
    }

    pub fn deactivate(&mut self, reason: &str) -> Result<(), DomainError> {
        let reason = check_deactivation(self, reason)?;
        self.status = BookingStatus::Inactive;
        self.inactive_reason = Some(reason);
        self.touch();
        Ok(())
    }

    /// Records a mutation: bumps the optimistic-concurrency version.
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::option::Leg;
    use crate::errors::DomainError;
    use crate::fixtures::{booking_fixture, flight, hotel};

    use super::BookingStatus;

    #[test]
    fn leg_amounts_use_fare_and_total_stay_cost() {
        let mut booking = booking_fixture(
            vec![flight("AI-101", 450), flight("AI-103", 500)],
            vec![flight("AI-102", 520)],
            vec![hotel("Harbour View", 400, 1_200)],
        );
        booking.selected_onward_index = Some(1);
        booking.selected_hotel_index = Some(0);

        assert_eq!(booking.leg_amount(Leg::Onward), Decimal::new(500, 0));
        assert_eq!(booking.leg_amount(Leg::Return), Decimal::ZERO);
        assert_eq!(booking.leg_amount(Leg::Hotel), Decimal::new(1_200, 0));
        assert_eq!(booking.total_selected_cost(), Decimal::new(1_700, 0));
    }

    #[test]
    fn out_of_range_index_is_reported() {
        let mut booking = booking_fixture(vec![flight("AI-101", 450)], vec![], vec![]);
        booking.selected_return_index = Some(0);

        let error = booking.validate_selection_indices().expect_err("empty catalog");
        assert_eq!(error, DomainError::SelectionIndexOutOfRange { leg: Leg::Return, index: 0, len: 0 });
        assert!(booking.selected_option(Leg::Return).is_none());
    }

    #[test]
    fn deactivation_is_terminal() {
        let mut booking = booking_fixture(vec![], vec![], vec![]);
        let version = booking.version;

        booking.deactivate("  changed plans ").expect("first deactivation");
        assert_eq!(booking.status, BookingStatus::Inactive);
        assert_eq!(booking.inactive_reason.as_deref(), Some("changed plans"));
        assert_eq!(booking.version, version + 1);

        let error = booking.deactivate("again").expect_err("already inactive");
        assert!(matches!(error, DomainError::BookingInactive { .. }));
    }

    #[test]
    fn blank_deactivation_reason_is_rejected() {
        let mut booking = booking_fixture(vec![], vec![], vec![]);
        let error = booking.deactivate("   ").expect_err("blank reason");
        assert_eq!(error, DomainError::InvalidDeactivationReason);
        assert_eq!(booking.status, BookingStatus::Active);
    }
}
