use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

use crate::domain::booking::{BookingId, BookingStatus, TravelRequest, TravelUser, UserId};
use crate::domain::option::TravelOption;
use crate::domain::session::{Session, SessionId, SessionState, SessionStatus};

/// Canonical demo bookings, one per lifecycle stage the console shows.
const SEED_BOOKINGS: &[SeedBooking] = &[
    SeedBooking {
        booking_id: "bk-selecting-001",
        user_id: "usr-asha",
        user_name: "Asha Menon",
        destination: "Delhi",
        status: SessionStatus::InUserSelection,
        description: "Conference trip waiting for the traveler's picks",
    },
    SeedBooking {
        booking_id: "bk-review-001",
        user_id: "usr-ravi",
        user_name: "Ravi Kulkarni",
        destination: "Bengaluru",
        status: SessionStatus::InManagerReview,
        description: "Client visit waiting for a manager decision",
    },
    SeedBooking {
        booking_id: "bk-approved-001",
        user_id: "usr-asha",
        user_name: "Asha Menon",
        destination: "Mumbai",
        status: SessionStatus::ManagerApproved,
        description: "Approved trip waiting for ticket documents",
    },
    SeedBooking {
        booking_id: "bk-rejected-001",
        user_id: "usr-neha",
        user_name: "Neha Iyer",
        destination: "Goa",
        status: SessionStatus::ManagerRejected,
        description: "Rejected offsite that can be revised or cancelled",
    },
];

struct SeedBooking {
    booking_id: &'static str,
    user_id: &'static str,
    user_name: &'static str,
    destination: &'static str,
    status: SessionStatus,
    description: &'static str,
}

fn option(value: Value) -> TravelOption {
    match value {
        Value::Object(map) => TravelOption::from_raw(map),
        _ => TravelOption::from_raw(Map::new()),
    }
}

pub fn flight(code: &str, price: i64) -> TravelOption {
    option(json!({
        "airline": "IndiGo",
        "flight_code": code,
        "origin": "BOM",
        "destination": "DEL",
        "duration_minutes": 125,
        "class": "Economy",
        "price": price,
    }))
}

pub fn train(number: &str, fare: i64) -> TravelOption {
    option(json!({
        "train_name": "Rajdhani Express",
        "train_number": number,
        "from": "BCT",
        "to": "NDLS",
        "travel_class": "3A",
        "fare": fare,
    }))
}

pub fn hotel(name: &str, per_night: i64, total: i64) -> TravelOption {
    option(json!({
        "hotel_name": name,
        "location": "City Centre",
        "cost_per_night": per_night,
        "cost_total": total,
        "star_rating": 4,
    }))
}

pub fn traveler(id: &str, name: &str) -> TravelUser {
    TravelUser {
        id: UserId(id.to_owned()),
        name: name.to_owned(),
        email: format!("{}@tripdesk.example", id.trim_start_matches("usr-")),
        phone: String::new(),
        department: "Engineering".to_owned(),
        role: "Employee".to_owned(),
        registration: None,
        manager_id: Some(UserId("usr-manager".to_owned())),
        budget_band_id: None,
        status: Some("Active".to_owned()),
    }
}

/// An active booking in `InUserSelection` with the given catalogs.
pub fn booking_fixture(
    onward: Vec<TravelOption>,
    return_options: Vec<TravelOption>,
    hotel_options: Vec<TravelOption>,
) -> TravelRequest {
    let now = Utc::now();
    let user = traveler("usr-asha", "Asha Menon");
    let session_id = SessionId("ses-bk-fixture".to_owned());
    TravelRequest {
        id: BookingId("bk-fixture".to_owned()),
        purpose: Some("Quarterly planning".to_owned()),
        user_id: user.id.clone(),
        session_id: session_id.clone(),
        version: 1,
        destination: "Delhi".to_owned(),
        departure_date: now + Duration::days(14),
        return_date: now + Duration::days(17),
        onward_options: onward,
        return_options,
        hotel_options,
        selected_onward_index: None,
        selected_return_index: None,
        selected_hotel_index: None,
        status: BookingStatus::Active,
        inactive_reason: None,
        manager_feedback: None,
        created_at: now,
        updated_at: now,
        session: Some(Session {
            id: session_id,
            user_id: user.id.clone(),
            state: SessionState::Processing,
            status: SessionStatus::InUserSelection,
            completed_at: None,
            created_at: now,
            updated_at: now,
            user: None,
        }),
        user: Some(user),
    }
}

/// Moves the fixture's session to `status`.
pub fn with_status(mut booking: TravelRequest, status: SessionStatus) -> TravelRequest {
    if let Some(session) = booking.session.as_mut() {
        session.status = status;
    }
    booking
}

/// The demo dataset seeded into the in-memory backend.
pub fn seed_bookings() -> Vec<TravelRequest> {
    SEED_BOOKINGS
        .iter()
        .map(|seed| {
            let mut booking = booking_fixture(
                vec![flight("6E-201", 4_250), train("12951", 1_890)],
                vec![flight("6E-202", 4_600)],
                vec![hotel("Harbour View", 3_000, 9_000), hotel("Lakeside Inn", 2_400, 7_200)],
            );
            let user = traveler(seed.user_id, seed.user_name);
            booking.id = BookingId(seed.booking_id.to_owned());
            booking.session_id = SessionId(format!("ses-{}", seed.booking_id));
            booking.user_id = user.id.clone();
            booking.destination = seed.destination.to_owned();
            booking.purpose = Some(seed.description.to_owned());
            if seed.status != SessionStatus::InUserSelection {
                booking.selected_onward_index = Some(0);
                booking.selected_return_index = Some(0);
                booking.selected_hotel_index = Some(0);
            }
            if let Some(session) = booking.session.as_mut() {
                session.id = booking.session_id.clone();
                session.user_id = user.id.clone();
            }
            booking.user = Some(user);
            with_status(booking, seed.status)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::domain::session::SessionStatus;

    use super::seed_bookings;

    #[test]
    fn seed_dataset_covers_each_console_stage_with_valid_selections() {
        let seeds = seed_bookings();
        let statuses: Vec<_> = seeds.iter().filter_map(|booking| booking.session_status()).collect();
        assert_eq!(
            statuses,
            vec![
                SessionStatus::InUserSelection,
                SessionStatus::InManagerReview,
                SessionStatus::ManagerApproved,
                SessionStatus::ManagerRejected,
            ]
        );
        for booking in &seeds {
            booking.validate_selection_indices().expect("seed indices in range");
            assert_eq!(booking.session.as_ref().map(|s| &s.id), Some(&booking.session_id));
        }
    }
}
